//! bundlesync
//!
//! Installs and updates a platform-specific native tool bundle.
//! - Reads a versioned release feed (`<base>/<platform>/<arch>/meta.json`).
//! - Picks the newest release compatible with the client version.
//! - Downloads, unzips into `<dir>.new`, writes `metadata.json`, swaps by rename.
//!
//! The installed copy is always either absent or complete. All network and
//! filesystem work runs on worker threads; see [`Updater`].

pub mod config;
pub mod errors;
pub mod install;
pub mod local;
pub mod manifest;
pub mod net;
pub mod progress;
pub mod remote;
pub mod types;
pub mod updater;
pub mod version;

pub use config::{S3Location, UpdaterConfig};
pub use errors::{BundleError, ErrorKind, Result};
pub use install::{install_atomic, PackageDownloader};
pub use local::LocalBundle;
pub use manifest::{parse_feed, MetadataDownloader};
pub use progress::{format_size, CancelFlag, Progress, Silent};
pub use remote::RemoteBundle;
pub use types::BundleMetadata;
pub use updater::{Event, Notifier, SubscriptionId, Updater};
pub use version::{compare_versions, find_closest_version, sort_versions};
