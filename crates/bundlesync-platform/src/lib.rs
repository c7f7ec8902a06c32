//! bundlesync-platform
//!
//! Host keys used to address the release channel (`<platform>/<arch>`) and the
//! default on-disk locations for installed bundles.

pub mod detect;
pub mod paths;

pub use detect::{arch_key, exe_extension, is_supported, platform_key, Target};
pub use paths::{bundles_dir, bundlesync_home};
