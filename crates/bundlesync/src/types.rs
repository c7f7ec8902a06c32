use crate::version::compare_versions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Description of one bundle release.
///
/// This is also the shape of the `metadata.json` sidecar written into an
/// installed bundle; the sidecar's presence marks a committed install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Archive file name (relative to the release dir) or an absolute URL.
    #[serde(default)]
    pub dist: String,
    #[serde(default)]
    pub version: String,
    /// Feed key this release was matched under.
    #[serde(default)]
    pub client_version: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub changes: Vec<String>,
    /// Release timestamp as published in the feed.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Feed `Last-Modified` in milliseconds since epoch, `0` = unknown.
    #[serde(default)]
    pub last_modified: i64,
}

impl BundleMetadata {
    pub fn is_valid(&self) -> bool {
        !self.dist.trim().is_empty() && !self.version.trim().is_empty()
    }

    pub fn display_version(&self) -> &str {
        if self.version.is_empty() {
            "N/A"
        } else {
            &self.version
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn source_last_modified(&self) -> Option<DateTime<Utc>> {
        if self.last_modified == 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.last_modified)
    }

    /// True when `other` is absent or older.
    pub fn is_newer_than(&self, other: Option<&BundleMetadata>) -> bool {
        match other {
            None => true,
            Some(o) => self.is_newer_than_version(&o.version),
        }
    }

    pub fn is_newer_than_version(&self, version: &str) -> bool {
        compare_versions(&self.version, version) == Ordering::Greater
    }

    /// True only when `other` is present and newer.
    pub fn is_older_than(&self, other: Option<&BundleMetadata>) -> bool {
        other.is_some_and(|o| self.is_older_than_version(&o.version))
    }

    pub fn is_older_than_version(&self, version: &str) -> bool {
        compare_versions(&self.version, version) == Ordering::Less
    }
}

/// One `versions.<key>` entry of the remote feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntry {
    pub dist: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub changes: Vec<String>,
}

impl FeedEntry {
    /// Materialize the entry matched under `key`. The entry's own `version`
    /// wins; releases without one are versioned by their key.
    pub fn into_metadata(self, key: &str, last_modified: i64) -> BundleMetadata {
        BundleMetadata {
            dist: self.dist.unwrap_or_default(),
            version: self.version.unwrap_or_else(|| key.to_string()),
            client_version: key.to_string(),
            message: self.message.unwrap_or_default(),
            changes: self.changes,
            timestamp: self.timestamp,
            last_modified,
        }
    }
}
