//! Remote release feed: freshness probe, download and version matching.
//!
//! Feed shape:
//! ```json
//! { "versions": { "<client version>": { "dist": "...", "message": "...",
//!                                      "timestamp": "...", "changes": [] } } }
//! ```

use crate::errors::{BundleError, Result};
use crate::net::{download_to_string, head_last_modified, parse_http_date};
use crate::progress::Progress;
use crate::types::{BundleMetadata, FeedEntry};
use crate::version::{find_closest_version, sort_versions};
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use tracing::{debug, info};

pub struct MetadataDownloader<'a> {
    client: &'a Client,
    url: &'a str,
    client_version: &'a str,
    progress: &'a dyn Progress,
}

impl<'a> MetadataDownloader<'a> {
    pub fn new(
        client: &'a Client,
        url: &'a str,
        client_version: &'a str,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            client,
            url,
            client_version,
            progress,
        }
    }

    /// Cheap probe: true unless the feed's `Last-Modified` is known and not
    /// newer than the one recorded in `local`.
    pub fn needs_refresh(&self, local: Option<&BundleMetadata>) -> Result<bool> {
        self.progress.set_text("Checking bundle timestamp...");

        let local_ts = match local {
            Some(m) if m.last_modified != 0 => m.last_modified,
            _ => return Ok(true),
        };

        let remote_ts = parse_http_date(head_last_modified(self.client, self.url)?.as_deref());
        debug!("feed last-modified remote={remote_ts} local={local_ts}");
        Ok(remote_ts == 0 || remote_ts > local_ts)
    }

    /// Download the feed and materialize the release matching the client version.
    pub fn fetch(&self) -> Result<BundleMetadata> {
        self.progress.set_text("Retrieving version info...");
        let fetched = download_to_string(self.client, self.url)?;
        let last_modified = parse_http_date(fetched.last_modified.as_deref());
        let meta = parse_feed(&fetched.body, self.client_version, last_modified)?;
        info!(
            "remote bundle {} matches client {}",
            meta.version, meta.client_version
        );
        Ok(meta)
    }
}

/// Pick the newest feed entry keyed `<= client_version`.
pub fn parse_feed(body: &str, client_version: &str, last_modified: i64) -> Result<BundleMetadata> {
    let root: Value = serde_json::from_str(body)?;
    let versions: &Map<String, Value> = root
        .get("versions")
        .and_then(Value::as_object)
        .ok_or_else(|| BundleError::MalformedMetadata("missing \"versions\" object".into()))?;

    let mut keys: Vec<&str> = versions.keys().map(String::as_str).collect();
    sort_versions(&mut keys);

    let matched = find_closest_version(&keys, client_version)
        .ok_or_else(|| BundleError::NoCompatibleVersion(client_version.to_string()))?;

    let entry: FeedEntry = versions
        .get(matched)
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .ok_or_else(|| BundleError::MalformedMetadata(format!("no entry for {matched}")))?;

    let meta = entry.into_metadata(matched, last_modified);
    if !meta.is_valid() {
        return Err(BundleError::MalformedMetadata(format!(
            "entry {matched} lacks dist or version"
        )));
    }
    Ok(meta)
}
