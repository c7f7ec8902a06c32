use crate::errors::{BundleError, Result};
use crate::types::BundleMetadata;
use bundlesync_platform::Target;

pub const METADATA_NAME: &str = "meta.json";

/// The network source of releases.
///
/// Metadata lives at `<base>/<platform>/<arch>/meta.json`; archives at
/// `<base>/<platform>/<arch>/<client key>/<dist>` unless `dist` is absolute.
#[derive(Debug, Clone)]
pub struct RemoteBundle {
    display_name: String,
    base_url: String,
    target: Target,
    metadata_url: String,
    metadata: Option<BundleMetadata>,
}

impl RemoteBundle {
    pub fn new(base_url: &str, target: Target, display_name: &str) -> Result<Self> {
        reqwest::Url::parse(base_url)
            .map_err(|e| BundleError::InvalidConfig(format!("base url {base_url}: {e}")))?;
        let base_url = format!("{}/", base_url.trim_end_matches('/'));
        let metadata_url = format!("{base_url}{}/{METADATA_NAME}", target.relative_dir());
        Ok(Self {
            display_name: display_name.to_string(),
            base_url,
            target,
            metadata_url,
            metadata: None,
        })
    }

    /// Always ends with `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn metadata_url(&self) -> &str {
        &self.metadata_url
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Last downloaded metadata. Advisory only.
    pub fn metadata(&self) -> Option<&BundleMetadata> {
        self.metadata.as_ref()
    }

    pub(crate) fn set_metadata(&mut self, metadata: BundleMetadata) {
        self.metadata = Some(metadata);
    }

    /// Where the archive for `metadata` is downloaded from.
    pub fn package_url(&self, metadata: &BundleMetadata) -> String {
        if metadata.dist.contains("://") {
            return metadata.dist.clone();
        }
        format!(
            "{}{}/{}/{}",
            self.base_url,
            self.target.relative_dir(),
            metadata.client_version,
            metadata.dist.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> RemoteBundle {
        RemoteBundle::new("https://cdn.example.com/tool", Target::new("linux", "64bit"), "Tool")
            .unwrap()
    }

    #[test]
    fn metadata_url_is_per_target() {
        let r = remote();
        assert_eq!(r.base_url(), "https://cdn.example.com/tool/");
        assert_eq!(r.metadata_url(), "https://cdn.example.com/tool/linux/64bit/meta.json");
        assert!(r.metadata().is_none());
    }

    #[test]
    fn package_url_relative_and_absolute() {
        let r = remote();
        let mut m = BundleMetadata {
            dist: "tool-1.2.0.zip".into(),
            version: "1.2.0".into(),
            client_version: "0.9".into(),
            ..Default::default()
        };
        assert_eq!(
            r.package_url(&m),
            "https://cdn.example.com/tool/linux/64bit/0.9/tool-1.2.0.zip"
        );

        m.dist = "https://mirror.example.org/x.zip".into();
        assert_eq!(r.package_url(&m), "https://mirror.example.org/x.zip");
    }

    #[test]
    fn rejects_unparseable_base() {
        assert!(RemoteBundle::new("::nope", Target::current(), "Tool").is_err());
    }
}
