use crate::errors::{BundleError, Result};
use bundlesync_platform::{bundles_dir, Target};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_S3_URL: &str = "https://s3.amazonaws.com/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub const ENV_S3_URL: &str = "BUNDLESYNC_S3_URL";
pub const ENV_BUCKET: &str = "BUNDLESYNC_BUCKET";
pub const ENV_FOLDER: &str = "BUNDLESYNC_FOLDER";

/// Everything one updater channel needs: where releases live, where they go,
/// and which client they must be compatible with.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdaterConfig {
    /// Bundle name; the install dir is `<install_root>/<name>-pkg`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub base_url: String,
    #[serde(default = "bundles_dir")]
    pub install_root: PathBuf,
    pub client_version: String,
    #[serde(default)]
    pub target: Target,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl UpdaterConfig {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        install_root: impl Into<PathBuf>,
        client_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            base_url: base_url.into(),
            install_root: install_root.into(),
            client_version: client_version.into(),
            target: Target::current(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let cfg: UpdaterConfig = serde_json::from_slice(&bytes)
            .map_err(|e| BundleError::InvalidConfig(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BundleError::InvalidConfig("bundle name is empty".into()));
        }
        if self.client_version.trim().is_empty() {
            return Err(BundleError::InvalidConfig("client version is empty".into()));
        }
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| BundleError::InvalidConfig(format!("base url {}: {e}", self.base_url)))?;
        Ok(())
    }
}

/// Release channel hosted in an S3 bucket: `<endpoint>/<bucket>/[<folder>/]`.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Location {
    #[serde(default)]
    pub endpoint: Option<String>,
    pub bucket: String,
    #[serde(default)]
    pub folder: String,
}

impl S3Location {
    pub fn new(bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            bucket: bucket.into(),
            folder: folder.into(),
        }
    }

    /// Base URL with the `BUNDLESYNC_S3_URL` / `_BUCKET` / `_FOLDER`
    /// environment overrides applied. Always ends with `/`.
    pub fn base_url(&self) -> String {
        let endpoint = std::env::var(ENV_S3_URL)
            .ok()
            .or_else(|| self.endpoint.clone())
            .unwrap_or_default();
        let bucket = std::env::var(ENV_BUCKET).unwrap_or_else(|_| self.bucket.clone());
        let folder = std::env::var(ENV_FOLDER).unwrap_or_else(|_| self.folder.clone());
        build_s3_url(&endpoint, &bucket, &folder)
    }
}

fn clean(part: &str) -> &str {
    part.trim().trim_matches('/')
}

fn build_s3_url(endpoint: &str, bucket: &str, folder: &str) -> String {
    let endpoint = match clean(endpoint) {
        "" => clean(DEFAULT_S3_URL),
        e => e,
    };
    let mut url = format!("{endpoint}/");
    for part in [bucket, folder] {
        let part = clean(part);
        if !part.is_empty() {
            url.push_str(part);
            url.push('/');
        }
    }
    url
}
