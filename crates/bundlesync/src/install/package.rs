use super::swap::install_atomic;
use crate::errors::Result;
use crate::net::download_to_file;
use crate::progress::{CancelFlag, Progress};
use crate::remote::RemoteBundle;
use crate::types::BundleMetadata;
use reqwest::blocking::Client;
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;

/// Fetches and installs the archive of one release.
pub struct PackageDownloader<'a> {
    client: &'a Client,
    remote: &'a RemoteBundle,
    metadata: &'a BundleMetadata,
    progress: &'a dyn Progress,
    cancel: &'a CancelFlag,
}

impl<'a> PackageDownloader<'a> {
    pub fn new(
        client: &'a Client,
        remote: &'a RemoteBundle,
        metadata: &'a BundleMetadata,
        progress: &'a dyn Progress,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            client,
            remote,
            metadata,
            progress,
            cancel,
        }
    }

    /// Download into a fresh temp file, deleted when the returned path drops.
    pub fn download(&self) -> Result<TempPath> {
        let url = self.remote.package_url(self.metadata);
        let suffix = Path::new(&self.metadata.dist)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let path = tempfile::Builder::new()
            .prefix("bundle")
            .suffix(&suffix)
            .tempfile()?
            .into_temp_path();

        let bytes = download_to_file(self.client, &url, &path, self.progress, self.cancel)?;
        debug!("downloaded {bytes} bytes to {}", path.display());
        Ok(path)
    }

    /// Atomically replace `target` with the archive at `archive`.
    pub fn install(&self, archive: &Path, target: &Path) -> Result<()> {
        install_atomic(archive, target, self.metadata, self.progress, self.cancel)
    }

    pub fn download_and_install(&self, target: &Path) -> Result<()> {
        let archive = self.download()?;
        self.cancel.check()?;
        self.install(&archive, target)
    }
}
