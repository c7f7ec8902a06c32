use crate::errors::Result;
use crate::types::BundleMetadata;
use bundlesync_platform::exe_extension;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

pub const METADATA_FILE: &str = "metadata.json";

/// The installed copy of a bundle.
///
/// Layout: `<root>/<name>-pkg/` holding `<name>.exe|.bin` and `metadata.json`.
#[derive(Debug, Clone)]
pub struct LocalBundle {
    display_name: String,
    bundle_path: PathBuf,
    exe_path: PathBuf,
    metadata: Option<BundleMetadata>,
}

impl LocalBundle {
    pub fn new(root: &Path, name: &str, display_name: &str) -> Self {
        let bundle_path = root.join(format!("{name}-pkg"));
        let exe_path = bundle_path.join(format!("{name}{}", exe_extension()));
        let mut bundle = Self {
            display_name: display_name.to_string(),
            bundle_path,
            exe_path,
            metadata: None,
        };
        bundle.reload_metadata();
        bundle
    }

    /// Re-read the sidecar. Metadata is dropped unless both the executable
    /// and a valid sidecar are present.
    pub fn reload_metadata(&mut self) {
        self.metadata = None;
        if self.exe_path.is_file() {
            self.metadata = load_sidecar(&self.bundle_path);
        } else {
            debug!("no bundle executable at {}", self.exe_path.display());
        }
    }

    pub fn is_exist(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn metadata(&self) -> Option<&BundleMetadata> {
        self.metadata.as_ref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn bundle_path(&self) -> &Path {
        &self.bundle_path
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }
}

fn load_sidecar(dir: &Path) -> Option<BundleMetadata> {
    let path = dir.join(METADATA_FILE);
    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(_) => {
            debug!("can't find bundle metadata {}", path.display());
            return None;
        }
    };
    match serde_json::from_slice::<BundleMetadata>(&bytes) {
        Ok(m) if m.is_valid() => Some(m),
        Ok(_) => {
            error!("bundle metadata {} is incomplete", path.display());
            None
        }
        Err(e) => {
            error!("bundle metadata {} is unreadable: {e}", path.display());
            None
        }
    }
}

/// Write `metadata.json` into `dir` via a temp file + rename.
pub fn write_sidecar(dir: &Path, metadata: &BundleMetadata) -> Result<PathBuf> {
    let path = dir.join(METADATA_FILE);
    let tmp = dir.join(format!("{METADATA_FILE}.tmp"));
    debug!("saving {}", path.display());
    fs::write(&tmp, serde_json::to_vec_pretty(metadata)?)?;
    fs::rename(&tmp, &path)?;
    Ok(path)
}
