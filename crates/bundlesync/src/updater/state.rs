use crate::local::LocalBundle;
use crate::remote::RemoteBundle;
use crate::types::BundleMetadata;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Local + remote bundle pair shared between the updater and its workers.
#[derive(Clone)]
pub(crate) struct BundleState {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    local: LocalBundle,
    remote: RemoteBundle,
}

impl BundleState {
    pub fn new(local: LocalBundle, remote: RemoteBundle) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner { local, remote })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn local_metadata(&self) -> Option<BundleMetadata> {
        self.read().local.metadata().cloned()
    }

    pub fn remote_metadata(&self) -> Option<BundleMetadata> {
        self.read().remote.metadata().cloned()
    }

    pub fn set_remote_metadata(&self, m: BundleMetadata) {
        self.write().remote.set_metadata(m);
    }

    pub fn reload_local(&self) {
        self.write().local.reload_metadata();
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.read().local.bundle_path().to_path_buf()
    }

    pub fn exe_path(&self) -> PathBuf {
        self.read().local.exe_path().to_path_buf()
    }

    pub fn metadata_url(&self) -> String {
        self.read().remote.metadata_url().to_string()
    }

    pub fn remote(&self) -> RemoteBundle {
        self.read().remote.clone()
    }

    pub fn local(&self) -> LocalBundle {
        self.read().local.clone()
    }
}
