use super::notify::Event;
use super::state::BundleState;
use crate::errors::{BundleError, Result};
use crate::install::PackageDownloader;
use crate::manifest::MetadataDownloader;
use crate::progress::{CancelFlag, Progress};
use crate::types::BundleMetadata;
use reqwest::blocking::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sends events stamped with the sequence that produced them.
#[derive(Clone)]
pub(crate) struct Emitter {
    seq: u64,
    tx: Sender<(u64, Event)>,
}

impl Emitter {
    pub fn new(seq: u64, tx: Sender<(u64, Event)>) -> Self {
        Self { seq, tx }
    }

    pub fn emit(&self, event: Event) {
        let _ = self.tx.send((self.seq, event));
    }
}

/// Holds the busy flag for one sequence. Dropping it publishes
/// `BusyChanged(false)` and releases the flag, on every exit path.
pub(crate) struct BusyGuard {
    busy: Arc<AtomicBool>,
    events: Emitter,
}

impl BusyGuard {
    pub fn acquire(busy: &Arc<AtomicBool>, events: Emitter) -> Result<Self> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| BundleError::Busy)?;
        events.emit(Event::BusyChanged(true));
        Ok(Self {
            busy: busy.clone(),
            events,
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.events.emit(Event::BusyChanged(false));
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Everything a background sequence needs, cloned onto the worker thread.
pub(crate) struct Job {
    pub client: Client,
    pub state: BundleState,
    pub client_version: String,
    pub progress: Arc<dyn Progress>,
    pub cancel: CancelFlag,
    pub events: Emitter,
}

impl Job {
    fn emit(&self, event: Event) {
        self.events.emit(event);
    }

    /// Publish a failed sequence. Silent checks only log.
    fn report(&self, err: BundleError, silent: bool) {
        if err.is_canceled() {
            info!("bundle operation canceled");
            self.emit(Event::Canceled);
        } else if silent {
            error!("background bundle check failed: {err}");
        } else {
            error!("bundle operation failed: {err}");
            self.emit(Event::IoError(err));
        }
    }

    /// Fetch the feed unless `check_last_modified` is set and the feed is
    /// not newer than the installed bundle. Publishes `MetadataDownloaded`.
    fn refresh_metadata(&self, check_last_modified: bool) -> Result<Option<BundleMetadata>> {
        let url = self.state.metadata_url();
        let dl = MetadataDownloader::new(&self.client, &url, &self.client_version, &*self.progress);

        if check_last_modified && !dl.needs_refresh(self.state.local_metadata().as_ref())? {
            debug!("remote metadata unchanged, skipping download");
            return Ok(None);
        }
        self.cancel.check()?;

        let meta = dl.fetch()?;
        self.state.set_remote_metadata(meta.clone());
        self.emit(Event::MetadataDownloaded(meta.clone()));
        Ok(Some(meta))
    }

    pub fn download_metadata(self, check_last_modified: bool, _guard: BusyGuard) {
        if let Err(e) = self.refresh_metadata(check_last_modified) {
            self.report(e, false);
        }
    }

    pub fn check_for_update(self, silent: bool, _guard: BusyGuard) {
        let local = self.state.local_metadata();
        match self.refresh_metadata(true) {
            Ok(Some(remote)) if remote.is_newer_than(local.as_ref()) => {
                info!("bundle {} is available", remote.version);
                self.emit(Event::UpdateAvailable(remote));
            }
            Ok(_) => self.emit(Event::UpToDate),
            Err(e) => self.report(e, silent),
        }
    }

    fn install(&self, metadata: Option<BundleMetadata>) -> Result<()> {
        // Given metadata is reused unless the feed changed since the install.
        let fetched = self.refresh_metadata(metadata.is_some())?;
        let meta = fetched.or(metadata).ok_or_else(|| {
            BundleError::MalformedMetadata("no metadata to install from".into())
        })?;
        self.cancel.check()?;

        let remote = self.state.remote();
        let target = self.state.bundle_path();
        PackageDownloader::new(&self.client, &remote, &meta, &*self.progress, &self.cancel)
            .download_and_install(&target)?;
        Ok(())
    }

    pub fn install_update(self, metadata: Option<BundleMetadata>, _guard: BusyGuard) {
        match self.install(metadata) {
            Ok(()) => {
                self.state.reload_local();
                self.emit(Event::Unpacked);
            }
            Err(e) => self.report(e, false),
        }
    }
}
