//! Install/update orchestration.
//!
//! Triggers (`check_for_update`, `download_metadata`, `install_update`) run on
//! the caller's coordination thread: they take the busy flag, then hand the
//! network and filesystem work to a worker thread. Workers never call
//! subscribers directly; they queue [`Event`]s which the coordination thread
//! delivers with [`Updater::dispatch`] or [`Updater::wait_idle`].

mod job;
mod notify;
mod state;

pub use notify::{Event, Notifier, SubscriptionId};

use crate::config::UpdaterConfig;
use crate::errors::{BundleError, Result};
use crate::local::LocalBundle;
use crate::net::build_client;
use crate::progress::{CancelFlag, Progress, Silent};
use crate::remote::RemoteBundle;
use crate::types::BundleMetadata;
use job::{BusyGuard, Emitter, Job};
use notify::Subscribers;
use reqwest::blocking::Client;
use state::BundleState;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct Updater {
    config: UpdaterConfig,
    client: Client,
    state: BundleState,
    busy: Arc<AtomicBool>,
    /// Id of the most recently started sequence.
    seq: AtomicU64,
    cancel: CancelFlag,
    progress: Arc<dyn Progress>,
    tx: Sender<(u64, Event)>,
    rx: Receiver<(u64, Event)>,
    subscribers: Subscribers,
}

impl Updater {
    pub fn new(config: UpdaterConfig) -> Result<Self> {
        config.validate()?;
        if !config.target.is_supported() {
            return Err(BundleError::UnsupportedPlatform(config.target.platform.clone()));
        }

        let local = LocalBundle::new(&config.install_root, &config.name, config.display_name());
        let remote = RemoteBundle::new(&config.base_url, config.target.clone(), config.display_name())?;
        let client = build_client(config.timeout_secs)?;
        let (tx, rx) = channel();

        debug!(
            "updater for {} at {} (feed {})",
            config.name,
            local.bundle_path().display(),
            remote.metadata_url()
        );

        Ok(Self {
            config,
            client,
            state: BundleState::new(local, remote),
            busy: Arc::new(AtomicBool::new(false)),
            seq: AtomicU64::new(0),
            cancel: CancelFlag::new(),
            progress: Arc::new(Silent),
            tx,
            rx,
            subscribers: Subscribers::default(),
        })
    }

    pub fn set_progress(&mut self, progress: Arc<dyn Progress>) {
        self.progress = progress;
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    // Subscriptions

    pub fn subscribe(&mut self, handler: Box<dyn Notifier>) -> SubscriptionId {
        self.subscribers.add(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Deliver every queued event to subscribers on this thread.
    pub fn dispatch(&mut self) -> usize {
        let mut n = 0;
        while let Ok((_, event)) = self.rx.try_recv() {
            self.subscribers.publish(&event);
            n += 1;
        }
        n
    }

    /// Dispatch events until the latest sequence ends or `timeout` passes.
    /// Returns false on timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        if !self.is_busy() {
            self.dispatch();
            return true;
        }

        // Triggers run on this thread, so the latest sequence is the running one.
        let current = self.seq.load(Ordering::SeqCst);
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(left) {
                Ok((seq, event)) => {
                    let done = seq == current && matches!(event, Event::BusyChanged(false));
                    self.subscribers.publish(&event);
                    if done {
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return !self.is_busy(),
            }
        }
    }

    // State

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Snapshot of the installed bundle's metadata.
    pub fn local_metadata(&self) -> Option<BundleMetadata> {
        self.state.local_metadata()
    }

    /// Last metadata downloaded from the feed.
    pub fn remote_metadata(&self) -> Option<BundleMetadata> {
        self.state.remote_metadata()
    }

    pub fn is_installed(&self) -> bool {
        self.state.local_metadata().is_some()
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.state.bundle_path()
    }

    pub fn exe_path(&self) -> PathBuf {
        self.state.exe_path()
    }

    pub fn local_bundle(&self) -> LocalBundle {
        self.state.local()
    }

    pub fn remote_bundle(&self) -> RemoteBundle {
        self.state.remote()
    }

    /// Re-sync the installed bundle's metadata from disk.
    pub fn reload_local_metadata(&self) {
        self.state.reload_local();
    }

    /// Ask the running sequence to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    // Triggers

    /// Compare the feed's release with the installed one. Publishes
    /// `MetadataDownloaded` when the feed was fetched, then `UpdateAvailable`
    /// or `UpToDate`. Silent checks log failures instead of publishing them.
    pub fn check_for_update(&self, silent: bool) -> Result<()> {
        self.spawn("check", move |job, guard| job.check_for_update(silent, guard))
    }

    /// Fetch the feed, optionally only when it is newer than the install.
    pub fn download_metadata(&self, check_last_modified: bool) -> Result<()> {
        self.spawn("metadata", move |job, guard| {
            job.download_metadata(check_last_modified, guard)
        })
    }

    /// Download and atomically install a release, then reload the local
    /// metadata and publish `Unpacked`. Without `metadata` the feed is fetched.
    pub fn install_update(&self, metadata: Option<BundleMetadata>) -> Result<()> {
        self.spawn("install", move |job, guard| job.install_update(metadata, guard))
    }

    fn spawn<F>(&self, what: &str, work: F) -> Result<()>
    where
        F: FnOnce(Job, BusyGuard) + Send + 'static,
    {
        let seq = self.seq.load(Ordering::SeqCst) + 1;
        let events = Emitter::new(seq, self.tx.clone());
        let guard = BusyGuard::acquire(&self.busy, events.clone())?;
        self.seq.store(seq, Ordering::SeqCst);
        self.cancel.reset();

        let job = Job {
            client: self.client.clone(),
            state: self.state.clone(),
            client_version: self.config.client_version.clone(),
            progress: self.progress.clone(),
            cancel: self.cancel.clone(),
            events,
        };

        debug!("starting bundle {what}");
        thread::Builder::new()
            .name(format!("bundlesync-{what}"))
            .spawn(move || work(job, guard))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlesync_platform::Target;
    use tempfile::TempDir;

    fn updater(root: &std::path::Path) -> Updater {
        Updater::new(UpdaterConfig::new("tool", "http://127.0.0.1:9/", root, "1.0")).unwrap()
    }

    #[test]
    fn starts_idle_and_uninstalled() {
        let tmp = TempDir::new().unwrap();
        let u = updater(tmp.path());
        assert!(!u.is_busy());
        assert!(!u.is_installed());
        assert!(u.remote_metadata().is_none());
        assert_eq!(u.bundle_path(), tmp.path().join("tool-pkg"));
    }

    #[test]
    fn rejects_unsupported_target() {
        let tmp = TempDir::new().unwrap();
        let cfg = UpdaterConfig::new("tool", "http://h/", tmp.path(), "1.0")
            .with_target(Target::new("unsupported", "32bit"));
        assert!(matches!(
            Updater::new(cfg),
            Err(BundleError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn second_trigger_is_rejected_while_busy() {
        let tmp = TempDir::new().unwrap();
        let u = updater(tmp.path());
        let _held = BusyGuard::acquire(&u.busy, Emitter::new(1, u.tx.clone())).unwrap();
        assert!(matches!(u.check_for_update(true), Err(BundleError::Busy)));
        assert!(matches!(u.install_update(None), Err(BundleError::Busy)));
    }

    #[test]
    fn wait_idle_ignores_end_of_an_older_sequence() {
        let tmp = TempDir::new().unwrap();
        let mut u = updater(tmp.path());
        drop(BusyGuard::acquire(&u.busy, Emitter::new(1, u.tx.clone())).unwrap());
        let running = BusyGuard::acquire(&u.busy, Emitter::new(2, u.tx.clone())).unwrap();
        u.seq.store(2, Ordering::SeqCst);

        assert!(!u.wait_idle(Duration::from_millis(50)));
        assert!(u.is_busy());

        drop(running);
        assert!(u.wait_idle(Duration::from_secs(1)));
        assert!(!u.is_busy());
    }

    #[test]
    fn wait_idle_without_work_returns_immediately() {
        let tmp = TempDir::new().unwrap();
        let mut u = updater(tmp.path());
        assert!(u.wait_idle(Duration::from_millis(10)));
        assert_eq!(u.dispatch(), 0);
    }
}
