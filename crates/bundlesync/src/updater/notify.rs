use crate::errors::BundleError;
use crate::types::BundleMetadata;

/// Lifecycle signal published by the [`Updater`](super::Updater).
#[derive(Debug)]
pub enum Event {
    BusyChanged(bool),
    MetadataDownloaded(BundleMetadata),
    UpdateAvailable(BundleMetadata),
    UpToDate,
    Unpacked,
    IoError(BundleError),
    Canceled,
}

/// Subscriber callbacks, invoked on the thread that calls
/// [`Updater::dispatch`](super::Updater::dispatch). Implement only what you need.
pub trait Notifier {
    fn busy_changed(&mut self, _busy: bool) {}
    fn io_error(&mut self, _error: &BundleError) {}
    fn metadata_downloaded(&mut self, _metadata: &BundleMetadata) {}
    fn update_available(&mut self, _metadata: &BundleMetadata) {}
    fn up_to_date(&mut self) {}
    fn unpacked(&mut self) {}
    fn canceled(&mut self) {}
}

impl Event {
    pub fn notify(&self, n: &mut dyn Notifier) {
        match self {
            Event::BusyChanged(b) => n.busy_changed(*b),
            Event::MetadataDownloaded(m) => n.metadata_downloaded(m),
            Event::UpdateAvailable(m) => n.update_available(m),
            Event::UpToDate => n.up_to_date(),
            Event::Unpacked => n.unpacked(),
            Event::IoError(e) => n.io_error(e),
            Event::Canceled => n.canceled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered subscriber list owned by one updater.
#[derive(Default)]
pub(crate) struct Subscribers {
    next: u64,
    list: Vec<(SubscriptionId, Box<dyn Notifier>)>,
}

impl Subscribers {
    pub fn add(&mut self, handler: Box<dyn Notifier>) -> SubscriptionId {
        self.next += 1;
        let id = SubscriptionId(self.next);
        self.list.push((id, handler));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.list.len();
        self.list.retain(|(i, _)| *i != id);
        self.list.len() != before
    }

    pub fn publish(&mut self, event: &Event) {
        for (_, handler) in self.list.iter_mut() {
            event.notify(handler.as_mut());
        }
    }
}
