//! Progress reporting and cooperative cancellation for long-running steps.

use crate::errors::{BundleError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sink for status text and byte counts. Every method defaults to a no-op.
pub trait Progress: Send + Sync {
    fn set_text(&self, _text: &str) {}
    fn set_detail(&self, _detail: &str) {}
    fn set_bytes(&self, _done: u64, _total: Option<u64>) {}
}

/// Progress sink that drops everything.
pub struct Silent;

impl Progress for Silent {}

/// Shared cancellation request, checked between steps.
#[derive(Clone, Default, Debug)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.inner.store(false, Ordering::SeqCst);
    }

    /// The underlying flag, for handlers that can only store a bool
    /// (e.g. signal handlers).
    pub fn as_atomic(&self) -> Arc<AtomicBool> {
        self.inner.clone()
    }

    /// Checkpoint: `Err(Canceled)` once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(BundleError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Human readable byte count: `N/A`, `512 bytes`, `1.5 kB`, `3.2 MB`.
pub fn format_size(size: Option<u64>) -> String {
    const KILO: f64 = 1024.0;
    match size {
        None => "N/A".to_string(),
        Some(n) if (n as f64) < KILO => format!("{n} bytes"),
        Some(n) if (n as f64) < KILO * KILO => format!("{:.1} kB", n as f64 / KILO),
        Some(n) => format!("{:.1} MB", n as f64 / (KILO * KILO)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(None), "N/A");
        assert_eq!(format_size(Some(0)), "0 bytes");
        assert_eq!(format_size(Some(1023)), "1023 bytes");
        assert_eq!(format_size(Some(1536)), "1.5 kB");
        assert_eq!(format_size(Some(5 * 1024 * 1024)), "5.0 MB");
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let a = CancelFlag::new();
        let b = a.clone();
        assert!(b.check().is_ok());
        a.cancel();
        assert!(b.is_canceled());
        assert!(matches!(b.check(), Err(BundleError::Canceled)));
        b.reset();
        assert!(!a.is_canceled());
    }

    #[test]
    fn storing_into_the_atomic_cancels() {
        let flag = CancelFlag::new();
        flag.as_atomic().store(true, Ordering::SeqCst);
        assert!(flag.check().unwrap_err().is_canceled());
    }
}
