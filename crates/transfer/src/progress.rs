//! Byte-count progress tracking shared across workers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives push notifications as bytes land at the destination.
///
/// Called from worker tasks, so implementations must be cheap and
/// thread-safe. Rendering (progress bars etc.) belongs to the
/// caller, not the engine.
pub trait ProgressObserver: Send + Sync {
    /// `copied` bytes out of `total` have been transferred so far.
    fn on_bytes(&self, copied: u64, total: u64);
}

/// Observer that ignores all notifications.
pub struct NoOpObserver;

impl ProgressObserver for NoOpObserver {
    fn on_bytes(&self, _copied: u64, _total: u64) {}
}

/// Thread-safe byte counter incremented by workers as parts complete.
pub struct ProgressCounter {
    copied: AtomicU64,
    total: u64,
    observer: Arc<dyn ProgressObserver>,
}

impl ProgressCounter {
    /// Creates a counter for `total` expected bytes.
    pub fn new(total: u64, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            copied: AtomicU64::new(0),
            total,
            observer,
        }
    }

    /// Records `bytes` copied and notifies the observer with the new
    /// running total.
    pub fn add(&self, bytes: u64) {
        let copied = self.copied.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.observer.on_bytes(copied, self.total);
    }

    /// Bytes copied so far.
    pub fn copied(&self) -> u64 {
        self.copied.load(Ordering::Relaxed)
    }

    /// Total bytes expected.
    pub fn total(&self) -> u64 {
        self.total
    }
}
