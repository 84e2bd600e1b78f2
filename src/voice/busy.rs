//! Gate preventing overlapping synthesis and playback

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "speaking" flag
#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    /// Create an idle flag
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark the flag busy, or return `None` if it already is
    ///
    /// The flag is cleared when the returned guard is dropped or ended.
    #[must_use]
    pub fn try_begin(self: &Arc<Self>) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                flag: Arc::clone(self),
            })
    }

    /// Whether a cycle is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof that the caller holds the busy flag
#[derive(Debug)]
pub struct BusyGuard {
    flag: Arc<BusyFlag>,
}

impl BusyGuard {
    /// Release the flag
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}
