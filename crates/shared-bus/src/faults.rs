//! # Fault Injection
//!
//! Counters of pending failures consumed one per operation.

use std::sync::atomic::{AtomicU32, Ordering};

/// Pending failures per operation class.
#[derive(Debug, Default)]
pub struct FaultInjector {
    writes: AtomicU32,
    reads: AtomicU32,
    subscribes: AtomicU32,
}

impl FaultInjector {
    /// No pending failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` writes.
    pub fn fail_next_writes(&self, count: u32) {
        self.writes.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` queries.
    pub fn fail_next_reads(&self, count: u32) {
        self.reads.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` subscribe calls.
    pub fn fail_next_subscribes(&self, count: u32) {
        self.subscribes.store(count, Ordering::SeqCst);
    }

    pub(crate) fn take_write(&self) -> bool {
        take(&self.writes)
    }

    pub(crate) fn take_read(&self) -> bool {
        take(&self.reads)
    }

    pub(crate) fn take_subscribe(&self) -> bool {
        take(&self.subscribes)
    }
}

fn take(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}
