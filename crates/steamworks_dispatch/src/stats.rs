//! # Dispatch Statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the drain loop.
///
/// Shared through an `Arc` so a monitoring thread can read them while the
/// game thread dispatches.
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Native frames advanced.
    pub frames: AtomicU64,
    /// Records fetched and released.
    pub records_drained: AtomicU64,
    /// Callbacks invoked.
    pub callbacks_invoked: AtomicU64,
    /// Records of kinds missing from the decode table.
    pub unknown_kinds: AtomicU64,
    /// Records of supported kinds with an empty slot.
    pub unhandled_kinds: AtomicU64,
    /// Records that failed to decode.
    pub decode_failures: AtomicU64,
    /// Fetches that failed.
    pub fetch_failures: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Native frames advanced.
    pub frames: u64,
    /// Records fetched and released.
    pub records_drained: u64,
    /// Callbacks invoked.
    pub callbacks_invoked: u64,
    /// Records of kinds missing from the decode table.
    pub unknown_kinds: u64,
    /// Records of supported kinds with an empty slot.
    pub unhandled_kinds: u64,
    /// Records that failed to decode.
    pub decode_failures: u64,
    /// Fetches that failed.
    pub fetch_failures: u64,
}

impl DispatchStats {
    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            records_drained: self.records_drained.load(Ordering::Relaxed),
            callbacks_invoked: self.callbacks_invoked.load(Ordering::Relaxed),
            unknown_kinds: self.unknown_kinds.load(Ordering::Relaxed),
            unhandled_kinds: self.unhandled_kinds.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
