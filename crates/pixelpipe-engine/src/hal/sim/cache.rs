use std::sync::atomic::{AtomicUsize, Ordering};

use crate::hal::{CacheOps, DmaAddr};

/// Snapshot of [`SimCache`] activity.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheCounters {
    pub cleans: usize,
    pub cleaned_bytes: usize,
    pub invalidates: usize,
    pub invalidated_bytes: usize,
    pub full_flushes: usize,
}

/// Host memory is coherent; this only counts maintenance calls.
#[derive(Debug, Default)]
pub struct SimCache {
    cleans: AtomicUsize,
    cleaned_bytes: AtomicUsize,
    invalidates: AtomicUsize,
    invalidated_bytes: AtomicUsize,
    full_flushes: AtomicUsize,
}

impl SimCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> CacheCounters {
        CacheCounters {
            cleans: self.cleans.load(Ordering::Relaxed),
            cleaned_bytes: self.cleaned_bytes.load(Ordering::Relaxed),
            invalidates: self.invalidates.load(Ordering::Relaxed),
            invalidated_bytes: self.invalidated_bytes.load(Ordering::Relaxed),
            full_flushes: self.full_flushes.load(Ordering::Relaxed),
        }
    }
}

impl CacheOps for SimCache {
    fn clean(&self, _addr: &DmaAddr, len: usize) {
        self.cleans.fetch_add(1, Ordering::Relaxed);
        self.cleaned_bytes.fetch_add(len, Ordering::Relaxed);
    }

    fn invalidate(&self, _addr: &DmaAddr, len: usize) {
        self.invalidates.fetch_add(1, Ordering::Relaxed);
        self.invalidated_bytes.fetch_add(len, Ordering::Relaxed);
    }

    fn clean_invalidate_all(&self) {
        self.full_flushes.fetch_add(1, Ordering::Relaxed);
    }
}
