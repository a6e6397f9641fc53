use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the accelerator unit.
#[derive(Debug, Default)]
pub struct PpeStats {
    transfers: AtomicU64,
    stalls: AtomicU64,
    sw_fallbacks: AtomicU64,
    fills: AtomicU64,
    images: AtomicU64,
    layers: AtomicU64,
    lines: AtomicU64,
    masks: AtomicU64,
}

/// Point-in-time copy of [`PpeStats`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PpeStatsSnapshot {
    pub transfers: u64,
    pub stalls: u64,
    pub sw_fallbacks: u64,
    pub fills: u64,
    pub images: u64,
    pub layers: u64,
    pub lines: u64,
    pub masks: u64,
}

impl PpeStats {
    #[inline]
    fn bump(c: &AtomicU64) {
        c.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn transfer(&self) {
        Self::bump(&self.transfers);
    }

    pub(crate) fn stall(&self) {
        Self::bump(&self.stalls);
    }

    pub(crate) fn sw_fallback(&self) {
        Self::bump(&self.sw_fallbacks);
    }

    pub(crate) fn fill(&self) {
        Self::bump(&self.fills);
    }

    pub(crate) fn image(&self) {
        Self::bump(&self.images);
    }

    pub(crate) fn layer(&self) {
        Self::bump(&self.layers);
    }

    pub(crate) fn line(&self) {
        Self::bump(&self.lines);
    }

    pub(crate) fn mask(&self) {
        Self::bump(&self.masks);
    }

    pub fn snapshot(&self) -> PpeStatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        PpeStatsSnapshot {
            transfers: get(&self.transfers),
            stalls: get(&self.stalls),
            sw_fallbacks: get(&self.sw_fallbacks),
            fills: get(&self.fills),
            images: get(&self.images),
            layers: get(&self.layers),
            lines: get(&self.lines),
            masks: get(&self.masks),
        }
    }
}
