//! Statistics hooks. Counters for hits/misses/writes/reads; reading or
//! incrementing them never gates a decision made elsewhere in the cache —
//! they are observed, never consulted.

use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters for hit/miss/evict bookkeeping, extended with the
/// two-tier counters this cache needs (`fs_hit`, `fs_write`) and a
/// removed-set-backed "would have hit" counter.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Full or multi-output probe hit against the in-memory map.
    pub hit: AtomicU64,
    /// Full or multi-output probe miss.
    pub miss: AtomicU64,
    /// Placeholder installed because no cached or in-flight value existed.
    pub insert: AtomicU64,
    /// Entry removed by explicit `remove`/`reset`, not by eviction.
    pub remove: AtomicU64,
    /// Entry removed by the eviction walk, regardless of spill-vs-delete.
    pub evict: AtomicU64,
    /// Entry spilled to disk by the eviction walk.
    pub fs_write: AtomicU64,
    /// Entry reloaded from the spill store on a subsequent hit.
    pub fs_hit: AtomicU64,
    /// A thread parked on an already-installed placeholder instead of
    /// installing its own.
    pub queue: AtomicU64,
    /// A `probe` or `try_reuse_single`/`try_reuse_multi` call that would have
    /// hit had the key not previously been evicted. Backed by the
    /// removed-set; does not affect eviction or admission decisions.
    pub would_have_hit: AtomicU64,
    /// Admission rejected: value too large, or eviction could not free
    /// enough space.
    pub negative_admission: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hit.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.miss.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.insert.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.remove.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evict(&self) {
        self.evict.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fs_write(&self) {
        self.fs_write.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fs_hit(&self) {
        self.fs_hit.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queue(&self) {
        self.queue.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_would_have_hit(&self) {
        self.would_have_hit.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_negative_admission(&self) {
        self.negative_admission.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters. Used by `lineage-cache-cli` and tests; cheap
    /// enough to call after every operation in a test without skewing it.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hit: self.hit.load(Ordering::Relaxed),
            miss: self.miss.load(Ordering::Relaxed),
            insert: self.insert.load(Ordering::Relaxed),
            remove: self.remove.load(Ordering::Relaxed),
            evict: self.evict.load(Ordering::Relaxed),
            fs_write: self.fs_write.load(Ordering::Relaxed),
            fs_hit: self.fs_hit.load(Ordering::Relaxed),
            queue: self.queue.load(Ordering::Relaxed),
            would_have_hit: self.would_have_hit.load(Ordering::Relaxed),
            negative_admission: self.negative_admission.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Metrics`], cheap to pass around and print.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hit: u64,
    pub miss: u64,
    pub insert: u64,
    pub remove: u64,
    pub evict: u64,
    pub fs_write: u64,
    pub fs_hit: u64,
    pub queue: u64,
    pub would_have_hit: u64,
    pub negative_admission: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = Metrics::new();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn record_increments_independently() {
        let m = Metrics::new();
        m.record_hit();
        m.record_hit();
        m.record_miss();
        let snap = m.snapshot();
        assert_eq!(snap.hit, 2);
        assert_eq!(snap.miss, 1);
        assert_eq!(snap.evict, 0);
    }
}
