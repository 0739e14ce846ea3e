//! Adaptive bandwidth estimation (C6): four independently tracked EMAs —
//! {read, write} crossed with {dense, sparse} — blended after every real spill
//! write or reload read whose payload clears `min_spill_data_mb`.
//!
//! Seeds per design note 9: 150/450 MB/s sparse/dense read, 100/300 MB/s
//! sparse/dense write. They drift toward the real hardware after the first
//! few observations; nothing here is calibrated ahead of time.

use lineage_cache_common::{BandwidthEstimator, MatrixBlock};
use parking_lot::Mutex;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct Speeds {
    read_dense_mbs: f64,
    read_sparse_mbs: f64,
    write_dense_mbs: f64,
    write_sparse_mbs: f64,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            read_dense_mbs: 450.0,
            read_sparse_mbs: 150.0,
            write_dense_mbs: 300.0,
            write_sparse_mbs: 100.0,
        }
    }
}

/// Blends a real I/O's observed bandwidth into the matching constant and
/// turns a candidate block's size into an estimated disk round trip.
#[derive(Debug)]
pub struct AdaptiveBandwidthEstimator {
    speeds: Mutex<Speeds>,
    /// Below this payload size (MiB), an observed sample is too noisy to
    /// trust and is dropped rather than blended in.
    min_spill_data_mb: f64,
}

impl AdaptiveBandwidthEstimator {
    pub fn new(min_spill_data_mb: f64) -> Self {
        Self {
            speeds: Mutex::new(Speeds::default()),
            min_spill_data_mb,
        }
    }

    /// Feeds a real reload read into the sparse or dense read EMA. A no-op if
    /// `size_mb` is below `min_spill_data_mb` or the measurement is
    /// degenerate (`elapsed_secs <= 0.0`, which would blend in `f64::INFINITY`).
    pub fn observe_read(&self, size_mb: f64, sparse: bool, elapsed_secs: f64) {
        self.observe(size_mb, sparse, elapsed_secs, true);
    }

    /// Feeds a real spill write into the sparse or dense write EMA.
    pub fn observe_write(&self, size_mb: f64, sparse: bool, elapsed_secs: f64) {
        self.observe(size_mb, sparse, elapsed_secs, false);
    }

    fn observe(&self, size_mb: f64, sparse: bool, elapsed_secs: f64, is_read: bool) {
        if size_mb < self.min_spill_data_mb || elapsed_secs <= 0.0 {
            return;
        }
        let observed = size_mb / elapsed_secs;
        let mut speeds = self.speeds.lock();
        let slot = match (is_read, sparse) {
            (true, false) => &mut speeds.read_dense_mbs,
            (true, true) => &mut speeds.read_sparse_mbs,
            (false, false) => &mut speeds.write_dense_mbs,
            (false, true) => &mut speeds.write_sparse_mbs,
        };
        let before = *slot;
        *slot = (*slot + observed) / 2.0;
        trace!(is_read, sparse, observed, before, after = *slot, "bandwidth ema updated");
    }

    fn read_speed(&self, sparse: bool) -> f64 {
        let speeds = self.speeds.lock();
        if sparse {
            speeds.read_sparse_mbs
        } else {
            speeds.read_dense_mbs
        }
    }

    fn write_speed(&self, sparse: bool) -> f64 {
        let speeds = self.speeds.lock();
        if sparse {
            speeds.write_sparse_mbs
        } else {
            speeds.write_dense_mbs
        }
    }
}

impl<M: MatrixBlock> BandwidthEstimator<M> for AdaptiveBandwidthEstimator {
    fn round_trip_seconds(&self, block: &M) -> f64 {
        let size_mb = block.disk_size() as f64 / (1024.0 * 1024.0);
        let sparse = block.is_sparse();
        let load = size_mb / self.read_speed(sparse);
        let write = size_mb / self.write_speed(sparse);
        load + write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Block {
        disk_size: usize,
        sparse: bool,
    }
    impl MatrixBlock for Block {
        fn memory_size(&self) -> usize {
            self.disk_size
        }
        fn disk_size(&self) -> usize {
            self.disk_size
        }
        fn rows(&self) -> usize {
            1
        }
        fn cols(&self) -> usize {
            1
        }
        fn nnz(&self) -> usize {
            1
        }
        fn is_sparse(&self) -> bool {
            self.sparse
        }
    }

    #[test]
    fn seeds_match_design_note_9() {
        let est = AdaptiveBandwidthEstimator::new(0.0);
        assert_eq!(est.read_speed(false), 450.0);
        assert_eq!(est.read_speed(true), 150.0);
        assert_eq!(est.write_speed(false), 300.0);
        assert_eq!(est.write_speed(true), 100.0);
    }

    #[test]
    fn observation_below_threshold_is_ignored() {
        let est = AdaptiveBandwidthEstimator::new(10.0);
        est.observe_write(1.0, false, 0.001);
        assert_eq!(est.write_speed(false), 300.0);
    }

    #[test]
    fn ema_halves_the_gap_to_observed() {
        let est = AdaptiveBandwidthEstimator::new(0.0);
        let before = est.write_speed(false);
        // 10 MiB written in 0.1s -> 100 MB/s observed.
        est.observe_write(10.0, false, 0.1);
        let after = est.write_speed(false);
        let observed = 100.0;
        assert!(((after - observed).abs() - (before - observed).abs() / 2.0).abs() < 1e-9);
    }

    #[test]
    fn round_trip_seconds_sums_load_and_write() {
        let est = AdaptiveBandwidthEstimator::new(0.0);
        let block = Block {
            disk_size: 450 * 1024 * 1024,
            sparse: false,
        };
        let rt = est.round_trip_seconds(&block);
        assert!((rt - (1.0 + 1.5)).abs() < 1e-6);
    }
}
