//! Admission and eviction: deciding whether a candidate value fits, and, if
//! not, walking the LRU list from its tail to make room.
//!
//! The walk visits one candidate at a time, strictly tail-to-head so recency
//! dominates, and for each decides: skip (pinned/placeholder/reload-spared),
//! delete, or — matrices only — spill. Cost metrics only ever gate spill vs.
//! drop, never the traversal order itself.

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use lineage_cache_common::{
    BandwidthEstimator, CacheConfig, LocalFileUtils, MatrixBlock, ValueKind,
};
use tracing::{debug, trace, warn};

use crate::lru::LruIndex;
use crate::spillmap::SpillRecord;

/// The subset of cache-wide state the eviction walk needs, borrowed
/// together so the walk can mutate the LRU list and the spill map in lockstep
/// without the caller threading four separate `&mut` parameters through.
pub(crate) struct EvictionState<'a, K, M, S> {
    pub lru: &'a mut LruIndex<K, M, S>,
    pub spill: &'a mut HashMap<K, SpillRecord, RandomState>,
    pub removed: &'a mut HashSet<K, RandomState>,
}

/// Runs the eviction walk until `cache_bytes + needed` fits under the
/// configured limit, or the list is exhausted. Returns whether the budget
/// was met.
pub(crate) fn make_room<K, M, S, B>(
    state: &mut EvictionState<'_, K, M, S>,
    backend: &B,
    config: &CacheConfig,
    metrics: &lineage_cache_common::metrics::Metrics,
    needed: usize,
) -> bool
where
    K: lineage_cache_common::LineageKey,
    M: MatrixBlock,
    S: lineage_cache_common::CacheScalar,
    B: LocalFileUtils<M> + BandwidthEstimator<M>,
{
    let limit = config.cache_limit_bytes();
    let mut cursor = state.lru.tail_index();
    while state.lru.cache_bytes() + needed > limit {
        let Some(idx) = cursor else {
            break;
        };
        let waiting = state.lru.node(idx).monitor.waiting_count();
        let status = state.lru.node(idx).status;
        if !status.can_evict(waiting) {
            cursor = state.lru.prev_of(idx);
            continue;
        }
        if state.lru.node(idx).reloaded_once_spared {
            // Recently reloaded: spare it exactly once, then it becomes an
            // ordinary eviction candidate on the next walk.
            state.lru.node_mut(idx).reloaded_once_spared = false;
            cursor = state.lru.prev_of(idx);
            continue;
        }
        let prev = state.lru.prev_of(idx);
        if !evict_one(state, backend, config, metrics, idx) {
            // Scalar kept in place (exec time above the noise floor): it is
            // never a candidate, walk on toward the MRU end.
        }
        cursor = prev;
    }
    state.lru.cache_bytes() + needed <= limit
}

/// Visits one eviction candidate. Returns `true` if the entry was removed
/// from the in-memory map (deleted or spilled), `false` if it was left in
/// place (a scalar worth keeping).
fn evict_one<K, M, S, B>(
    state: &mut EvictionState<'_, K, M, S>,
    backend: &B,
    config: &CacheConfig,
    metrics: &lineage_cache_common::metrics::Metrics,
    idx: u32,
) -> bool
where
    K: lineage_cache_common::LineageKey,
    M: MatrixBlock,
    S: lineage_cache_common::CacheScalar,
    B: LocalFileUtils<M> + BandwidthEstimator<M>,
{
    let key = state.lru.node(idx).key.clone();
    let kind = state.lru.node(idx).kind;
    let compute_time_ns = state.lru.node(idx).compute_time_ns;

    if kind == ValueKind::Scalar {
        let exec_ms = compute_time_ns / 1_000_000;
        if exec_ms >= config.min_spill_time_ms {
            // Scalars are never spilled; a scalar that took a while to
            // produce is often a function output worth keeping around.
            trace!(?key, exec_ms, "scalar spared from eviction");
            return false;
        }
        state.lru.remove(idx);
        state.removed.insert(key.clone());
        metrics.record_evict();
        trace!(?key, "scalar evicted (below min spill time)");
        return true;
    }

    let monitor = state.lru.node(idx).monitor.clone();
    let filled = monitor.peek_filled();

    let spilled = if config.spill_enabled {
        match filled.as_ref().and_then(|(value, _)| value.as_matrix()) {
            Some(block) if should_spill_matrix(block.as_ref(), compute_time_ns, config, backend) => {
                let spill_id = key.spill_id();
                let path = backend.path_for(spill_id);
                match backend.write(&path, block.as_ref()) {
                    Ok(()) => {
                        metrics.record_fs_write();
                        state.spill.insert(
                            key.clone(),
                            SpillRecord {
                                path,
                                compute_time_ns,
                            },
                        );
                        true
                    }
                    Err(err) => {
                        warn!(?err, ?key, "spill write failed, falling back to delete");
                        false
                    }
                }
            }
            _ => false,
        }
    } else {
        false
    };

    state.lru.remove(idx);
    state.removed.insert(key.clone());
    metrics.record_evict();
    debug!(?key, spilled, "matrix evicted");
    true
}

/// Whether `block`, which cost `compute_time_ns` to originally produce, is
/// worth spilling rather than just dropping, per §4.5/§4.6: compare the
/// recompute cost against an estimated disk round trip, treating a very
/// small round-trip estimate as unreliable noise rather than a cheap bargain.
fn should_spill_matrix<M, B>(block: &M, compute_time_ns: u64, config: &CacheConfig, backend: &B) -> bool
where
    M: MatrixBlock,
    B: BandwidthEstimator<M>,
{
    let exec_ms = compute_time_ns / 1_000_000;
    let spill_ms = (backend.round_trip_seconds(block) * 1000.0) as u64;
    if spill_ms < config.min_spill_time_ms {
        exec_ms >= config.min_spill_time_ms
    } else {
        exec_ms > spill_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Status;
    use lineage_cache_common::{CacheScalar, CacheValue, LineageKey};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct TestKey(u64);

    impl LineageKey for TestKey {
        fn spill_id(&self) -> u64 {
            self.0
        }
    }

    #[derive(Debug)]
    struct TestBlock {
        bytes: usize,
    }

    impl MatrixBlock for TestBlock {
        fn memory_size(&self) -> usize {
            self.bytes
        }
        fn disk_size(&self) -> usize {
            self.bytes
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
            false
        }
    }

    impl CacheScalar for f64 {
        fn memory_size(&self) -> usize {
            8
        }
    }

    struct NullBackend {
        written: Mutex<Vec<std::path::PathBuf>>,
    }

    impl LocalFileUtils<TestBlock> for NullBackend {
        fn ensure_dir(&self) -> lineage_cache_common::error::Result<()> {
            Ok(())
        }
        fn path_for(&self, spill_id: u64) -> std::path::PathBuf {
            std::path::PathBuf::from(format!("/tmp/{spill_id}.bin"))
        }
        fn write(&self, path: &std::path::Path, _block: &TestBlock) -> lineage_cache_common::error::Result<()> {
            self.written.lock().push(path.to_path_buf());
            Ok(())
        }
        fn read(&self, _path: &std::path::Path) -> lineage_cache_common::error::Result<TestBlock> {
            Ok(TestBlock { bytes: 0 })
        }
        fn delete(&self, _path: &std::path::Path) -> lineage_cache_common::error::Result<()> {
            Ok(())
        }
    }

    impl BandwidthEstimator<TestBlock> for NullBackend {
        fn round_trip_seconds(&self, _block: &TestBlock) -> f64 {
            0.001
        }
    }

    fn config() -> CacheConfig {
        CacheConfig {
            total_memory_bytes: 1000,
            cache_fraction: 1.0,
            min_spill_time_ms: 1,
            min_spill_data_mb: 0.0,
            ..CacheConfig::default()
        }
    }

    #[test]
    fn make_room_evicts_until_fit() {
        let mut lru: LruIndex<TestKey, TestBlock, f64> = LruIndex::new();
        let mut spill = HashMap::default();
        let mut removed = HashSet::default();
        for i in 0..5u64 {
            let idx = lru.insert_placeholder(TestKey(i), lineage_cache_common::ValueKind::Matrix);
            lru.node_mut(idx).status = Status::Cached;
            lru.node_mut(idx).compute_time_ns = 0;
            lru.node_mut(idx).monitor.fill(
                CacheValue::Matrix(Arc::new(TestBlock { bytes: 200 })),
                0,
            );
            lru.set_charge(idx, 200);
        }
        assert_eq!(lru.cache_bytes(), 1000);
        let backend = NullBackend {
            written: Mutex::new(Vec::new()),
        };
        let metrics = lineage_cache_common::metrics::Metrics::new();
        let mut state = EvictionState {
            lru: &mut lru,
            spill: &mut spill,
            removed: &mut removed,
        };
        let fit = make_room(&mut state, &backend, &config(), &metrics, 200);
        assert!(fit);
        assert!(lru.cache_bytes() <= 800);
        assert_eq!(metrics.snapshot().evict, 5 - lru.len() as u64);
    }

    #[test]
    fn waiters_on_empty_placeholder_pin_it() {
        let mut lru: LruIndex<TestKey, TestBlock, f64> = LruIndex::new();
        let idx = lru.insert_placeholder(TestKey(0), lineage_cache_common::ValueKind::Matrix);
        assert!(!lru.node(idx).status.can_evict(1));
        assert!(lru.node(idx).status.can_evict(0));
    }
}
