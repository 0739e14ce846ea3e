//! Admission and sizing (C4): whether a candidate charge fits under
//! `CACHE_LIMIT`, and the evict-then-recheck protocol used whenever it does
//! not.

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use lineage_cache_common::{BandwidthEstimator, CacheConfig, LocalFileUtils, MatrixBlock};

use crate::eviction::{make_room, EvictionState};
use crate::lru::LruIndex;
use crate::spillmap::SpillRecord;

/// `fits(n) ≡ cache_bytes + n ≤ CACHE_LIMIT`.
pub(crate) fn fits<K, M, S>(lru: &LruIndex<K, M, S>, config: &CacheConfig, n: usize) -> bool {
    lru.cache_bytes() + n <= config.cache_limit_bytes()
}

/// Admission rule (§4.4): if the candidate does not already fit, run the
/// eviction walk targeting exactly `n` bytes of headroom; return whether it
/// fits afterward. The caller is responsible for acting on a `false` result
/// (reject admission) — this function never decides that on its own.
pub(crate) fn admit<K, M, S, B>(
    lru: &mut LruIndex<K, M, S>,
    spill: &mut HashMap<K, SpillRecord, RandomState>,
    removed: &mut HashSet<K, RandomState>,
    backend: &B,
    config: &CacheConfig,
    metrics: &lineage_cache_common::metrics::Metrics,
    n: usize,
) -> bool
where
    K: lineage_cache_common::LineageKey,
    M: MatrixBlock,
    S: lineage_cache_common::CacheScalar,
    B: LocalFileUtils<M> + BandwidthEstimator<M>,
{
    if n > config.cache_limit_bytes() {
        // A single value larger than the whole cache can never be admitted,
        // with or without eviction: short-circuit rather than evict everything
        // for nothing.
        return false;
    }
    if fits(lru, config, n) {
        return true;
    }
    let mut state = EvictionState { lru, spill, removed };
    make_room(&mut state, backend, config, metrics, n)
}
