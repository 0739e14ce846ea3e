//! `ResultCache`: the generic engine behind the §6 external API.
//!
//! This is where C2 (LRU index), C4 (admission/sizing), C5 (eviction), C7
//! (single-op probe/placeholder), and C8 (multi-output commit/abort) meet
//! under the one cache-wide lock §5 describes. It knows nothing about
//! instructions or execution contexts — those collaborators, and the public
//! `try_reuse_*`/`put_*` signatures spec.md §6 names, live one layer up in
//! the `lineage-cache` facade crate, which calls into the handful of
//! primitives here (`acquire`, `fill`, `commit_multi`, `abort_multi`,
//! `probe`, `reset`) to get the job done.

use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use std::sync::Arc;

use lineage_cache_common::error::{Error, Result};
use lineage_cache_common::{
    BandwidthEstimator, CacheConfig, CacheScalar, CacheValue, LineageKey, LocalFileUtils, MatrixBlock,
    ValueKind,
};
use tracing::{debug, trace, warn};

use crate::admission::admit;
use crate::entry::Status;
use crate::eviction::{make_room, EvictionState};
use crate::lru::LruIndex;
use crate::monitor::Monitor;
use crate::spillmap::SpillRecord;

/// Outcome of [`ResultCache::acquire`].
pub enum Acquired<K, M, S> {
    /// A value is resident or already being produced by another thread.
    /// Either way the caller blocks on `monitor.wait()`: it resolves
    /// immediately if the value is already filled, or parks until the
    /// producer calls [`ResultCache::fill`].
    Hit {
        monitor: Arc<Monitor<M, S>>,
        /// Set when this entry's value was moved in from a different
        /// lineage item by the multi-output commit path (§4.7); the caller
        /// should rewire the bound name's lineage to this key.
        origin_key: Option<K>,
    },
    /// No cached or in-flight value existed; a fresh placeholder was
    /// installed at `monitor` and the caller is now the producer responsible
    /// for calling [`ResultCache::fill`] once it has computed the value.
    Miss { monitor: Arc<Monitor<M, S>> },
    /// No cached or in-flight value existed and the caller asked not to
    /// install a placeholder (the instruction is not marked for caching).
    NotCached,
}

struct Inner<K, M, S> {
    lru: LruIndex<K, M, S>,
    spill: HashMap<K, SpillRecord, RandomState>,
    removed: HashSet<K, RandomState>,
}

impl<K, M, S> Inner<K, M, S>
where
    K: LineageKey,
{
    fn new() -> Self {
        Self {
            lru: LruIndex::new(),
            spill: HashMap::default(),
            removed: HashSet::default(),
        }
    }
}

/// The generic cache engine. One instance is the "single shared cache" spec.md
/// describes; design note 9 has it constructed explicitly (`ResultCache::new`)
/// and shared via `Arc` by the caller, rather than hidden behind process-wide
/// statics — this is what makes a fresh cache per test possible.
pub struct ResultCache<K, M, S, B> {
    inner: Mutex<Inner<K, M, S>>,
    backend: B,
    config: CacheConfig,
    metrics: lineage_cache_common::metrics::Metrics,
}

impl<K, M, S, B> ResultCache<K, M, S, B>
where
    K: LineageKey,
    M: MatrixBlock,
    S: CacheScalar,
    B: LocalFileUtils<M> + BandwidthEstimator<M>,
{
    pub fn new(backend: B, config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
            backend,
            config,
            metrics: lineage_cache_common::metrics::Metrics::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn metrics(&self) -> &lineage_cache_common::metrics::Metrics {
        &self.metrics
    }

    /// Non-binding presence check: `true` if `key` currently resolves to a
    /// resident or spilled entry. A `true` result can go stale the instant
    /// the lock is released (spec.md §8: "`probe(k)` is pure with respect to
    /// cache contents, modulo the removed-set statistic").
    pub fn probe(&self, key: &K) -> bool {
        let inner = self.inner.lock();
        if inner.lru.get_index(key).is_some() || inner.spill.contains_key(key) {
            return true;
        }
        if inner.removed.contains(key) {
            self.metrics.record_would_have_hit();
        }
        false
    }

    /// The §4.1 step-4 probe-or-placeholder decision, plus transparent spill
    /// reload. Performed under the cache lock; the returned [`Acquired`] is
    /// resolved by the caller *outside* the lock via `monitor.wait()`, which
    /// is the only blocking primitive in the system (§5).
    pub fn acquire(&self, key: &K, kind: ValueKind, install_if_missing: bool) -> Result<Acquired<K, M, S>> {
        let mut inner = self.inner.lock();

        if let Some(idx) = inner.lru.get_index(key) {
            inner.lru.touch(idx);
            let node = inner.lru.node(idx);
            let origin_key = node.origin_key.clone();
            let monitor = node.monitor.clone();
            if node.status == Status::Empty {
                self.metrics.record_queue();
            } else {
                self.metrics.record_hit();
            }
            trace!(?key, "probe hit (resident)");
            return Ok(Acquired::Hit { monitor, origin_key });
        }

        if inner.spill.contains_key(key) {
            return self.reload(&mut inner, key);
        }

        if inner.removed.contains(key) {
            self.metrics.record_would_have_hit();
        }
        self.metrics.record_miss();

        if !install_if_missing {
            return Ok(Acquired::NotCached);
        }

        let idx = inner.lru.insert_placeholder(key.clone(), kind);
        self.metrics.record_insert();
        trace!(?key, ?kind, "placeholder installed");
        let monitor = inner.lru.node(idx).monitor.clone();
        Ok(Acquired::Miss { monitor })
    }

    /// Reads a spilled value back into memory, re-inserting it at the MRU end
    /// in `Reloaded` status and deleting the spill file, all under the cache
    /// lock (§5: "the reference behavior serializes I/O under the mutex for
    /// simplicity"). Runs admission/eviction exactly as a fresh `fill` would,
    /// since the reloaded value must also obey `CACHE_LIMIT`.
    fn reload(&self, inner: &mut Inner<K, M, S>, key: &K) -> Result<Acquired<K, M, S>> {
        let record = inner.spill.remove(key).expect("checked contains_key above");
        let block = match self.backend.read(&record.path) {
            Ok(block) => block,
            Err(err) => {
                warn!(?key, ?err, "spill reload read failed");
                return Err(err);
            }
        };
        if let Err(err) = self.backend.delete(&record.path) {
            warn!(?key, ?err, "failed to delete spill file after reload");
        }

        let charge = block.memory_size();
        let fits = admit(
            &mut inner.lru,
            &mut inner.spill,
            &mut inner.removed,
            &self.backend,
            &self.config,
            &self.metrics,
            charge,
        );
        if !fits {
            // The reloaded value cannot be re-admitted (e.g. a concurrent
            // burst of larger entries claimed the freed space). Treat as a
            // negative admission: the value is dropped rather than cached,
            // and the key genuinely falls out of the cache.
            self.metrics.record_negative_admission();
            warn!(?key, "reloaded value could not be re-admitted, dropping");
            return Ok(Acquired::NotCached);
        }

        let monitor = Arc::new(Monitor::new());
        monitor.fill(CacheValue::Matrix(Arc::new(block)), record.compute_time_ns);
        inner.lru.insert_filled(
            key.clone(),
            ValueKind::Matrix,
            monitor.clone(),
            Status::Reloaded,
            record.compute_time_ns,
            charge,
            None,
        );
        self.metrics.record_fs_hit();
        self.metrics.record_hit();
        debug!(?key, "reloaded from spill");
        Ok(Acquired::Hit {
            monitor,
            origin_key: None,
        })
    }

    /// Fills the placeholder at `key`, admitting the value (running eviction
    /// if needed) before marking it `Cached`. If the value cannot be
    /// admitted, the placeholder is removed and every thread parked on it is
    /// woken with [`Error::NegativeAdmission`] instead of left blocked
    /// forever (Open Question 2 of SPEC_FULL.md: the reference behavior's bug
    /// is not reproduced here).
    pub fn fill(&self, key: &K, value: CacheValue<M, S>, compute_time_ns: u64) -> Result<()> {
        self.fill_with_origin(key, value, compute_time_ns, None)
    }

    /// Like [`ResultCache::fill`], but additionally records `origin_key`: the
    /// lineage item this value was actually computed under, used by the
    /// multi-output commit path (§4.7) so the caller can rewire its bound
    /// variable's lineage to the cache key it now lives under.
    pub fn fill_with_origin(
        &self,
        key: &K,
        value: CacheValue<M, S>,
        compute_time_ns: u64,
        origin_key: Option<K>,
    ) -> Result<()> {
        let charge = value.memory_size();
        let mut inner = self.inner.lock();

        let idx = match inner.lru.get_index(key) {
            Some(idx) => idx,
            None => {
                // The placeholder was evicted before the producer finished
                // (only possible while it had zero waiters). Re-admit fresh
                // rather than silently dropping the computed value.
                inner.lru.insert_placeholder(key.clone(), value.kind())
            }
        };

        if inner.lru.node(idx).monitor.peek_filled().is_some() {
            // Another producer already filled this slot (should not happen
            // under the single-installer protocol, but fill is idempotent).
            return Ok(());
        }

        let limit = self.config.cache_limit_bytes();
        let fits = admit(
            &mut inner.lru,
            &mut inner.spill,
            &mut inner.removed,
            &self.backend,
            &self.config,
            &self.metrics,
            charge,
        );
        // The eviction walk the admission above may have treated this very
        // `Empty`-with-no-waiters placeholder as an ordinary candidate
        // (§4.5); in the rare case it reclaimed this slot, reinstall it so
        // the computed value is never silently dropped or failed against a
        // monitor nobody can still be waiting on.
        let idx = match inner.lru.get_index(key) {
            Some(idx) => idx,
            None => inner.lru.insert_placeholder(key.clone(), value.kind()),
        };
        let monitor = inner.lru.node(idx).monitor.clone();
        if !fits {
            inner.lru.remove(idx);
            drop(inner);
            monitor.fail();
            self.metrics.record_negative_admission();
            warn!(?key, charge, limit, "negative admission, waiters woken with failure");
            return Err(Error::NegativeAdmission { requested: charge, limit });
        }

        inner.lru.node_mut(idx).origin_key = origin_key;
        inner.lru.node_mut(idx).status = Status::Cached;
        inner.lru.node_mut(idx).compute_time_ns = compute_time_ns;
        inner.lru.set_charge(idx, charge);
        let monitor = inner.lru.node(idx).monitor.clone();
        drop(inner);
        monitor.fill(value, compute_time_ns);
        Ok(())
    }

    /// Commits every `(key, value, compute_time_ns, origin_key)` tuple
    /// atomically, used by the multi-output commit path once every output's
    /// lineage held and was untainted (§4.7: "all placeholders move, or all
    /// placeholders are removed"). Admission for the whole group is decided
    /// once, under one lock acquisition, against the combined charge of
    /// whichever entries are not already filled (an entry can already be
    /// filled here if it was a pre-existing hit `try_reuse_multi` left
    /// untouched, since filling it again is a no-op): either every entry
    /// becomes `Cached` or none does, so a racing reader can never observe
    /// some outputs of this call committed and others still bare
    /// placeholders.
    pub fn commit_multi(&self, entries: Vec<(K, CacheValue<M, S>, u64, K)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.lock();

        let mut total_charge = 0usize;
        for (key, value, _, _) in &entries {
            let already_filled = inner
                .lru
                .get_index(key)
                .is_some_and(|idx| inner.lru.node(idx).monitor.peek_filled().is_some());
            if !already_filled {
                total_charge += value.memory_size();
            }
        }

        let limit = self.config.cache_limit_bytes();
        let fits = admit(
            &mut inner.lru,
            &mut inner.spill,
            &mut inner.removed,
            &self.backend,
            &self.config,
            &self.metrics,
            total_charge,
        );
        if !fits {
            // Nothing in this group is committed. Remove whichever
            // placeholders are still this call's own (never filled); an
            // entry already `Cached` from before this call is left exactly
            // as it was.
            for (key, _, _, _) in &entries {
                if let Some(idx) = inner.lru.get_index(key) {
                    if inner.lru.node(idx).monitor.peek_filled().is_none() {
                        let monitor = inner.lru.node(idx).monitor.clone();
                        inner.lru.remove(idx);
                        monitor.fail();
                        self.metrics.record_remove();
                    }
                }
            }
            self.metrics.record_negative_admission();
            warn!(n = entries.len(), total_charge, limit, "multi-output commit negative admission, group aborted");
            return Err(Error::NegativeAdmission { requested: total_charge, limit });
        }

        // Every entry now fits. Settle them all under this same lock
        // acquisition, then release it before waking any monitor.
        let mut to_fill = Vec::with_capacity(entries.len());
        for (key, value, compute_time_ns, origin_key) in entries {
            let idx = match inner.lru.get_index(&key) {
                Some(idx) => idx,
                None => inner.lru.insert_placeholder(key.clone(), value.kind()),
            };
            if inner.lru.node(idx).monitor.peek_filled().is_some() {
                continue;
            }
            let charge = value.memory_size();
            inner.lru.node_mut(idx).origin_key = Some(origin_key);
            inner.lru.node_mut(idx).status = Status::Cached;
            inner.lru.node_mut(idx).compute_time_ns = compute_time_ns;
            inner.lru.set_charge(idx, charge);
            let monitor = inner.lru.node(idx).monitor.clone();
            to_fill.push((monitor, value, compute_time_ns));
        }
        drop(inner);
        for (monitor, value, compute_time_ns) in to_fill {
            monitor.fill(value, compute_time_ns);
        }
        Ok(())
    }

    /// Removes every placeholder named in `keys`, waking any waiters with
    /// failure. Used when the multi-output commit path discovers that not
    /// every output's lineage held (§4.7: "every placeholder installed for
    /// this call is removed"). `keys` must be exactly the subset of outputs
    /// this call itself installed as fresh placeholders (`Acquired::Miss`) —
    /// a caller that includes a pre-existing hit here would evict a value
    /// that this call never touched.
    pub fn abort_multi(&self, keys: &[K]) {
        let mut inner = self.inner.lock();
        for key in keys {
            if let Some(idx) = inner.lru.get_index(key) {
                let monitor = inner.lru.node(idx).monitor.clone();
                inner.lru.remove(idx);
                monitor.fail();
                self.metrics.record_remove();
            }
        }
        warn!(n = keys.len(), "multi-output call aborted, placeholders removed");
    }

    /// Clears every structure to its initial empty state: the in-memory map,
    /// the spill map (file contents on disk are orphaned intentionally, per
    /// §5: "cleanup is the caller's responsibility"), and the removed-set.
    /// Idempotent: a second call observes the same (empty) state as the
    /// first.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::new();
    }

    /// Current in-memory footprint, for tests and the CLI's status report.
    pub fn cache_bytes(&self) -> usize {
        self.inner.lock().lru.cache_bytes()
    }

    /// Forces the eviction walk to run with no specific target (`needed =
    /// 0`), used by the CLI to demonstrate spill behavior on demand. Not part
    /// of the public §6 API.
    pub fn force_evict_to_fit(&self) {
        let mut inner = self.inner.lock();
        let Inner { lru, spill, removed } = &mut *inner;
        let mut state = EvictionState { lru, spill, removed };
        make_room(&mut state, &self.backend, &self.config, &self.metrics, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_cache_common::CacheScalar as _;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct TestKey(u64);
    impl LineageKey for TestKey {
        fn spill_id(&self) -> u64 {
            self.0
        }
    }

    #[derive(Debug)]
    struct TestBlock(usize);
    impl MatrixBlock for TestBlock {
        fn memory_size(&self) -> usize {
            self.0
        }
        fn disk_size(&self) -> usize {
            self.0
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

    #[derive(Default)]
    struct RecordingBackend {
        writes: AtomicUsize,
        reads: AtomicUsize,
    }
    impl LocalFileUtils<TestBlock> for RecordingBackend {
        fn ensure_dir(&self) -> lineage_cache_common::error::Result<()> {
            Ok(())
        }
        fn path_for(&self, id: u64) -> std::path::PathBuf {
            std::path::PathBuf::from(format!("/tmp/rc-{id}"))
        }
        fn write(&self, _: &std::path::Path, block: &TestBlock) -> lineage_cache_common::error::Result<()> {
            self.writes.fetch_add(1, Ordering::Relaxed);
            let _ = block;
            Ok(())
        }
        fn read(&self, _: &std::path::Path) -> lineage_cache_common::error::Result<TestBlock> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            Ok(TestBlock(50))
        }
        fn delete(&self, _: &std::path::Path) -> lineage_cache_common::error::Result<()> {
            Ok(())
        }
    }
    impl BandwidthEstimator<TestBlock> for RecordingBackend {
        fn round_trip_seconds(&self, _: &TestBlock) -> f64 {
            0.0005
        }
    }

    fn cache(limit_bytes: usize, spill_enabled: bool) -> ResultCache<TestKey, TestBlock, f64, RecordingBackend> {
        let config = CacheConfig {
            total_memory_bytes: limit_bytes,
            cache_fraction: 1.0,
            spill_enabled,
            min_spill_time_ms: 1,
            ..CacheConfig::default()
        };
        ResultCache::new(RecordingBackend::default(), config)
    }

    #[test]
    fn probe_miss_then_install_then_fill_then_hit() {
        let c = cache(1000, false);
        assert!(!c.probe(&TestKey(1)));
        let acquired = c.acquire(&TestKey(1), ValueKind::Matrix, true).unwrap();
        let monitor = match acquired {
            Acquired::Miss { monitor } => monitor,
            _ => panic!("expected miss"),
        };
        c.fill(&TestKey(1), CacheValue::Matrix(Arc::new(TestBlock(10))), 5_000_000).unwrap();
        let (value, ct) = monitor.wait().unwrap();
        assert_eq!(ct, 5_000_000);
        assert!(value.as_matrix().is_some());
        assert!(c.probe(&TestKey(1)));
    }

    #[test]
    fn two_racing_producers_one_installs_one_queues() {
        let c = Arc::new(cache(1000, false));
        let acquired_a = c.acquire(&TestKey(7), ValueKind::Matrix, true).unwrap();
        let monitor_a = match acquired_a {
            Acquired::Miss { monitor } => monitor,
            _ => panic!("expected first caller to install"),
        };
        let acquired_b = c.acquire(&TestKey(7), ValueKind::Matrix, true).unwrap();
        let monitor_b = match acquired_b {
            Acquired::Hit { monitor, .. } => monitor,
            _ => panic!("expected second caller to find the placeholder and queue"),
        };
        let c2 = c.clone();
        let waiter = thread::spawn(move || monitor_b.wait());
        thread::sleep(std::time::Duration::from_millis(20));
        c2.fill(&TestKey(7), CacheValue::Matrix(Arc::new(TestBlock(10))), 1).unwrap();
        let (value, _) = waiter.join().unwrap().unwrap();
        assert!(value.as_matrix().is_some());
        let (value_a, _) = monitor_a.wait().unwrap();
        assert!(value_a.as_matrix().is_some());
        let snap = c.metrics().snapshot();
        assert_eq!(snap.queue, 1);
        assert_eq!(snap.insert, 1);
    }

    #[test]
    fn oversized_admission_wakes_waiters_with_failure() {
        let c = Arc::new(cache(100, false));
        let acquired = c.acquire(&TestKey(1), ValueKind::Matrix, true).unwrap();
        let monitor = match acquired {
            Acquired::Miss { monitor } => monitor,
            _ => unreachable!(),
        };
        let waiter_monitor = monitor.clone();
        let waiter = thread::spawn(move || waiter_monitor.wait());
        thread::sleep(std::time::Duration::from_millis(20));
        let err = c
            .fill(&TestKey(1), CacheValue::Matrix(Arc::new(TestBlock(1000))), 1)
            .unwrap_err();
        assert!(matches!(err, Error::NegativeAdmission { .. }));
        assert!(matches!(waiter.join().unwrap(), Err(Error::WaiterDisconnected)));
        assert!(!c.probe(&TestKey(1)));
    }

    #[test]
    fn spill_then_reload_round_trips() {
        let c = cache(60, true);
        c.fill(&TestKey(1), CacheValue::Matrix(Arc::new(TestBlock(50))), 5_000_000_000).unwrap();
        // Second insert forces eviction of key 1 (matrix, high exec time -> spilled).
        c.fill(&TestKey(2), CacheValue::Matrix(Arc::new(TestBlock(50))), 5_000_000_000).unwrap();
        assert!(!c.inner.lock().lru.get_index(&TestKey(1)).is_some());
        assert!(c.inner.lock().spill.contains_key(&TestKey(1)));

        let acquired = c.acquire(&TestKey(1), ValueKind::Matrix, true).unwrap();
        let monitor = match acquired {
            Acquired::Hit { monitor, .. } => monitor,
            _ => panic!("expected reload hit"),
        };
        let (value, _) = monitor.wait().unwrap();
        assert!(value.as_matrix().is_some());
        assert_eq!(c.metrics().snapshot().fs_hit, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let c = cache(1000, false);
        c.fill(&TestKey(1), CacheValue::Matrix(Arc::new(TestBlock(10))), 1).unwrap();
        assert!(c.probe(&TestKey(1)));
        c.reset();
        assert!(!c.probe(&TestKey(1)));
        assert_eq!(c.cache_bytes(), 0);
        c.reset();
        assert!(!c.probe(&TestKey(1)));
        assert_eq!(c.cache_bytes(), 0);
    }

    #[test]
    fn commit_multi_fills_every_output() {
        let c = cache(1000, false);
        c.acquire(&TestKey(1), ValueKind::Matrix, true).unwrap();
        c.acquire(&TestKey(2), ValueKind::Scalar, true).unwrap();
        c.commit_multi(vec![
            (TestKey(1), CacheValue::Matrix(Arc::new(TestBlock(10))), 1, TestKey(100)),
            (TestKey(2), CacheValue::Scalar(4.0_f64), 1, TestKey(200)),
        ])
        .unwrap();
        assert!(c.probe(&TestKey(1)));
        assert!(c.probe(&TestKey(2)));
    }

    #[test]
    fn commit_multi_is_all_or_nothing_on_negative_admission() {
        let c = cache(60, false);
        let a = match c.acquire(&TestKey(1), ValueKind::Matrix, true).unwrap() {
            Acquired::Miss { monitor } => monitor,
            _ => unreachable!(),
        };
        let b = match c.acquire(&TestKey(2), ValueKind::Matrix, true).unwrap() {
            Acquired::Miss { monitor } => monitor,
            _ => unreachable!(),
        };
        let err = c
            .commit_multi(vec![
                (TestKey(1), CacheValue::Matrix(Arc::new(TestBlock(10))), 1, TestKey(100)),
                (TestKey(2), CacheValue::Matrix(Arc::new(TestBlock(1000))), 1, TestKey(200)),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::NegativeAdmission { .. }));
        assert!(!c.probe(&TestKey(1)), "first output must not be left half-committed");
        assert!(!c.probe(&TestKey(2)));
        assert!(matches!(a.wait(), Err(Error::WaiterDisconnected)));
        assert!(matches!(b.wait(), Err(Error::WaiterDisconnected)));
    }

    #[test]
    fn abort_multi_removes_placeholders_and_wakes_waiters() {
        let c = Arc::new(cache(1000, false));
        let a = match c.acquire(&TestKey(1), ValueKind::Matrix, true).unwrap() {
            Acquired::Miss { monitor } => monitor,
            _ => unreachable!(),
        };
        let b = match c.acquire(&TestKey(2), ValueKind::Matrix, true).unwrap() {
            Acquired::Miss { monitor } => monitor,
            _ => unreachable!(),
        };
        c.abort_multi(&[TestKey(1), TestKey(2)]);
        assert!(matches!(a.wait(), Err(Error::WaiterDisconnected)));
        assert!(matches!(b.wait(), Err(Error::WaiterDisconnected)));
        assert!(!c.probe(&TestKey(1)));
        assert!(!c.probe(&TestKey(2)));
    }

    #[test]
    fn scalar_below_min_spill_time_is_deleted_not_left() {
        let c = cache(60, true);
        c.fill(&TestKey(1), CacheValue::Scalar(1.0_f64), 1).unwrap();
        c.fill(&TestKey(2), CacheValue::Matrix(Arc::new(TestBlock(60))), 1).unwrap();
        assert!(!c.probe(&TestKey(1)));
    }
}
