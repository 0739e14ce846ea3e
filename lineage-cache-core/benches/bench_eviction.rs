//! Throughput of the hot paths: a steady-state hit/miss mix against
//! `ResultCache::acquire`/`fill`, and the eviction walk under memory
//! pressure tight enough to evict on every admission.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lineage_cache_common::error::Result;
use lineage_cache_common::{BandwidthEstimator, CacheConfig, CacheValue, LineageKey, LocalFileUtils, MatrixBlock, ValueKind};
use lineage_cache_core::{Acquired, ResultCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BenchKey(u64);

impl LineageKey for BenchKey {
    fn spill_id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct BenchBlock(usize);

impl MatrixBlock for BenchBlock {
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

struct NullBackend;

impl LocalFileUtils<BenchBlock> for NullBackend {
    fn ensure_dir(&self) -> Result<()> {
        Ok(())
    }
    fn path_for(&self, spill_id: u64) -> PathBuf {
        PathBuf::from(format!("/tmp/bench-eviction-{spill_id}.bin"))
    }
    fn write(&self, _path: &Path, _block: &BenchBlock) -> Result<()> {
        Ok(())
    }
    fn read(&self, _path: &Path) -> Result<BenchBlock> {
        Ok(BenchBlock(4096))
    }
    fn delete(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

impl BandwidthEstimator<BenchBlock> for NullBackend {
    fn round_trip_seconds(&self, _block: &BenchBlock) -> f64 {
        0.0001
    }
}

fn cache(limit_bytes: usize, spill_enabled: bool) -> ResultCache<BenchKey, BenchBlock, f64, NullBackend> {
    let config = CacheConfig {
        total_memory_bytes: limit_bytes,
        cache_fraction: 1.0,
        spill_enabled,
        min_spill_time_ms: 1,
        min_spill_data_mb: 0.0,
        ..CacheConfig::default()
    };
    ResultCache::new(NullBackend, config)
}

fn bench_hit_miss_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_fill_mix");
    for resident in [64usize, 1024, 8192] {
        group.bench_with_input(BenchmarkId::from_parameter(resident), &resident, |b, &resident| {
            let cache = cache(resident * 4096 * 2, false);
            for i in 0..resident as u64 {
                let key = BenchKey(i);
                if let Acquired::Miss { .. } = cache.acquire(&key, ValueKind::Matrix, true).unwrap() {
                    cache.fill(&key, CacheValue::Matrix(Arc::new(BenchBlock(4096))), 1_000_000).unwrap();
                }
            }
            let mut next = resident as u64;
            b.iter(|| {
                // Alternate a hit against an already-resident key with a miss
                // that installs and immediately fills a fresh one, the mix a
                // steady-state workload settles into once its working set
                // stabilizes.
                let hit_key = BenchKey(next % resident as u64);
                black_box(cache.acquire(&hit_key, ValueKind::Matrix, false).unwrap());

                let miss_key = BenchKey(next);
                match cache.acquire(&miss_key, ValueKind::Matrix, true).unwrap() {
                    Acquired::Miss { .. } => {
                        cache.fill(&miss_key, CacheValue::Matrix(Arc::new(BenchBlock(4096))), 1_000_000).unwrap();
                    }
                    Acquired::Hit { monitor, .. } => {
                        black_box(monitor.wait().unwrap());
                    }
                    Acquired::NotCached => unreachable!(),
                }
                next += 1;
            });
        });
    }
    group.finish();
}

fn bench_eviction_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction_walk");
    for spill_enabled in [false, true] {
        group.bench_with_input(BenchmarkId::from_parameter(spill_enabled), &spill_enabled, |b, &spill_enabled| {
            // A limit tight enough that every admission evicts the prior
            // entry: this isolates the eviction walk's own cost from the
            // admission fast path exercised above.
            let cache = cache(4096 * 2, spill_enabled);
            let mut next = 0u64;
            b.iter(|| {
                let key = BenchKey(next);
                if let Acquired::Miss { .. } = cache.acquire(&key, ValueKind::Matrix, true).unwrap() {
                    cache.fill(&key, CacheValue::Matrix(Arc::new(BenchBlock(4096))), 200_000_000).unwrap();
                }
                next += 1;
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hit_miss_mix, bench_eviction_walk);
criterion_main!(benches);
