//! Drives a `LineageCache` with a synthetic workload and prints its
//! `Metrics` snapshot, the way `foyer-cli` exercises `foyer` outside of a
//! real host runtime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use lineage_cache::{
    CacheConfig, CacheValue, ExecutionContext, Instruction, LineageCache, LineageKey, Matrix, NeverTainted,
    NoPartialReuse, ReuseMode, ValueKind,
};
use lineage_cache_spill::DiskSpillStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lineage-cache-cli", about = "drive a lineage-cache with a synthetic workload")]
struct Args {
    /// Number of distinct lineage keys in the working set.
    #[arg(long, default_value_t = 64)]
    keys: u64,

    /// Number of instruction executions to simulate.
    #[arg(long, default_value_t = 10_000)]
    iterations: u64,

    /// Cache memory budget, in MiB.
    #[arg(long, default_value_t = 64)]
    cache_mb: u64,

    /// Side length of each (square, dense) simulated matrix output.
    #[arg(long, default_value_t = 256)]
    matrix_side: usize,

    /// Enable disk spill on eviction instead of straight deletion.
    #[arg(long, default_value_t = true)]
    spill: bool,

    /// Working directory for spilled matrix blocks.
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Simulated compute time per miss, in milliseconds.
    #[arg(long, default_value_t = 50)]
    compute_ms: u64,

    /// RNG seed, for reproducible key-access sequences.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DemoKey(u64);

impl LineageKey for DemoKey {
    fn spill_id(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct DemoContext {
    out: Option<Arc<Matrix>>,
}

impl ExecutionContext<DemoKey, Matrix, f64> for DemoContext {
    fn get_variable(&self, _name: &str) -> Option<CacheValue<Matrix, f64>> {
        self.out.clone().map(CacheValue::Matrix)
    }
    fn set_matrix(&mut self, _name: &str, value: Arc<Matrix>) {
        self.out = Some(value);
    }
    fn set_scalar(&mut self, _name: &str, _value: f64) {}
    fn remove_variable(&mut self, _name: &str) {
        self.out = None;
    }
    fn attach_lineage(&mut self, _name: &str, _key: DemoKey) {}
    fn variable_lineage(&self, _name: &str) -> Option<DemoKey> {
        None
    }
    fn cleanup_replaced(&mut self, _name: &str) {}
}

struct DemoInstr {
    key: DemoKey,
}

impl Instruction<DemoKey> for DemoInstr {
    fn is_reuse_eligible(&self) -> bool {
        true
    }
    fn is_marked_for_caching(&self) -> bool {
        true
    }
    fn lineage_key(&self) -> DemoKey {
        self.key
    }
    fn kind(&self) -> ValueKind {
        ValueKind::Matrix
    }
    fn output_name(&self) -> &str {
        "out"
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let dir = args
        .dir
        .unwrap_or_else(|| lineage_cache_spill::process_unique_dir(std::env::temp_dir()));

    let backend = DiskSpillStore::new(dir.clone(), 0.0);
    let config = CacheConfig {
        reuse_mode: ReuseMode::Full,
        spill_enabled: args.spill,
        total_memory_bytes: (args.cache_mb as usize) * 1024 * 1024,
        cache_fraction: 1.0,
        min_spill_time_ms: 1,
        ..CacheConfig::default()
    };
    let cache = LineageCache::new(backend, NoPartialReuse, NeverTainted, config);

    info!(
        keys = args.keys,
        iterations = args.iterations,
        cache_mb = args.cache_mb,
        spill = args.spill,
        dir = %dir.display(),
        "starting synthetic workload"
    );

    let mut rng = StdRng::seed_from_u64(args.seed);
    let started = Instant::now();
    for _ in 0..args.iterations {
        let key = DemoKey(rng.gen_range(0..args.keys));
        let instr = DemoInstr { key };
        let mut ctx = DemoContext::default();

        if cache.try_reuse_single(&instr, &mut ctx)? {
            continue;
        }

        let side = args.matrix_side;
        ctx.set_matrix("out", Arc::new(Matrix::dense(side, side, vec![1.0; side * side])));
        cache.put_matrix_single(&instr, &ctx, args.compute_ms * 1_000_000)?;
    }
    let elapsed = started.elapsed();

    let snapshot = cache.metrics().snapshot();
    println!("elapsed:            {elapsed:?}");
    println!("cache_bytes:        {}", bytesize::ByteSize(cache.cache_bytes() as u64));
    println!("hit:                {}", snapshot.hit);
    println!("miss:               {}", snapshot.miss);
    println!("insert:             {}", snapshot.insert);
    println!("evict:              {}", snapshot.evict);
    println!("fs_write:           {}", snapshot.fs_write);
    println!("fs_hit:             {}", snapshot.fs_hit);
    println!("queue:              {}", snapshot.queue);
    println!("would_have_hit:     {}", snapshot.would_have_hit);
    println!("negative_admission: {}", snapshot.negative_admission);

    Ok(())
}
