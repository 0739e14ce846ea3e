//! [`DiskSpillStore`]: the `LocalFileUtils` implementation the cache's
//! eviction walk and reload path write and read matrix blocks through.
//!
//! One matrix block per file, named `<lineage_id>` (per spec.md §6), under a
//! process-unique working directory created lazily on first spill — mirrors
//! `foyer-storage`'s `create_dir_all` lazy-open pattern in its direct-fs
//! device, minus the alignment and direct-I/O machinery that device needs
//! for O_DIRECT raw block regions and this single-file-per-entry store does
//! not.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use lineage_cache_common::error::Result;
use lineage_cache_common::{BandwidthEstimator, LocalFileUtils, MatrixBlock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::bandwidth::AdaptiveBandwidthEstimator;

/// Builds a process-unique directory under `base`, the way `foyer-storage`
/// picks a fresh device directory per test run: `base/lineage-cache-<pid>-
/// <nanos since epoch>`, so two processes (or two cache instances created in
/// the same process, e.g. in tests) never collide on the same spill files.
pub fn process_unique_dir(base: impl AsRef<Path>) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    base.as_ref().join(format!("lineage-cache-{}-{nanos}", std::process::id()))
}

/// On-disk half of residency (C3): writes/reads whole matrix blocks to/from a
/// working directory, feeding every real I/O into an [`AdaptiveBandwidthEstimator`].
pub struct DiskSpillStore<M> {
    dir: PathBuf,
    estimator: Arc<AdaptiveBandwidthEstimator>,
    dir_created: AtomicU64,
    _marker: PhantomData<fn() -> M>,
}

impl<M> DiskSpillStore<M> {
    pub fn new(dir: impl Into<PathBuf>, min_spill_data_mb: f64) -> Self {
        Self {
            dir: dir.into(),
            estimator: Arc::new(AdaptiveBandwidthEstimator::new(min_spill_data_mb)),
            dir_created: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    /// Shares this store's bandwidth estimator, e.g. to pass the same `Arc`
    /// into a `ResultCache` built from a different `DiskSpillStore` facade.
    pub fn estimator(&self) -> Arc<AdaptiveBandwidthEstimator> {
        self.estimator.clone()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl<M> LocalFileUtils<M> for DiskSpillStore<M>
where
    M: MatrixBlock + Serialize + DeserializeOwned,
{
    fn ensure_dir(&self) -> Result<()> {
        if self.dir_created.swap(1, Ordering::AcqRel) == 0 {
            fs::create_dir_all(&self.dir)?;
            debug!(dir = %self.dir.display(), "spill directory created");
        }
        Ok(())
    }

    fn path_for(&self, spill_id: u64) -> PathBuf {
        self.dir.join(spill_id.to_string())
    }

    fn write(&self, path: &Path, block: &M) -> Result<()> {
        self.ensure_dir()?;
        let size_mb = block.disk_size() as f64 / (1024.0 * 1024.0);
        let start = Instant::now();
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), block)?;
        self.estimator.observe_write(size_mb, block.is_sparse(), start.elapsed().as_secs_f64());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<M> {
        let start = Instant::now();
        let file = File::open(path)?;
        let block: M = bincode::deserialize_from(BufReader::new(file))?;
        let size_mb = block.disk_size() as f64 / (1024.0 * 1024.0);
        self.estimator.observe_read(size_mb, block.is_sparse(), start.elapsed().as_secs_f64());
        Ok(block)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl<M: MatrixBlock> BandwidthEstimator<M> for DiskSpillStore<M> {
    fn round_trip_seconds(&self, block: &M) -> f64 {
        self.estimator.round_trip_seconds(block)
    }
}
