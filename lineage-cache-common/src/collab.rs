//! Collaborator contracts the cache consumes but does not implement.
//!
//! These live in `lineage-cache-common` rather than the facade crate for the
//! same reason `foyer-common::code` holds the `Key`/`Value` bounds both
//! `foyer-memory` and `foyer-storage` implement against: `lineage-cache-core`
//! needs the trait to type its eviction walk, and `lineage-cache-spill` needs
//! it to provide an implementation, and neither of those crates depends on
//! the other.

use crate::error::Result;
use crate::value::MatrixBlock;
use std::path::{Path, PathBuf};

/// Local file utilities: the on-disk half of the spill store. An
/// implementation owns a working directory and is responsible for turning a
/// matrix block into bytes on disk and back.
pub trait LocalFileUtils<M: MatrixBlock>: Send + Sync {
    /// Creates the working directory if it does not already exist.
    fn ensure_dir(&self) -> Result<()>;

    /// The path a block with this spill id would be written to. Pure; does
    /// not touch the filesystem.
    fn path_for(&self, spill_id: u64) -> PathBuf;

    /// Serializes `block` to `path`. Implementations time the write and feed
    /// it to their bandwidth estimator before returning.
    fn write(&self, path: &Path, block: &M) -> Result<()>;

    /// Deserializes a block previously written by `write`. Implementations
    /// time the read and feed it to their bandwidth estimator before
    /// returning.
    fn read(&self, path: &Path) -> Result<M>;

    /// Removes a spilled file. Idempotent: removing a path that is already
    /// gone is not an error.
    fn delete(&self, path: &Path) -> Result<()>;
}

/// Adaptive bandwidth estimation: four independently tracked exponential
/// moving averages (read/write crossed with dense/sparse), used to turn a
/// candidate block's size into an estimated disk round trip.
pub trait BandwidthEstimator<M: MatrixBlock>: Send + Sync {
    /// Estimated time, in seconds, to spill `block` out and later reload it,
    /// using the current read/write EMA for its density class.
    fn round_trip_seconds(&self, block: &M) -> f64;
}
