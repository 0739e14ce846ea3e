//! Shared traits, error types and statistics hooks for `lineage-cache`.
//!
//! This crate plays the role `foyer-common` plays for `foyer`: it has no
//! opinion on eviction policy or residency, only on the vocabulary the other
//! crates share.

pub mod collab;
pub mod config;
pub mod error;
pub mod metrics;
pub mod value;

pub use collab::{BandwidthEstimator, LocalFileUtils};
pub use config::{CacheConfig, ReuseMode};
pub use value::{CacheScalar, CacheValue, MatrixBlock};

use std::fmt::Debug;
use std::hash::Hash;

/// Bound required of a lineage item to be used as a cache key.
///
/// A lineage item is an opaque, content-addressed fingerprint: the cache only
/// ever compares two lineage items for equality, hashes them, and (for spill
/// file naming) asks for a stable integer identity.
pub trait LineageKey: Hash + Eq + Clone + Debug + Send + Sync + 'static {
    /// A stable integer identity used to name spill files.
    ///
    /// Two equal keys must return the same id; the id need not be unique
    /// across non-equal keys (a hash collision in the filename only costs a
    /// spurious overwrite-and-reload, it cannot corrupt cache state because
    /// the in-memory map is still keyed by the full `LineageKey`).
    fn spill_id(&self) -> u64;
}

/// The kind of value a cache entry holds.
///
/// Kept as a standalone enum (rather than folded into the value type) because
/// `kind` is fixed when the entry's placeholder is installed, independent of
/// whether the value slot has been filled yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Matrix,
    Scalar,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Matrix => "matrix",
            ValueKind::Scalar => "scalar",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
