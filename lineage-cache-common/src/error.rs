//! Error taxonomy for the result cache.

use thiserror::Error;

/// Errors surfaced by `lineage-cache` and its satellite crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A spill write or reload read failed at the filesystem boundary.
    ///
    /// On this error the caller's entry is removed from the cache and its
    /// size is deducted before the error propagates, restoring the cache's
    /// bookkeeping invariants.
    #[error("i/o error during spill or reload: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or deserializing a spilled matrix block failed.
    #[error("failed to (de)serialize spilled block: {0}")]
    Serde(#[from] bincode::Error),

    /// A programmer invariant was violated: a null value reached `set_value`,
    /// a scalar was routed to the spill path, or a spill record referenced a
    /// key that was also present in the live map. Fatal by design.
    #[error("spill invariant violated: {0}")]
    SpillInvariant(String),

    /// A thread waiting on an entry's monitor observed the monitor torn down
    /// (producer panicked, or the entry was dropped) without ever receiving a
    /// value. Treated as fatal because the underlying computation has no
    /// kill path to fall back on.
    #[error("waiter disconnected before the placeholder at this lineage item was filled")]
    WaiterDisconnected,

    /// The value could not be admitted: either it alone exceeds `CACHE_LIMIT`,
    /// or the eviction walk could not free enough space. Not a fault of the
    /// cache or the caller — a negative decision the caller must act on. Any
    /// threads already parked on the placeholder are woken with this same
    /// error rather than left blocked forever.
    #[error("value of {requested} bytes could not be admitted into a cache with {limit} byte limit")]
    NegativeAdmission { requested: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
