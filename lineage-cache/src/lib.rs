//! `lineage-cache`: a lineage-keyed result cache for a matrix-oriented
//! dataflow runtime.
//!
//! This is the public facade `foyer` plays for its own split: it wires
//! `lineage-cache-core`'s in-memory engine to `lineage-cache-spill`'s on-disk
//! half, and defines the small set of collaborator traits ([`ExecutionContext`],
//! [`Instruction`], [`PartialReuseRewriter`], [`LineageUtils`]) a host runtime
//! implements against its own instruction dispatch loop and symbol table.
//!
//! ```text
//! runtime --try_reuse_*--> LineageCache --acquire/fill--> ResultCache (lineage-cache-core)
//!                                                                |
//!                                                                v
//!                                                    DiskSpillStore (lineage-cache-spill)
//! ```

pub mod cache;
pub mod collab;

pub use cache::{LineageCache, MultiOutputSpec, MultiReuseOutcome};
pub use collab::{ExecutionContext, Instruction, LineageUtils, NeverTainted, NoPartialReuse, PartialReuseRewriter};

pub use lineage_cache_common::error::{Error, Result};
pub use lineage_cache_common::{CacheConfig, CacheScalar, CacheValue, LineageKey, MatrixBlock, ReuseMode, ValueKind};
pub use lineage_cache_spill::{AdaptiveBandwidthEstimator, DiskSpillStore, Matrix};
