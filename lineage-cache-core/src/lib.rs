//! In-memory entry, LRU index, admission/sizing, eviction policy, and single-
//! and multi-output reuse coordination for `lineage-cache`.
//!
//! This crate plays the role `foyer-memory` plays for `foyer`: it owns the
//! hot path (the arena-backed LRU, the per-entry placeholder monitor, the
//! cost-based eviction walk) behind one generic [`cache::ResultCache`] type,
//! parameterized over the lineage key and value types so it carries no
//! knowledge of instructions, execution contexts, or matrix element layout —
//! those collaborator types live in the `lineage-cache` facade crate, which
//! is the only crate that calls into this one directly.

mod admission;
pub mod cache;
pub mod entry;
mod eviction;
mod lru;
pub mod monitor;
mod spillmap;

pub use cache::{Acquired, ResultCache};
pub use entry::Status;
pub use monitor::Monitor;
