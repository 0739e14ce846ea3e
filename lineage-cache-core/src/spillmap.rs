//! Bookkeeping for the on-disk half of residency: which keys have been
//! spilled, and where. Guarded by the same cache-wide lock as the in-memory
//! map and LRU list, never its own lock — a key may never be resolvable in
//! both at once, and that invariant only holds if both live under one lock.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub(crate) struct SpillRecord {
    pub path: PathBuf,
    pub compute_time_ns: u64,
}
