//! Entry state machine: the status an arena slot moves through between
//! placeholder installation and eviction.

/// Lifecycle state of a cache entry.
///
/// `Empty` and `Cached`/`Reloaded` are the two states an entry is parked in
/// while it sits in the LRU list. `ToRemove` is transient: it is set while a
/// slot is being unlinked so a thread that already resolved the index before
/// the cache lock was taken cannot observe a half-removed node, and is never
/// itself walked by the eviction loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Placeholder installed, value not yet produced.
    Empty,
    /// Value resident in memory, produced by this process.
    Cached,
    /// Value resident in memory, having been reloaded from the spill store.
    Reloaded,
    /// Being unlinked; never observed outside the critical section that set it.
    ToRemove,
}

impl Status {
    /// Whether an entry in this status, with `waiting` threads parked on its
    /// monitor, is a legal candidate for the eviction walk to remove.
    pub fn can_evict(self, waiting: usize) -> bool {
        match self {
            Status::Empty => waiting == 0,
            Status::Cached | Status::Reloaded => true,
            Status::ToRemove => false,
        }
    }
}
