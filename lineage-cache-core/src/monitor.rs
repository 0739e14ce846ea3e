//! The per-entry placeholder monitor: a small mutex/condvar pair a thread
//! parks on while waiting for another thread's in-flight computation to land.
//!
//! One monitor is allocated per entry and shared (via `Arc`) between the
//! arena slot and every thread currently blocked on it. A blocked thread
//! never touches the arena or the cache-wide lock while waiting — it holds
//! only this `Arc` clone, so eviction of unrelated entries and inserts into
//! other shards of the map can proceed freely underneath it.

use lineage_cache_common::error::{Error, Result};
use lineage_cache_common::CacheValue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

enum SlotState<M, S> {
    Empty,
    Filled {
        value: CacheValue<M, S>,
        compute_time_ns: u64,
    },
    Failed,
}

pub struct Monitor<M, S> {
    state: Mutex<SlotState<M, S>>,
    cv: Condvar,
    waiting: AtomicUsize,
}

impl<M, S> Monitor<M, S> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
            cv: Condvar::new(),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Number of threads currently blocked in [`Monitor::wait`]. Read under
    /// the cache-wide lock by the eviction walk: an `Empty` entry with at
    /// least one waiter is never a candidate for eviction.
    pub fn waiting_count(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Fills the slot and wakes every blocked waiter. Calling this twice on
    /// the same monitor is a programmer error; the second call is ignored
    /// rather than panicking, since a caller observing `Status::Cached`
    /// before calling this has already been warned off by the entry state.
    pub fn fill(&self, value: CacheValue<M, S>, compute_time_ns: u64)
    where
        M: Send + Sync,
        S: Send + Sync,
    {
        let mut guard = self.state.lock();
        if matches!(*guard, SlotState::Empty) {
            *guard = SlotState::Filled {
                value,
                compute_time_ns,
            };
            drop(guard);
            self.cv.notify_all();
        }
    }

    /// Wakes every blocked waiter with a failure instead of a value. Used
    /// when admission of the computed value is rejected (negative admission)
    /// or when the entry is torn down before it was ever filled.
    pub fn fail(&self) {
        let mut guard = self.state.lock();
        if matches!(*guard, SlotState::Empty) {
            *guard = SlotState::Failed;
        }
        drop(guard);
        self.cv.notify_all();
    }

    /// Non-blocking read of a filled slot, used by the eviction walk to pull
    /// the value back out for spilling. Returns `None` for `Empty`/`Failed`.
    pub fn peek_filled(&self) -> Option<(CacheValue<M, S>, u64)>
    where
        S: Clone,
    {
        let guard = self.state.lock();
        match &*guard {
            SlotState::Filled {
                value,
                compute_time_ns,
            } => Some((value.clone(), *compute_time_ns)),
            _ => None,
        }
    }

    /// Blocks until the slot is filled or failed, returning a clone of the
    /// value (and the compute time recorded alongside it) on success.
    pub fn wait(&self) -> Result<(CacheValue<M, S>, u64)>
    where
        M: Send + Sync,
        S: Clone + Send + Sync,
    {
        self.waiting.fetch_add(1, Ordering::AcqRel);
        let mut guard = self.state.lock();
        loop {
            match &*guard {
                SlotState::Filled {
                    value,
                    compute_time_ns,
                } => {
                    let result = (value.clone(), *compute_time_ns);
                    drop(guard);
                    self.waiting.fetch_sub(1, Ordering::AcqRel);
                    return Ok(result);
                }
                SlotState::Failed => {
                    drop(guard);
                    self.waiting.fetch_sub(1, Ordering::AcqRel);
                    return Err(Error::WaiterDisconnected);
                }
                SlotState::Empty => self.cv.wait(&mut guard),
            }
        }
    }
}
