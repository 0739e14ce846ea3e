//! Arena-backed, index-linked LRU list.
//!
//! Each entry lives in a `Vec<Slot>` at a fixed `u32` index for its lifetime;
//! the doubly linked list threading MRU to LRU order is expressed as `prev`/
//! `next` indices into that same arena rather than `NonNull` pointers. A
//! single fixed eviction policy (tail-to-head LRU walk) does not need the
//! pointer-based, trait-object-dispatched intrusive list a pluggable
//! multi-policy cache would use; the arena gives the same O(1) link/unlink
//! with none of the unsafety.

use lineage_cache_common::ValueKind;
use std::sync::Arc;

use crate::entry::Status;
use crate::monitor::Monitor;

pub(crate) struct Node<K, M, S> {
    pub key: K,
    pub kind: ValueKind,
    pub status: Status,
    pub origin_key: Option<K>,
    pub compute_time_ns: u64,
    pub charge: usize,
    pub monitor: Arc<Monitor<M, S>>,
    /// Set when this node was last (re)inserted by a spill reload; cleared by
    /// the first eviction-walk pass that visits it, or by the next explicit
    /// `touch`. While set, the eviction walk spares the entry once instead of
    /// evicting it, per the `RELOADED`-as-thrash-hint design decision.
    pub reloaded_once_spared: bool,
    prev: Option<u32>,
    next: Option<u32>,
}

enum Slot<K, M, S> {
    Occupied(Node<K, M, S>),
    Free(Option<u32>),
}

/// Arena + index map + MRU/LRU doubly linked list, all guarded by whatever
/// lock the owning cache takes around every call (see `cache::ResultCache`).
pub(crate) struct LruIndex<K, M, S> {
    slots: Vec<Slot<K, M, S>>,
    free_head: Option<u32>,
    map: hashbrown::HashMap<K, u32, ahash::RandomState>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
    cache_bytes: usize,
}

impl<K, M, S> LruIndex<K, M, S>
where
    K: std::hash::Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            map: hashbrown::HashMap::default(),
            head: None,
            tail: None,
            len: 0,
            cache_bytes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn cache_bytes(&self) -> usize {
        self.cache_bytes
    }

    pub fn get_index(&self, key: &K) -> Option<u32> {
        self.map.get(key).copied()
    }

    pub fn node(&self, idx: u32) -> &Node<K, M, S> {
        match &self.slots[idx as usize] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("dangling LRU index"),
        }
    }

    pub fn node_mut(&mut self, idx: u32) -> &mut Node<K, M, S> {
        match &mut self.slots[idx as usize] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("dangling LRU index"),
        }
    }

    /// Inserts a fresh `Empty` placeholder at the MRU end and returns its index.
    pub fn insert_placeholder(&mut self, key: K, kind: ValueKind) -> u32 {
        let node = Node {
            key: key.clone(),
            kind,
            status: Status::Empty,
            origin_key: None,
            compute_time_ns: 0,
            charge: 0,
            monitor: Arc::new(Monitor::new()),
            reloaded_once_spared: false,
            prev: None,
            next: None,
        };
        let idx = self.alloc(node);
        self.map.insert(key, idx);
        self.push_front(idx);
        self.len += 1;
        idx
    }

    /// Inserts an already-filled node at the MRU end: used when a value
    /// becomes resident without passing through the placeholder/wait
    /// protocol, namely a spill reload (the value is read back synchronously
    /// under the cache lock, so there is never a moment where a waiter could
    /// observe it as empty).
    pub fn insert_filled(
        &mut self,
        key: K,
        kind: ValueKind,
        monitor: Arc<Monitor<M, S>>,
        status: Status,
        compute_time_ns: u64,
        charge: usize,
        origin_key: Option<K>,
    ) -> u32 {
        let node = Node {
            key: key.clone(),
            kind,
            status,
            origin_key,
            compute_time_ns,
            charge,
            monitor,
            reloaded_once_spared: matches!(status, Status::Reloaded),
            prev: None,
            next: None,
        };
        let idx = self.alloc(node);
        self.map.insert(key, idx);
        self.push_front(idx);
        self.len += 1;
        self.cache_bytes += charge;
        idx
    }

    /// Moves `idx` to the MRU end. Called on every probe/get/touch hit. Also
    /// clears the reload-spared bit and, if the entry was `Reloaded`, settles
    /// it into ordinary `Cached` status: a second real touch means it is no
    /// longer merely a one-shot reload, it is genuinely back in rotation.
    pub fn touch(&mut self, idx: u32) {
        {
            let node = self.node_mut(idx);
            node.reloaded_once_spared = false;
            if node.status == Status::Reloaded {
                node.status = Status::Cached;
            }
        }
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    /// Adjusts `cache_bytes` by `delta`, which may be negative relative to a
    /// previous charge on `idx` (e.g. a reload re-decompresses to a different
    /// size than the spilled record implied).
    pub fn set_charge(&mut self, idx: u32, charge: usize) {
        let node = self.node_mut(idx);
        self.cache_bytes = self.cache_bytes - node.charge + charge;
        self.node_mut(idx).charge = charge;
    }

    /// Removes `idx` from both the map and the list, returning its `Node`
    /// and reclaiming the arena slot onto the free list.
    pub fn remove(&mut self, idx: u32) -> Node<K, M, S> {
        self.unlink(idx);
        let node = match std::mem::replace(&mut self.slots[idx as usize], Slot::Free(self.free_head))
        {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("dangling LRU index"),
        };
        self.free_head = Some(idx);
        self.map.remove(&node.key);
        self.cache_bytes -= node.charge;
        self.len -= 1;
        node
    }

    /// Iterates indices from the LRU (tail) end towards the MRU (head) end,
    /// the order the eviction walk scans in.
    pub fn iter_from_tail(&self) -> impl Iterator<Item = u32> + '_ {
        std::iter::successors(self.tail, move |&idx| self.node(idx).prev)
    }

    /// The current LRU-end index. `None` only when the list is empty.
    pub fn tail_index(&self) -> Option<u32> {
        self.tail
    }

    /// The neighbor one step closer to the MRU end from `idx`.
    pub fn prev_of(&self, idx: u32) -> Option<u32> {
        self.node(idx).prev
    }

    fn alloc(&mut self, node: Node<K, M, S>) -> u32 {
        if let Some(idx) = self.free_head {
            let next_free = match &self.slots[idx as usize] {
                Slot::Free(next) => *next,
                Slot::Occupied(_) => unreachable!("corrupt free list"),
            };
            self.free_head = next_free;
            self.slots[idx as usize] = Slot::Occupied(node);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot::Occupied(node));
            idx
        }
    }

    fn unlink(&mut self, idx: u32) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, idx: u32) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lru() -> LruIndex<&'static str, (), f64> {
        LruIndex::new()
    }

    #[test]
    fn insert_and_lookup() {
        let mut l = lru();
        let idx = l.insert_placeholder("a", ValueKind::Scalar);
        assert_eq!(l.get_index(&"a"), Some(idx));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn eviction_order_is_lru_to_mru() {
        let mut l = lru();
        let a = l.insert_placeholder("a", ValueKind::Scalar);
        let b = l.insert_placeholder("b", ValueKind::Scalar);
        let c = l.insert_placeholder("c", ValueKind::Scalar);
        let order: Vec<u32> = l.iter_from_tail().collect();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn touch_moves_to_mru_end() {
        let mut l = lru();
        let a = l.insert_placeholder("a", ValueKind::Scalar);
        let b = l.insert_placeholder("b", ValueKind::Scalar);
        l.touch(a);
        let order: Vec<u32> = l.iter_from_tail().collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn remove_reclaims_slot_and_relinks_neighbors() {
        let mut l = lru();
        let a = l.insert_placeholder("a", ValueKind::Scalar);
        let b = l.insert_placeholder("b", ValueKind::Scalar);
        let c = l.insert_placeholder("c", ValueKind::Scalar);
        l.remove(b);
        assert_eq!(l.get_index(&"b"), None);
        let order: Vec<u32> = l.iter_from_tail().collect();
        assert_eq!(order, vec![a, c]);
        let d = l.insert_placeholder("d", ValueKind::Scalar);
        assert_eq!(d, b, "freed slot should be reused");
    }

    #[test]
    fn set_charge_updates_cache_bytes() {
        let mut l = lru();
        let a = l.insert_placeholder("a", ValueKind::Scalar);
        l.set_charge(a, 100);
        assert_eq!(l.cache_bytes(), 100);
        l.set_charge(a, 40);
        assert_eq!(l.cache_bytes(), 40);
    }
}
