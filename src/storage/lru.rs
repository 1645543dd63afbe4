//! LRU Recency Index
//!
//! A doubly linked recency list over the same key set the Htree holds:
//! most-recently-used at the front, eviction victim at the back. Links are
//! slot indices into a vector rather than pointers, which keeps the
//! structure safe Rust with O(1) touch, victim and remove.
//!
//! The index stores only keys. Pairing each tracked key with a live Htree
//! entry (and vice versa) is the command engine's invariant, not this
//! module's.

use bytes::Bytes;
use std::collections::HashMap;

/// Sentinel for "no neighbor" link.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    key: Bytes,
    prev: usize,
    next: usize,
}

/// Tracks key recency for eviction.
///
/// # Example
///
/// ```
/// use snapkv::storage::LruIndex;
/// use bytes::Bytes;
///
/// let mut lru = LruIndex::new();
/// lru.touch(Bytes::from("a"));
/// lru.touch(Bytes::from("b"));
/// lru.touch(Bytes::from("a")); // "a" is now most recent
///
/// assert_eq!(lru.victim(), Some(&Bytes::from("b")));
/// ```
#[derive(Debug, Default)]
pub struct LruIndex {
    /// Key to slot in `nodes`.
    map: HashMap<Bytes, usize>,
    /// Slot arena; vacated slots are recycled via `free`.
    nodes: Vec<Node>,
    free: Vec<usize>,
    /// Most recently used slot, or NIL when empty.
    head: usize,
    /// Least recently used slot, or NIL when empty.
    tail: usize,
}

impl LruIndex {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    /// Marks `key` most recently used, inserting it if untracked.
    ///
    /// The relative order of all other keys is unchanged.
    pub fn touch(&mut self, key: Bytes) {
        if let Some(&slot) = self.map.get(&key) {
            self.unlink(slot);
            self.push_front(slot);
        } else {
            let slot = self.alloc(key.clone());
            self.map.insert(key, slot);
            self.push_front(slot);
        }
    }

    /// Peeks the least recently used key without removing it.
    pub fn victim(&self) -> Option<&Bytes> {
        (self.tail != NIL).then(|| &self.nodes[self.tail].key)
    }

    /// Detaches `key` from the list; no-op if it is not tracked.
    pub fn remove(&mut self, key: &[u8]) {
        if let Some(slot) = self.map.remove(key) {
            self.unlink(slot);
            self.free.push(slot);
        }
    }

    /// Returns whether `key` is tracked.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over tracked keys, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        let mut slot = self.head;
        std::iter::from_fn(move || {
            if slot == NIL {
                return None;
            }
            let node = &self.nodes[slot];
            slot = node.next;
            Some(&node.key)
        })
    }

    fn alloc(&mut self, key: Bytes) -> usize {
        let node = Node {
            key,
            prev: NIL,
            next: NIL,
        };
        if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = slot;
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }
    }
}
