//! Copy-on-Write Chained Hash Table
//!
//! This module implements the storage core of snapkv: a chained hash table
//! over a fixed directory of 64 buckets that supports point-in-time
//! snapshots with structural sharing.
//!
//! ## Copy-on-Write Model
//!
//! Each bucket owns one chain of entries, held behind an `Arc`. A snapshot
//! freezes the current bucket-head array by cloning the 64 `Arc` handles
//! into an append-only history - O(bucket count), no chain is touched.
//! After that, every chain is shared between the frozen generation and the
//! live table, so the first mutation of a bucket goes through
//! [`Arc::make_mut`], which clones that one chain into a private copy
//! before the write. Buckets never written after a snapshot keep sharing
//! physical storage with it forever.
//!
//! ```text
//!  frozen gen 0      live table
//!  ┌─────────┐      ┌─────────┐
//!  │ bucket 0 ──┐ ┌── bucket 0 │   shared chain (no write yet)
//!  │ bucket 1 ─┐│ │┌─ bucket 1 │
//!  │   ...    │ ▼ ▼ │   ...   │
//!  └─────────┘ [a,b] └─────────┘
//!              chain
//! ```
//!
//! Frozen generations are retained for the life of the process; there is
//! no reclamation. The directory is never resized.
//!
//! ## Synchronization
//!
//! None. `Htree` is a single-writer structure; callers (the command
//! engine, behind the connection layer's mutex) are responsible for
//! serializing access.

use bytes::Bytes;
use std::sync::Arc;

/// Number of buckets in the table directory, fixed at construction.
pub const BUCKET_COUNT: usize = 64;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over raw key bytes. Unseeded, stable across calls.
#[inline]
fn fnv1a(key: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in key {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A stored value, tagged by type.
///
/// Only [`Value::Str`] has implemented behavior. The remaining tags are
/// declared extension points: any command that encounters one reports a
/// type-mismatch fault rather than operating on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A binary-safe string, the only active variant.
    Str(Bytes),
    /// Reserved: ordered sequence of strings.
    List(Vec<Bytes>),
    /// Reserved: unordered set of strings.
    Set(Vec<Bytes>),
    /// Reserved: scored, sorted set of strings.
    SortedSet(Vec<(Bytes, f64)>),
    /// Reserved: field-to-string map.
    Hash(Vec<(Bytes, Bytes)>),
}

impl Value {
    /// The protocol-level name of this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::SortedSet(_) => "zset",
            Value::Hash(_) => "hash",
        }
    }

    /// Returns the string payload, or `None` for any other tag.
    pub fn as_str(&self) -> Option<&Bytes> {
        match self {
            Value::Str(b) => Some(b),
            _ => None,
        }
    }
}

/// One key-value pair within a bucket chain.
#[derive(Debug, Clone)]
struct Entry {
    key: Bytes,
    value: Value,
}

/// A bucket's chain: an owned sequence of entries, shared across
/// generations until a write forces a private copy.
type Chain = Arc<Vec<Entry>>;

/// Identifies one frozen generation, as returned by [`Htree::snapshot`].
pub type GenerationId = usize;

/// A chained hash table with copy-on-write snapshots.
///
/// # Example
///
/// ```
/// use snapkv::storage::{Htree, Value};
/// use bytes::Bytes;
///
/// let mut table = Htree::new();
/// table.put(Bytes::from("k"), Value::Str(Bytes::from("v1")));
///
/// let gen = table.snapshot();
/// table.put(Bytes::from("k"), Value::Str(Bytes::from("v2")));
///
/// // The live table sees the new value, the snapshot still sees the old.
/// assert_eq!(table.get(b"k"), Some(&Value::Str(Bytes::from("v2"))));
/// assert_eq!(table.get_at(gen, b"k"), Some(&Value::Str(Bytes::from("v1"))));
/// ```
#[derive(Debug)]
pub struct Htree {
    /// The live table: one chain handle per bucket.
    table: Vec<Chain>,
    /// Append-only history of frozen bucket-head arrays.
    snapshots: Vec<Vec<Chain>>,
    /// Number of live entries in the current generation.
    size: usize,
}

impl Default for Htree {
    fn default() -> Self {
        Self::new()
    }
}

impl Htree {
    /// Creates an empty table with [`BUCKET_COUNT`] buckets.
    pub fn new() -> Self {
        Self {
            table: (0..BUCKET_COUNT).map(|_| Arc::new(Vec::new())).collect(),
            snapshots: Vec::with_capacity(4),
            size: 0,
        }
    }

    #[inline]
    fn bucket(&self, key: &[u8]) -> usize {
        fnv1a(key) as usize % BUCKET_COUNT
    }

    /// Inserts or updates `key` with `value`.
    ///
    /// If the key is present in the current generation its value is
    /// replaced; otherwise a new entry is added to the bucket chain. Either
    /// way the chain is cloned first if it is still shared with a frozen
    /// generation, so snapshots are never mutated in place.
    pub fn put(&mut self, key: Bytes, value: Value) {
        let bucket = self.bucket(&key);
        // Clones the chain iff a snapshot (or another handle) still
        // references it; otherwise mutates in place.
        let chain = Arc::make_mut(&mut self.table[bucket]);
        if let Some(entry) = chain.iter_mut().find(|e| e.key == key) {
            entry.value = value;
        } else {
            chain.push(Entry { key, value });
            self.size += 1;
        }
    }

    /// Looks up `key` in the current generation.
    ///
    /// Walks only the target bucket's chain; never clones, never mutates.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        let bucket = self.bucket(key);
        self.table[bucket]
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// An absent key is a normal not-found outcome and never forces a
    /// chain copy; membership is checked before the clone-if-shared step.
    pub fn remove(&mut self, key: &[u8]) -> Option<Value> {
        let bucket = self.bucket(key);
        let index = self.table[bucket].iter().position(|e| e.key == key)?;
        let chain = Arc::make_mut(&mut self.table[bucket]);
        let entry = chain.swap_remove(index);
        self.size -= 1;
        Some(entry.value)
    }

    /// Returns whether `key` is present in the current generation.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Freezes the current generation and returns its id.
    ///
    /// O(bucket count): clones the 64 chain handles into the history.
    /// The live table keeps aliasing every chain until a write copies it.
    pub fn snapshot(&mut self) -> GenerationId {
        self.snapshots.push(self.table.clone());
        self.snapshots.len() - 1
    }

    /// Looks up `key` through the frozen generation `gen`.
    ///
    /// Returns `None` for an unknown generation id as well as for an
    /// absent key.
    pub fn get_at(&self, gen: GenerationId, key: &[u8]) -> Option<&Value> {
        let frozen = self.snapshots.get(gen)?;
        frozen[self.bucket(key)]
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Number of frozen generations accumulated so far.
    pub fn generation_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Number of live entries in the current generation.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the current generation holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Iterates over the keys of the current generation, bucket order.
    pub fn keys(&self) -> impl Iterator<Item = &Bytes> {
        self.table.iter().flat_map(|chain| chain.iter().map(|e| &e.key))
    }

    /// Whether `bucket`'s live chain still physically aliases generation
    /// `gen` (i.e. no write has copied it since that snapshot).
    #[cfg(test)]
    fn shares_bucket_with(&self, gen: GenerationId, bucket: usize) -> bool {
        Arc::ptr_eq(&self.table[bucket], &self.snapshots[gen][bucket])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn sv(s: &str) -> Value {
        Value::Str(b(s))
    }

    #[test]
    fn test_put_get_roundtrip() {
        let mut table = Htree::new();
        table.put(b("a"), sv("one"));
        table.put(b("b"), sv("two"));

        assert_eq!(table.get(b"a"), Some(&sv("one")));
        assert_eq!(table.get(b"b"), Some(&sv("two")));
        assert_eq!(table.get(b"c"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_put_overwrites_in_place() {
        let mut table = Htree::new();
        table.put(b("a"), sv("one"));
        table.put(b("a"), sv("uno"));

        assert_eq!(table.get(b"a"), Some(&sv("uno")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_returns_value() {
        let mut table = Htree::new();
        table.put(b("a"), sv("one"));
        table.put(b("b"), sv("two"));

        assert_eq!(table.remove(b"b"), Some(sv("two")));
        assert_eq!(table.get(b"b"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_idempotent() {
        let mut table = Htree::new();
        table.put(b("a"), sv("one"));

        assert_eq!(table.remove(b"missing"), None);
        assert_eq!(table.remove(b"missing"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_colliding_keys_share_bucket() {
        // With 64 buckets, 256 distinct keys guarantee chains longer
        // than one entry; every key must stay reachable.
        let mut table = Htree::new();
        for i in 0..256 {
            table.put(b(&format!("key-{i}")), sv(&format!("val-{i}")));
        }
        assert_eq!(table.len(), 256);
        for i in 0..256 {
            assert_eq!(
                table.get(format!("key-{i}").as_bytes()),
                Some(&sv(&format!("val-{i}")))
            );
        }
    }

    #[test]
    fn test_snapshot_immutable_under_put() {
        let mut table = Htree::new();
        table.put(b("k"), sv("v1"));

        let gen = table.snapshot();
        table.put(b("k"), sv("v2"));
        table.put(b("new"), sv("x"));

        assert_eq!(table.get(b"k"), Some(&sv("v2")));
        assert_eq!(table.get_at(gen, b"k"), Some(&sv("v1")));
        assert_eq!(table.get_at(gen, b"new"), None);
    }

    #[test]
    fn test_snapshot_immutable_under_remove() {
        let mut table = Htree::new();
        table.put(b("k"), sv("v"));

        let gen = table.snapshot();
        assert_eq!(table.remove(b"k"), Some(sv("v")));

        assert_eq!(table.get(b"k"), None);
        assert_eq!(table.get_at(gen, b"k"), Some(&sv("v")));
    }

    #[test]
    fn test_untouched_buckets_stay_shared() {
        let mut table = Htree::new();
        for i in 0..64 {
            table.put(b(&format!("key-{i}")), sv("v"));
        }

        let gen = table.snapshot();

        // Reads must not break sharing.
        for i in 0..64 {
            let _ = table.get(format!("key-{i}").as_bytes());
        }
        for bucket in 0..BUCKET_COUNT {
            assert!(table.shares_bucket_with(gen, bucket));
        }

        // A single write unshares exactly one bucket.
        let written = table.bucket(b"key-0");
        table.put(b("key-0"), sv("changed"));
        for bucket in 0..BUCKET_COUNT {
            assert_eq!(table.shares_bucket_with(gen, bucket), bucket != written);
        }
    }

    #[test]
    fn test_multiple_generations() {
        let mut table = Htree::new();
        table.put(b("k"), sv("v1"));
        let g0 = table.snapshot();

        table.put(b("k"), sv("v2"));
        let g1 = table.snapshot();

        table.put(b("k"), sv("v3"));

        assert_eq!(table.get_at(g0, b"k"), Some(&sv("v1")));
        assert_eq!(table.get_at(g1, b"k"), Some(&sv("v2")));
        assert_eq!(table.get(b"k"), Some(&sv("v3")));
        assert_eq!(table.generation_count(), 2);
    }

    #[test]
    fn test_get_at_unknown_generation() {
        let table = Htree::new();
        assert_eq!(table.get_at(7, b"k"), None);
    }

    #[test]
    fn test_keys_match_inserted_set() {
        let mut table = Htree::new();
        table.put(b("a"), sv("1"));
        table.put(b("b"), sv("2"));
        table.put(b("c"), sv("3"));
        table.remove(b"b");

        let mut keys: Vec<_> = table.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec![b("a"), b("c")]);
    }

    #[test]
    fn test_fnv1a_reference_vectors() {
        // Published FNV-1a 32-bit test vectors.
        assert_eq!(fnv1a(b""), 0x811c9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(sv("x").type_name(), "string");
        assert_eq!(Value::List(Vec::new()).type_name(), "list");
        assert!(Value::List(Vec::new()).as_str().is_none());
    }
}
