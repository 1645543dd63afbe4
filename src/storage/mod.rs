//! Storage Layer
//!
//! The two data structures the command engine composes:
//!
//! - [`Htree`]: a chained hash table over 64 fixed buckets with
//!   copy-on-write snapshots. Frozen generations share chain storage with
//!   the live table until a bucket is written.
//! - [`LruIndex`]: a doubly linked recency list over the same key set,
//!   supplying the eviction victim.
//!
//! Neither structure synchronizes internally; the connection layer
//! serializes all access through a single mutex.
//!
//! ## Example
//!
//! ```
//! use snapkv::storage::{Htree, Value};
//! use bytes::Bytes;
//!
//! let mut table = Htree::new();
//! table.put(Bytes::from("name"), Value::Str(Bytes::from("alice")));
//!
//! let gen = table.snapshot();
//! table.remove(b"name");
//!
//! assert!(table.get(b"name").is_none());
//! assert!(table.get_at(gen, b"name").is_some());
//! ```

pub mod htree;
pub mod lru;

// Re-export commonly used types
pub use htree::{GenerationId, Htree, Value, BUCKET_COUNT};
pub use lru::LruIndex;
