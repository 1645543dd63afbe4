//! # snapkv - An In-Memory Cache with Copy-on-Write Snapshots
//!
//! snapkv is a network-accessible, in-memory key-value cache with a
//! Redis-like command surface. Its storage core is a chained hash table
//! that supports point-in-time, copy-on-write snapshots with structural
//! sharing, composed with an LRU recency index for eviction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           snapkv                             │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐       │
//! │  │ TCP Server  │───>│ Connection  │───>│   Cache     │       │
//! │  │ (Listener)  │    │  Handler    │    │  (engine)   │       │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘       │
//! │        │                                      │              │
//! │        ▼                                      ▼              │
//! │  ┌─────────────┐                  ┌──────────────────────┐   │
//! │  │  Admission  │                  │  Htree  │  LruIndex  │   │
//! │  │  Semaphore  │                  │  (COW)  │  (recency) │   │
//! │  │ (4 permits) │                  └──────────────────────┘   │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! One command per line, whitespace-separated tokens, one reply line per
//! command:
//!
//! ```text
//! > SET name alice
//! OK
//! > GET name
//! alice
//! > INCR hits
//! 1
//! > GET missing
//! (nil)
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value` / `GET key` / `APPEND key value`
//! - `INCR key` / `DECR key`
//! - `EXISTS key` / `DEL key [key ...]`
//! - `EVICT` - drop the least-recently-used key
//! - `SAVE` - freeze a copy-on-write snapshot of the table
//! - `ECHO message`
//!
//! ## Module Overview
//!
//! - [`protocol`]: line tokenizer and textual reply encoding
//! - [`storage`]: the COW hash table (Htree) and the LRU index
//! - [`commands`]: the command engine composing both structures
//! - [`connection`]: per-client connection handling
//!
//! ## Design Highlights
//!
//! ### Copy-on-Write Snapshots
//!
//! `SAVE` freezes the current table in O(bucket count): it clones only the
//! 64 bucket-chain handles, not the chains. A later write to a bucket whose
//! chain is still shared with a frozen generation clones that single chain
//! first, so untouched buckets keep sharing storage with every snapshot.
//!
//! ### Single-Writer Cache
//!
//! The Htree and LRU index carry no internal synchronization. All command
//! execution is serialized through one mutex held by the connection layer;
//! the admission semaphore bounds how many connections are served at once.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{Cache, CommandError};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, Reply, Request};
pub use storage::{Htree, LruIndex, Value};

/// The default port snapkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host snapkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Number of connections served concurrently; further accepts wait
pub const POOL_SIZE: usize = 4;

/// Version of snapkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
