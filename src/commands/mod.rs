//! Command Engine Module
//!
//! Receives tokenized requests, validates them against a static command
//! table, and executes them against the storage layer.
//!
//! ```text
//! Request (protocol)
//!       │
//!       ▼
//! ┌─────────────────┐
//! │     Cache       │  descriptor lookup, arity validation,
//! │  (this module)  │  handler dispatch
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Htree + LruIndex│  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `SET key value`, `GET key`, `APPEND key value`
//! - `INCR key`, `DECR key`
//! - `EXISTS key`, `DEL key [key ...]`
//! - `EVICT`, `SAVE`, `ECHO message`

pub mod engine;

// Re-export the engine types
pub use engine::{Cache, CommandError, CommandSpec};
