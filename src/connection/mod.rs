//! Connection Layer
//!
//! Each accepted client is served by its own async task running a
//! read-execute-respond loop against the shared cache. Concurrency is
//! bounded by an admission semaphore owned by the accept loop: a permit
//! is taken before the next `accept`, and a connection task holds its
//! permit until the client disconnects.
//!
//! ```text
//! accept loop ──acquire permit──> accept() ──spawn──> ConnectionHandler
//!       ▲                                                    │
//!       └───────────── permit released on disconnect ────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use snapkv::commands::Cache;
//! use snapkv::connection::{handle_connection, ConnectionStats};
//! use std::sync::{Arc, Mutex};
//! use tokio::sync::Semaphore;
//!
//! let cache = Arc::new(Mutex::new(Cache::new()));
//! let stats = Arc::new(ConnectionStats::new());
//! let limiter = Arc::new(Semaphore::new(snapkv::POOL_SIZE));
//!
//! loop {
//!     let permit = limiter.clone().acquire_owned().await?;
//!     let (stream, addr) = listener.accept().await?;
//!     tokio::spawn(handle_connection(
//!         stream, addr, cache.clone(), stats.clone(), permit,
//!     ));
//! }
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
