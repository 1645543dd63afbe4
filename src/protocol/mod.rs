//! Line Protocol
//!
//! snapkv speaks a line-oriented text protocol: one whitespace-tokenized
//! command per request line, one reply line per request.
//!
//! - [`line`]: request tokenization ([`Request`], [`ParseError`])
//! - [`reply`]: reply encoding ([`Reply`])
//!
//! ## Example
//!
//! ```
//! use snapkv::protocol::{Reply, Request};
//!
//! let req = Request::parse(b"SET name alice").unwrap();
//! assert_eq!(req.name, "SET");
//! assert_eq!(req.args.len(), 2);
//!
//! let mut out = Vec::new();
//! Reply::Ok.encode_line(&mut out);
//! assert_eq!(out, b"OK\n");
//! ```

pub mod line;
pub mod reply;

// Re-export commonly used types for convenience
pub use line::{ParseError, Request, MAX_LINE_LEN};
pub use reply::Reply;
