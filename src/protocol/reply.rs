//! Reply Encoding
//!
//! Every processed request yields exactly one reply line:
//!
//! ```text
//! OK                      success with nothing to report
//! <value>                 the bare value, e.g. from GET
//! (nil)                   absent-key sentinel
//! (integer) <n>           counts and lengths
//! ERR <message>           any reported fault
//! ```
//!
//! [`Reply`] covers the success forms; fault lines are encoded from the
//! error types' `Display` impls by the connection handler.

use bytes::Bytes;
use std::fmt;

/// A successful command result, ready for textual encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK`
    Ok,
    /// A bare value line (binary-safe; encoded verbatim)
    Value(Bytes),
    /// `(nil)` - the absent-key sentinel
    Nil,
    /// `(integer) <n>`
    Integer(i64),
}

impl Reply {
    /// Convenience constructor for a value reply.
    pub fn value(data: impl Into<Bytes>) -> Self {
        Reply::Value(data.into())
    }

    /// Appends this reply's wire line (newline-terminated) to `buf`.
    pub fn encode_line(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Ok => buf.extend_from_slice(b"OK"),
            Reply::Value(data) => buf.extend_from_slice(data),
            Reply::Nil => buf.extend_from_slice(b"(nil)"),
            Reply::Integer(n) => {
                buf.extend_from_slice(b"(integer) ");
                buf.extend_from_slice(n.to_string().as_bytes());
            }
        }
        buf.push(b'\n');
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Value(data) => write!(f, "{}", String::from_utf8_lossy(data)),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(reply: &Reply) -> Vec<u8> {
        let mut buf = Vec::new();
        reply.encode_line(&mut buf);
        buf
    }

    #[test]
    fn test_ok_line() {
        assert_eq!(line(&Reply::Ok), b"OK\n");
    }

    #[test]
    fn test_value_line() {
        assert_eq!(line(&Reply::value("barbaz")), b"barbaz\n");
    }

    #[test]
    fn test_nil_line() {
        assert_eq!(line(&Reply::Nil), b"(nil)\n");
    }

    #[test]
    fn test_integer_line() {
        assert_eq!(line(&Reply::Integer(6)), b"(integer) 6\n");
        assert_eq!(line(&Reply::Integer(-3)), b"(integer) -3\n");
    }

    #[test]
    fn test_display_matches_wire_form() {
        assert_eq!(Reply::Integer(1).to_string(), "(integer) 1");
        assert_eq!(Reply::Nil.to_string(), "(nil)");
    }
}
