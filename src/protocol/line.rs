//! Line Tokenizer
//!
//! Requests arrive one per line: whitespace-separated tokens, first token
//! the command name, the rest positional arguments. Tokenization is
//! byte-level - keys and values are opaque byte strings, so a token may
//! carry any bytes other than ASCII whitespace. There is no quoting or
//! escaping.
//!
//! Two faults exist at this layer. A blank line is reported to the client
//! and service continues, the same treatment an unknown command gets. An
//! oversized line is connection-fatal; the connection handler also bounds
//! the read itself, so a client streaming bytes without a newline can
//! never buffer more than the cap.

use bytes::Bytes;
use thiserror::Error;

/// Maximum accepted request line length (64 KiB).
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Errors that can occur while tokenizing a request line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line held no tokens at all
    #[error("empty command line")]
    EmptyLine,

    /// The line exceeds [`MAX_LINE_LEN`]
    #[error("request line too long: {size} bytes (max: {max})")]
    LineTooLong { size: usize, max: usize },
}

/// A tokenized request: command name plus positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The command name token (matching is case-insensitive). Non-UTF-8
    /// bytes survive lossily, which can only ever miss the dispatch
    /// lookup and report an unknown command.
    pub name: String,
    /// Remaining tokens, verbatim bytes, in order.
    pub args: Vec<Bytes>,
}

impl Request {
    /// Tokenizes one request line (without its trailing newline).
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        if line.len() > MAX_LINE_LEN {
            return Err(ParseError::LineTooLong {
                size: line.len(),
                max: MAX_LINE_LEN,
            });
        }

        let mut tokens = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|t| !t.is_empty());
        let name = tokens.next().ok_or(ParseError::EmptyLine)?;
        let name = String::from_utf8_lossy(name).into_owned();
        let args = tokens.map(Bytes::copy_from_slice).collect();

        Ok(Self { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_and_args() {
        let req = Request::parse(b"SET name alice").unwrap();
        assert_eq!(req.name, "SET");
        assert_eq!(req.args, vec![Bytes::from("name"), Bytes::from("alice")]);
    }

    #[test]
    fn test_parse_bare_command() {
        let req = Request::parse(b"SAVE").unwrap();
        assert_eq!(req.name, "SAVE");
        assert!(req.args.is_empty());
    }

    #[test]
    fn test_parse_collapses_runs_of_whitespace() {
        let req = Request::parse(b"  GET \t key  ").unwrap();
        assert_eq!(req.name, "GET");
        assert_eq!(req.args, vec![Bytes::from("key")]);
    }

    #[test]
    fn test_parse_keeps_binary_tokens_verbatim() {
        let req = Request::parse(b"SET k \xff\xfe\x00!").unwrap();
        assert_eq!(req.name, "SET");
        assert_eq!(
            req.args,
            vec![Bytes::from("k"), Bytes::from_static(b"\xff\xfe\x00!")]
        );
    }

    #[test]
    fn test_parse_trailing_carriage_return_is_whitespace() {
        let req = Request::parse(b"GET key\r").unwrap();
        assert_eq!(req.args, vec![Bytes::from("key")]);
    }

    #[test]
    fn test_parse_empty_line_is_fault() {
        assert_eq!(Request::parse(b""), Err(ParseError::EmptyLine));
        assert_eq!(Request::parse(b"   \t "), Err(ParseError::EmptyLine));
    }

    #[test]
    fn test_parse_oversized_line_is_fault() {
        let mut line = b"SET k ".to_vec();
        line.extend(std::iter::repeat(b'v').take(MAX_LINE_LEN));
        assert!(matches!(
            Request::parse(&line),
            Err(ParseError::LineTooLong { .. })
        ));
    }
}
