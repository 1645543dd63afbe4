//! Command Engine
//!
//! [`Cache`] composes one [`Htree`] and one [`LruIndex`] and exposes the
//! named commands. Dispatch goes through a statically built descriptor
//! table: each [`CommandSpec`] carries the command name, its arity, a
//! variadic flag and the handler function, and validation runs before the
//! handler body does - a request that fails arity checking never reaches
//! a handler.
//!
//! ```text
//! Request ──> lookup ──> validate arity ──> handler ──> Reply
//!               │             │
//!         unknown command   wrong number of arguments
//! ```
//!
//! Command names match case-insensitively. All faults are typed
//! [`CommandError`]s; none of them terminates the connection (that is the
//! tokenizer's privilege) and none panics the process.
//!
//! The engine holds the invariant that the Htree's current key set and
//! the LRU-tracked key set are equal between any two commands while
//! eviction is enabled.

use crate::protocol::{Reply, Request};
use crate::storage::{Htree, LruIndex, Value};
use bytes::Bytes;
use thiserror::Error;

/// Faults reported to the client as a single `ERR <message>` line.
///
/// The `Display` form is the `<message>` part; the connection handler
/// prefixes `ERR `.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Dispatch fault: no such command
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Dispatch fault: argument count does not match the descriptor
    #[error(
        "wrong number of arguments for '{name}': expected {}{expected}, received {received}",
        if *.variadic { "at least " } else { "" }
    )]
    WrongArity {
        name: &'static str,
        expected: usize,
        received: usize,
        variadic: bool,
    },

    /// Type-mismatch fault: the stored value is not a string
    #[error("wrong type for '{name}': key holds a {type_name} value")]
    WrongType {
        name: &'static str,
        type_name: &'static str,
    },

    /// Domain fault: arithmetic on non-numeric content
    #[error("value is not an integer or out of range")]
    NotAnInteger,

    /// Domain fault: the counter would leave the i64 range
    #[error("increment or decrement would overflow")]
    Overflow,

    /// Dispatch fault: EVICT on an instance built without eviction
    #[error("eviction is disabled")]
    EvictionDisabled,
}

/// Descriptor for one command: the dispatch table entry.
pub struct CommandSpec {
    /// Command name; matched case-insensitively.
    pub name: &'static str,
    /// Required argument count (minimum when `variadic`).
    pub arity: usize,
    /// Trailing arguments beyond `arity` are collected as a sequence.
    pub variadic: bool,
    handler: fn(&mut Cache, &[Bytes]) -> Result<Reply, CommandError>,
}

/// The dispatch table. Statically built; lookup is a linear scan, which
/// beats hashing at this size.
static COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "SET", arity: 2, variadic: false, handler: cmd_set },
    CommandSpec { name: "GET", arity: 1, variadic: false, handler: cmd_get },
    CommandSpec { name: "APPEND", arity: 2, variadic: false, handler: cmd_append },
    CommandSpec { name: "INCR", arity: 1, variadic: false, handler: cmd_incr },
    CommandSpec { name: "DECR", arity: 1, variadic: false, handler: cmd_decr },
    CommandSpec { name: "EXISTS", arity: 1, variadic: false, handler: cmd_exists },
    CommandSpec { name: "DEL", arity: 1, variadic: true, handler: cmd_del },
    CommandSpec { name: "EVICT", arity: 0, variadic: false, handler: cmd_evict },
    CommandSpec { name: "SAVE", arity: 0, variadic: false, handler: cmd_save },
    CommandSpec { name: "ECHO", arity: 1, variadic: false, handler: cmd_echo },
];

fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// The cache: a COW hash table plus an LRU recency index, driven by the
/// command table above.
///
/// Carries no internal synchronization; callers serialize access (the
/// server wraps it in a single mutex).
///
/// # Example
///
/// ```
/// use snapkv::commands::Cache;
/// use snapkv::protocol::{Reply, Request};
///
/// let mut cache = Cache::new();
/// let reply = cache.execute(&Request::parse(b"SET foo bar").unwrap()).unwrap();
/// assert_eq!(reply, Reply::Ok);
///
/// let reply = cache.execute(&Request::parse(b"GET foo").unwrap()).unwrap();
/// assert_eq!(reply, Reply::value("bar"));
/// ```
#[derive(Debug)]
pub struct Cache {
    htree: Htree,
    lru: LruIndex,
    eviction: bool,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Creates a cache with LRU eviction enabled (the server default).
    pub fn new() -> Self {
        Self {
            htree: Htree::new(),
            lru: LruIndex::new(),
            eviction: true,
        }
    }

    /// Creates a cache without recency tracking; `EVICT` is refused.
    pub fn without_eviction() -> Self {
        Self {
            eviction: false,
            ..Self::new()
        }
    }

    /// Validates `request` against the dispatch table and runs it.
    pub fn execute(&mut self, request: &Request) -> Result<Reply, CommandError> {
        let spec = lookup(&request.name)
            .ok_or_else(|| CommandError::UnknownCommand(request.name.clone()))?;

        let received = request.args.len();
        let valid = if spec.variadic {
            received >= spec.arity
        } else {
            received == spec.arity
        };
        if !valid {
            return Err(CommandError::WrongArity {
                name: spec.name,
                expected: spec.arity,
                received,
                variadic: spec.variadic,
            });
        }

        (spec.handler)(self, &request.args)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.htree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.htree.is_empty()
    }

    /// The underlying table, for direct reads of frozen generations.
    pub fn htree(&self) -> &Htree {
        &self.htree
    }

    fn touch(&mut self, key: Bytes) {
        if self.eviction {
            self.lru.touch(key);
        }
    }

    /// Fetches `key` as string content, distinguishing absence from a
    /// non-string tag.
    fn get_str(&self, name: &'static str, key: &[u8]) -> Result<Option<Bytes>, CommandError> {
        match self.htree.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .cloned()
                .map(Some)
                .ok_or(CommandError::WrongType {
                    name,
                    type_name: value.type_name(),
                }),
        }
    }
}

// ============================================================================
// Command handlers. Arity is already validated when these run.
// ============================================================================

/// SET key value
fn cmd_set(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    let (key, value) = (args[0].clone(), args[1].clone());
    cache.htree.put(key.clone(), Value::Str(value));
    cache.touch(key);
    Ok(Reply::Ok)
}

/// GET key
fn cmd_get(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    match cache.get_str("GET", &args[0])? {
        Some(value) => {
            cache.touch(args[0].clone());
            Ok(Reply::Value(value))
        }
        None => Ok(Reply::Nil),
    }
}

/// APPEND key value - behaves as SET when the key is absent
fn cmd_append(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    let key = args[0].clone();
    let suffix = &args[1];

    let combined = match cache.get_str("APPEND", &key)? {
        Some(existing) => {
            let mut buf = Vec::with_capacity(existing.len() + suffix.len());
            buf.extend_from_slice(&existing);
            buf.extend_from_slice(suffix);
            Bytes::from(buf)
        }
        None => suffix.clone(),
    };

    let new_len = combined.len();
    cache.htree.put(key.clone(), Value::Str(combined));
    cache.touch(key);
    Ok(Reply::Integer(new_len as i64))
}

/// Shared body of INCR and DECR. An absent key counts from 0; the result
/// is stored as its decimal text and returned as a bare value line.
fn arith(
    cache: &mut Cache,
    name: &'static str,
    key: &Bytes,
    delta: i64,
) -> Result<Reply, CommandError> {
    let current = match cache.get_str(name, key)? {
        Some(content) => std::str::from_utf8(&content)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(CommandError::NotAnInteger)?,
        None => 0,
    };

    let next = current.checked_add(delta).ok_or(CommandError::Overflow)?;
    let text = Bytes::from(next.to_string());
    cache.htree.put(key.clone(), Value::Str(text.clone()));
    cache.touch(key.clone());
    Ok(Reply::Value(text))
}

/// INCR key
fn cmd_incr(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    arith(cache, "INCR", &args[0], 1)
}

/// DECR key
fn cmd_decr(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    arith(cache, "DECR", &args[0], -1)
}

/// EXISTS key - membership only, does not touch recency
fn cmd_exists(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    let found = cache.htree.contains(&args[0]);
    Ok(Reply::Integer(i64::from(found)))
}

/// DEL key [key ...]
fn cmd_del(cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    let mut removed = 0i64;
    for key in args {
        if cache.htree.remove(key).is_some() {
            cache.lru.remove(key);
            removed += 1;
        }
    }
    Ok(Reply::Integer(removed))
}

/// EVICT - drop the least recently used key; no-op success when empty
fn cmd_evict(cache: &mut Cache, _args: &[Bytes]) -> Result<Reply, CommandError> {
    if !cache.eviction {
        return Err(CommandError::EvictionDisabled);
    }
    if let Some(victim) = cache.lru.victim().cloned() {
        // Removal participates in copy-on-write like any other mutation:
        // a victim in a snapshot-shared bucket forces that chain's copy.
        cache.htree.remove(&victim);
        cache.lru.remove(&victim);
    }
    Ok(Reply::Ok)
}

/// SAVE - freeze a copy-on-write snapshot of the current table
fn cmd_save(cache: &mut Cache, _args: &[Bytes]) -> Result<Reply, CommandError> {
    cache.htree.snapshot();
    Ok(Reply::Ok)
}

/// ECHO message
fn cmd_echo(_cache: &mut Cache, args: &[Bytes]) -> Result<Reply, CommandError> {
    Ok(Reply::Value(args[0].clone()))
}
