//! Backing Store Module
//!
//! The primitives the cache needs from a Redis-like store, abstracted behind
//! the [`Backend`] trait, with a Redis implementation and an in-process one.

mod entry;
mod memory;
mod redis_backend;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

pub use entry::{current_timestamp_ms, StoredEntry, StoredValue};
pub use memory::{MemoryBackend, MemoryStore};
pub use redis_backend::RedisBackend;

/// Reply text for commands run against a key of the wrong type
pub const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Latest absolute expiry, in Unix milliseconds, a `PX`/`PEXPIRE` accepts
pub const MAX_EXPIRY_MS: u64 = i64::MAX as u64;

// == Command ==
/// A mutation that can be submitted inside an atomic pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `SET key value PX ttl_ms`
    Set {
        key: String,
        value: Vec<u8>,
        ttl_ms: u64,
    },
    /// `DEL key`
    Del { key: String },
    /// `ZADD index score member`
    SortedUpsert {
        index: String,
        member: String,
        score: f64,
    },
    /// `ZREMRANGEBYSCORE index min max`, both bounds inclusive
    SortedRemoveRange { index: String, min: f64, max: f64 },
    /// `ZREM index member`
    SortedRemoveMember { index: String, member: String },
    /// `PEXPIRE key ttl_ms`
    Expire { key: String, ttl_ms: u64 },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Set { key, value, ttl_ms } => {
                write!(f, "SET {} <{} bytes> PX {}", key, value.len(), ttl_ms)
            }
            Command::Del { key } => write!(f, "DEL {}", key),
            Command::SortedUpsert {
                index,
                member,
                score,
            } => write!(f, "ZADD {} {} {}", index, score_arg(*score), member),
            Command::SortedRemoveRange { index, min, max } => write!(
                f,
                "ZREMRANGEBYSCORE {} {} {}",
                index,
                score_arg(*min),
                score_arg(*max)
            ),
            Command::SortedRemoveMember { index, member } => write!(f, "ZREM {} {}", index, member),
            Command::Expire { key, ttl_ms } => write!(f, "PEXPIRE {} {}", key, ttl_ms),
        }
    }
}

/// Renders a score the way Redis expects it on the wire.
pub fn score_arg(score: f64) -> String {
    if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if score == f64::INFINITY {
        "+inf".to_string()
    } else {
        score.to_string()
    }
}

// == Reply ==
/// Per-command reply of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Int(i64),
    Nil,
    Error(String),
    Other(String),
}

impl Reply {
    /// `OK` and integer replies are the only successful outcomes of a mutation.
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Ok | Reply::Int(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Int(n) => write!(f, "(integer) {}", n),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Error(msg) => write!(f, "(error) {}", msg),
            Reply::Other(raw) => write!(f, "{}", raw),
        }
    }
}

// == Scan Page ==
/// One round trip of a cursor-paginated sorted-set scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    /// Cursor for the next call, `0` when the scan is complete
    pub cursor: u64,
    /// `(member, score)` pairs of this page
    pub members: Vec<(String, f64)>,
}

// == Backend Trait ==
/// Backing store primitives used by the cache.
///
/// Implementations must execute [`Backend::pipeline`] atomically and return
/// exactly one reply per submitted command.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Short name for logs, e.g. "redis" or "memory".
    fn name(&self) -> &'static str;

    /// Submits all commands as one atomic batch.
    async fn pipeline(&self, commands: &[Command]) -> Result<Vec<Reply>>;

    /// Point lookup. `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Batch point lookup, one slot per requested key.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

    /// Removes every member of `index` scored within `[min, max]`.
    async fn remove_range_by_score(&self, index: &str, min: f64, max: f64) -> Result<u64>;

    /// Returns one page of `index` starting at `cursor` (`0` starts a scan).
    async fn sorted_scan(&self, index: &str, cursor: u64, count: usize) -> Result<ScanPage>;
}
