//! Prefix Cache - a TTL cache with wildcard prefix scans
//!
//! Keys are sequences of terms. Each write indexes the key under every prefix
//! in a sorted set scored by expiry, so partial patterns such as
//! `[:session, _]` can be enumerated from a Redis-like store without a
//! sweeper process.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheKey, KeyPattern, PatternPart, Term};
pub use config::{CacheConfig, ServerConfig, WriteMode};
pub use error::{CacheError, Result};
pub use store::{Backend, MemoryBackend, RedisBackend};
pub use tasks::{spawn_expiry_task, spawn_write};
