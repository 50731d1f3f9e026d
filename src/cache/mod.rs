//! Cache Module
//!
//! Prefix-indexed TTL cache: keys are sequences of terms, every prefix of a
//! written key gets a sorted index scored by expiry, and wildcard scans read
//! those indices back with lazy expiry.

mod client;
pub mod codec;
pub mod key;
mod scan;


// Re-export public types
pub use client::{delete_commands, execute, write_commands, Cache};
pub use codec::Term;
pub use key::{CacheKey, KeyPattern, PatternPart};
