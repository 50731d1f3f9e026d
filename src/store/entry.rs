//! Stored Entry Module
//!
//! Defines the structure for individual in-memory store entries with
//! millisecond expiry support.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

// == Stored Value ==
/// Payload of a store key: a plain string value or a sorted set.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    /// Binary-safe string value (`SET`/`GET`)
    Bytes(Vec<u8>),
    /// Sorted set, member -> score (`ZADD`/`ZSCAN`)
    Sorted(BTreeMap<String, f64>),
}

// == Stored Entry ==
/// Represents a single store key with its payload and expiry.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The stored payload
    pub value: StoredValue,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates a new entry with an optional TTL in milliseconds.
    pub fn new(value: StoredValue, ttl_ms: Option<u64>) -> Self {
        Self {
            value,
            expires_at: ttl_ms.map(|ttl| current_timestamp_ms().saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(expires) if now_ms >= expires)
    }

    /// Resets the TTL relative to now.
    pub fn expire_in(&mut self, ttl_ms: u64) {
        self.expires_at = Some(current_timestamp_ms().saturating_add(ttl_ms));
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
