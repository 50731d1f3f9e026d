//! In-Memory Store Module
//!
//! A single-process store that speaks the same primitives as Redis: string
//! values and sorted sets, each with an optional millisecond expiry.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use super::{
    current_timestamp_ms, Backend, Command, Reply, ScanPage, StoredEntry, StoredValue, WRONGTYPE,
};
use crate::error::{CacheError, Result};

type OpResult<T> = std::result::Result<T, &'static str>;

/// Reply text for a scan cursor the store did not issue or no longer tracks
pub const INVALID_CURSOR: &str = "ERR invalid cursor";

/// Unfinished scans kept before the oldest cursors are forgotten
const MAX_OPEN_SCANS: usize = 1024;

/// Resume point of an unfinished sorted-set scan.
#[derive(Debug)]
struct OpenScan {
    index: String,
    after: String,
}

// == Memory Store ==
/// Key space of the in-memory backend.
///
/// Expired keys are invisible to every read and are dropped when a write
/// touches them or when [`MemoryStore::purge_expired`] runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, StoredEntry>,
    scans: BTreeMap<u64, OpenScan>,
    last_cursor: u64,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `key` if it exists and has not expired.
    fn live(&self, key: &str, now_ms: u64) -> Option<&StoredEntry> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now_ms))
    }

    fn evict_if_expired(&mut self, key: &str) {
        if self.entries.get(key).is_some_and(StoredEntry::is_expired) {
            self.entries.remove(key);
        }
    }

    // == Apply ==
    /// Executes one pipelined command and returns its reply.
    pub fn apply(&mut self, command: &Command) -> Reply {
        let outcome = match command {
            Command::Set { key, value, ttl_ms } => {
                self.set(key, value.clone(), Some(*ttl_ms));
                return Reply::Ok;
            }
            Command::Del { key } => Ok(self.del(key)),
            Command::SortedUpsert {
                index,
                member,
                score,
            } => self.zadd(index, member, *score),
            Command::SortedRemoveRange { index, min, max } => {
                self.zremrangebyscore(index, *min, *max)
            }
            Command::SortedRemoveMember { index, member } => self.zrem(index, member),
            Command::Expire { key, ttl_ms } => Ok(self.pexpire(key, *ttl_ms)),
        };

        match outcome {
            Ok(n) => Reply::Int(n),
            Err(msg) => Reply::Error(msg.to_string()),
        }
    }

    // == Set ==
    /// Unconditional upsert, replacing any previous value and type.
    pub fn set(&mut self, key: &str, value: Vec<u8>, ttl_ms: Option<u64>) {
        self.entries.insert(
            key.to_string(),
            StoredEntry::new(StoredValue::Bytes(value), ttl_ms),
        );
    }

    // == Get ==
    pub fn get(&self, key: &str) -> OpResult<Option<Vec<u8>>> {
        match self.live(key, current_timestamp_ms()) {
            None => Ok(None),
            Some(StoredEntry {
                value: StoredValue::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(WRONGTYPE),
        }
    }

    /// Batch lookup; keys of the wrong type read as absent, like `MGET`.
    pub fn mget(&self, keys: &[String]) -> Vec<Option<Vec<u8>>> {
        keys.iter().map(|key| self.get(key).ok().flatten()).collect()
    }

    // == Delete ==
    pub fn del(&mut self, key: &str) -> i64 {
        self.evict_if_expired(key);
        i64::from(self.entries.remove(key).is_some())
    }

    // == Expire ==
    /// Resets the TTL of an existing key. Returns 0 when the key is absent.
    pub fn pexpire(&mut self, key: &str, ttl_ms: u64) -> i64 {
        self.evict_if_expired(key);
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expire_in(ttl_ms);
                1
            }
            None => 0,
        }
    }

    // == Sorted Sets ==
    /// Inserts or re-scores a member. Returns 1 for a new member, 0 otherwise.
    pub fn zadd(&mut self, index: &str, member: &str, score: f64) -> OpResult<i64> {
        self.evict_if_expired(index);
        let entry = self
            .entries
            .entry(index.to_string())
            .or_insert_with(|| StoredEntry::new(StoredValue::Sorted(BTreeMap::new()), None));

        match &mut entry.value {
            StoredValue::Sorted(set) => {
                Ok(i64::from(set.insert(member.to_string(), score).is_none()))
            }
            StoredValue::Bytes(_) => Err(WRONGTYPE),
        }
    }

    /// Removes members scored within `[min, max]`. An emptied set is deleted.
    pub fn zremrangebyscore(&mut self, index: &str, min: f64, max: f64) -> OpResult<i64> {
        self.remove_members(index, |_, score| score >= min && score <= max)
    }

    pub fn zrem(&mut self, index: &str, member: &str) -> OpResult<i64> {
        self.remove_members(index, |candidate, _| candidate == member)
    }

    fn remove_members<F>(&mut self, index: &str, doomed: F) -> OpResult<i64>
    where
        F: Fn(&str, f64) -> bool,
    {
        self.evict_if_expired(index);
        let Some(entry) = self.entries.get_mut(index) else {
            return Ok(0);
        };

        let StoredValue::Sorted(set) = &mut entry.value else {
            return Err(WRONGTYPE);
        };

        let before = set.len();
        set.retain(|member, score| !doomed(member.as_str(), *score));
        let removed = before - set.len();

        if set.is_empty() {
            self.entries.remove(index);
        }
        Ok(removed as i64)
    }

    /// Cursor pagination over a sorted set in member order.
    ///
    /// A cursor resumes after the last member it returned, so every member
    /// present for the whole scan is returned even when others are removed
    /// between pages. `0` is returned once the set is exhausted.
    pub fn zscan(&mut self, index: &str, cursor: u64, count: usize) -> OpResult<ScanPage> {
        let after = match cursor {
            0 => None,
            id => match self.scans.remove(&id) {
                Some(open) if open.index == index => Some(open.after),
                _ => return Err(INVALID_CURSOR),
            },
        };

        let (members, more) = {
            let set = match self.live(index, current_timestamp_ms()) {
                None => return Ok(ScanPage::default()),
                Some(StoredEntry {
                    value: StoredValue::Sorted(set),
                    ..
                }) => set,
                Some(_) => return Err(WRONGTYPE),
            };

            let lower = match &after {
                Some(member) => Bound::Excluded(member.as_str()),
                None => Bound::Unbounded,
            };
            let mut remaining = set.range::<str, _>((lower, Bound::Unbounded));
            let members: Vec<(String, f64)> = remaining
                .by_ref()
                .take(count.max(1))
                .map(|(member, score)| (member.clone(), *score))
                .collect();
            (members, remaining.next().is_some())
        };

        let cursor = match members.last() {
            Some((last, _)) if more => self.open_scan(index, last),
            _ => 0,
        };
        Ok(ScanPage { cursor, members })
    }

    fn open_scan(&mut self, index: &str, after: &str) -> u64 {
        self.last_cursor = self.last_cursor.wrapping_add(1).max(1);
        self.scans.insert(
            self.last_cursor,
            OpenScan {
                index: index.to_string(),
                after: after.to_string(),
            },
        );
        while self.scans.len() > MAX_OPEN_SCANS {
            self.scans.pop_first();
        }
        self.last_cursor
    }

    // == Purge Expired ==
    /// Removes all expired keys. Returns the number of keys removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let entries = &self.entries;
        self.scans.retain(|_, open| entries.contains_key(&open.index));
        before - self.entries.len()
    }

    /// Number of keys held, including expired keys not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remaining TTL of a live key in milliseconds.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        self.live(key, current_timestamp_ms())
            .and_then(StoredEntry::ttl_remaining_ms)
    }

    /// Members of a live sorted set, for inspection.
    pub fn members(&self, index: &str) -> Vec<(String, f64)> {
        match self.live(index, current_timestamp_ms()) {
            Some(StoredEntry {
                value: StoredValue::Sorted(set),
                ..
            }) => set.iter().map(|(m, s)| (m.clone(), *s)).collect(),
            _ => Vec::new(),
        }
    }
}

// == Memory Backend ==
/// [`Backend`] over a shared [`MemoryStore`].
///
/// A pipeline runs entirely under one write lock, so batches are atomic with
/// respect to every other operation on the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle on the underlying store.
    pub fn store(&self) -> Arc<RwLock<MemoryStore>> {
        Arc::clone(&self.store)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn pipeline(&self, commands: &[Command]) -> Result<Vec<Reply>> {
        let mut store = self.store.write().await;
        let replies = commands.iter().map(|cmd| store.apply(cmd)).collect();
        trace!(commands = commands.len(), "memory pipeline applied");
        Ok(replies)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store.read().await;
        store.get(key).map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let store = self.store.read().await;
        Ok(store.mget(keys))
    }

    async fn remove_range_by_score(&self, index: &str, min: f64, max: f64) -> Result<u64> {
        let mut store = self.store.write().await;
        store
            .zremrangebyscore(index, min, max)
            .map(|removed| removed as u64)
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn sorted_scan(&self, index: &str, cursor: u64, count: usize) -> Result<ScanPage> {
        let mut store = self.store.write().await;
        store
            .zscan(index, cursor, count)
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}
