//! Cache Client Module
//!
//! Write, read and delete paths of the prefix-indexed cache.

use std::slice;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::codec::{decode_value, encode_key, encode_value, Term};
use super::key::{index_key_for, splits, value_key_for, CacheKey};
use crate::config::{CacheConfig, WriteMode};
use crate::error::{CacheError, CommandFailure, Result};
use crate::store::{current_timestamp_ms, Backend, Command, Reply, MAX_EXPIRY_MS};
use crate::tasks::spawn_write;

// == Cache ==
/// Prefix-indexed TTL cache over a [`Backend`].
///
/// The cache holds no state of its own beyond its configuration; clones
/// share the backend.
#[derive(Clone)]
pub struct Cache {
    pub(super) backend: Arc<dyn Backend>,
    pub(super) config: CacheConfig,
}

impl Cache {
    // == Constructor ==
    pub fn new(backend: Arc<dyn Backend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// A cache over the same backend with different settings.
    pub fn with_config(&self, config: CacheConfig) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config,
        }
    }

    // == Put ==
    /// Stores one record and indexes it under every prefix of its key.
    pub async fn put<V>(&self, key: &CacheKey, value: &V) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let commands = self.write_batch(&[(key, value)])?;
        self.submit(commands).await
    }

    /// Stores several records in one atomic batch.
    pub async fn put_many<V: Serialize>(&self, records: &[(CacheKey, V)]) -> Result<()> {
        let borrowed: Vec<(&CacheKey, &V)> = records.iter().map(|(k, v)| (k, v)).collect();
        let commands = self.write_batch(&borrowed)?;
        self.submit(commands).await
    }

    fn write_batch<V>(&self, records: &[(&CacheKey, &V)]) -> Result<Vec<Command>>
    where
        V: Serialize + ?Sized,
    {
        let ttl_ms = self.ttl_ms()?;
        let now = current_timestamp_ms();

        let mut commands = Vec::new();
        for (key, value) in records {
            let full = key.namespaced(&self.config.namespace);
            commands.extend(write_commands(&full, encode_value(*value)?, ttl_ms, now)?);
        }
        debug!(
            records = records.len(),
            commands = commands.len(),
            namespace = %self.config.namespace,
            "cache write batch built"
        );
        Ok(commands)
    }

    /// TTL in milliseconds; a missing or zero TTL is a configuration error.
    fn ttl_ms(&self) -> Result<u64> {
        match self.config.ttl {
            Some(ttl) if !ttl.is_zero() => u64::try_from(ttl.as_millis())
                .map(|ms| ms.max(1))
                .map_err(|_| CacheError::InvalidTtl(format!("{:?}", ttl))),
            _ => Err(CacheError::MissingTtl),
        }
    }

    async fn submit(&self, commands: Vec<Command>) -> Result<()> {
        match self.config.writes {
            WriteMode::Sync => execute(self.backend.as_ref(), &commands).await,
            WriteMode::Async => {
                spawn_write(Arc::clone(&self.backend), commands);
                Ok(())
            }
        }
    }

    // == Get ==
    /// Point lookup. `Ok(None)` when the record does not exist or expired.
    pub async fn get<V: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<V>> {
        let value_key = value_key_for(&key.namespaced(&self.config.namespace))?;

        match self.backend.get(&value_key).await? {
            Some(bytes) => {
                debug!(key = %key, "cache hit");
                decode_value(&bytes).map(Some)
            }
            None => {
                debug!(key = %key, "cache miss");
                Ok(None)
            }
        }
    }

    // == Delete ==
    /// Removes the value and its deepest index membership.
    pub async fn delete(&self, key: &CacheKey) -> Result<()> {
        let commands = delete_commands(&key.namespaced(&self.config.namespace))?;
        execute(self.backend.as_ref(), &commands).await?;
        debug!(key = %key, "cache entry deleted");
        Ok(())
    }
}

// == Command Builders ==
/// Value write plus, for each prefix split: sweep, upsert, index TTL refresh.
pub fn write_commands(full: &[Term], value: Vec<u8>, ttl_ms: u64, now: u64) -> Result<Vec<Command>> {
    let expires_at = now
        .checked_add(ttl_ms)
        .filter(|at| *at <= MAX_EXPIRY_MS)
        .ok_or_else(|| CacheError::InvalidTtl(format!("{}ms", ttl_ms)))? as f64;

    let mut commands = Vec::with_capacity(1 + 3 * full.len().saturating_sub(1));
    commands.push(Command::Set {
        key: value_key_for(full)?,
        value,
        ttl_ms,
    });

    for (prefix, suffix) in splits(full) {
        let index = index_key_for(prefix)?;
        commands.push(Command::SortedRemoveRange {
            index: index.clone(),
            min: f64::NEG_INFINITY,
            max: now as f64,
        });
        commands.push(Command::SortedUpsert {
            index: index.clone(),
            member: encode_key(suffix)?,
            score: expires_at,
        });
        commands.push(Command::Expire { key: index, ttl_ms });
    }
    Ok(commands)
}

/// Removes the last part from the index of all preceding parts, then the
/// value. A single-part key has no index membership.
pub fn delete_commands(full: &[Term]) -> Result<Vec<Command>> {
    let mut commands = Vec::with_capacity(2);
    if let Some((last, prefix)) = full.split_last() {
        if !prefix.is_empty() {
            commands.push(Command::SortedRemoveMember {
                index: index_key_for(prefix)?,
                member: encode_key(slice::from_ref(last))?,
            });
        }
    }
    commands.push(Command::Del {
        key: value_key_for(full)?,
    });
    Ok(commands)
}

// == Execution ==
/// Runs a batch and fails if any command did not reply `OK` or an integer.
pub async fn execute(backend: &dyn Backend, commands: &[Command]) -> Result<()> {
    if commands.is_empty() {
        return Ok(());
    }

    let replies = backend.pipeline(commands).await?;
    check_replies(commands, &replies)
}

fn check_replies(commands: &[Command], replies: &[Reply]) -> Result<()> {
    let mut failures: Vec<CommandFailure> = commands
        .iter()
        .zip(replies)
        .filter(|(_, reply)| !reply.is_success())
        .map(|(command, reply)| CommandFailure {
            command: command.to_string(),
            reply: reply.to_string(),
        })
        .collect();

    failures.extend(
        commands
            .iter()
            .skip(replies.len())
            .map(|command| CommandFailure {
                command: command.to_string(),
                reply: "no reply".to_string(),
            }),
    );

    if failures.is_empty() {
        Ok(())
    } else {
        warn!(failed = failures.len(), total = commands.len(), "pipeline reported failures");
        Err(CacheError::Pipeline(failures))
    }
}
