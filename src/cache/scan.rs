//! Pattern Scan
//!
//! Resolves a wildcard pattern to one prefix index, sweeps its expired
//! members, pages through it and joins the matching keys to their values.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::Cache;
use super::codec::{decode_key, decode_value, Term};
use super::key::{
    index_key_for, matches, value_key_for, with_namespace, CacheKey, KeyPattern, PatternPart,
};
use crate::error::Result;
use crate::store::current_timestamp_ms;

impl Cache {
    // == All ==
    /// Returns every live `(key, value)` pair matching `pattern`.
    ///
    /// The result is a snapshot in store scan order. Index members whose
    /// value has already expired or been deleted are skipped.
    pub async fn all<V: DeserializeOwned>(&self, pattern: &KeyPattern) -> Result<Vec<(CacheKey, V)>> {
        let namespace = &self.config.namespace;
        let full_pattern = pattern.namespaced(namespace);
        let prefix = with_namespace(namespace, &pattern.scan_prefix());
        let index = index_key_for(&prefix)?;

        let now = current_timestamp_ms() as f64;
        let swept = self
            .backend
            .remove_range_by_score(&index, f64::NEG_INFINITY, now)
            .await?;

        let keys = self.matching_keys(&index, &prefix, &full_pattern, now).await?;
        if keys.is_empty() {
            debug!(pattern = %pattern, swept, "pattern scan matched nothing");
            return Ok(Vec::new());
        }

        let value_keys = keys
            .iter()
            .map(|full| value_key_for(full))
            .collect::<Result<Vec<_>>>()?;
        let values = self.backend.mget(&value_keys).await?;

        let mut results = Vec::with_capacity(keys.len());
        for (mut full, value) in keys.into_iter().zip(values) {
            let Some(bytes) = value else {
                continue;
            };
            full.remove(0);
            results.push((CacheKey::new(full)?, decode_value(&bytes)?));
        }

        debug!(
            pattern = %pattern,
            swept,
            matched = results.len(),
            "pattern scan complete"
        );
        Ok(results)
    }

    /// Pages through `index` until the cursor wraps, returning the full
    /// (namespaced) keys that match `full_pattern`.
    async fn matching_keys(
        &self,
        index: &str,
        prefix: &[Term],
        full_pattern: &[PatternPart],
        now: f64,
    ) -> Result<Vec<Vec<Term>>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor = 0;
        let mut rounds = 0usize;

        loop {
            let page = self
                .backend
                .sorted_scan(index, cursor, self.config.scan_count)
                .await?;
            rounds += 1;

            for (member, score) in page.members {
                // A scan may yield a member twice; one key, one result.
                if score <= now || !seen.insert(member.clone()) {
                    continue;
                }

                let mut full = prefix.to_vec();
                full.extend(decode_key(&member)?);
                if matches(full_pattern, &full) {
                    keys.push(full);
                }
            }

            cursor = page.cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(index, rounds, candidates = seen.len(), "index scanned");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::store::MemoryBackend;
    use std::sync::Arc;
    use std::time::Duration;

    fn cache_with_scan_count(scan_count: usize) -> Cache {
        let config = CacheConfig::new(Duration::from_secs(60)).with_scan_count(scan_count);
        Cache::new(Arc::new(MemoryBackend::new()), config)
    }

    fn key(parts: Vec<Term>) -> CacheKey {
        CacheKey::new(parts).unwrap()
    }

    #[tokio::test]
    async fn test_scan_pages_through_large_index() {
        let cache = cache_with_scan_count(3);
        for i in 0..20 {
            cache
                .put(&key(vec![Term::atom("user"), Term::Int(i)]), &i)
                .await
                .unwrap();
        }

        let pattern = KeyPattern::new(vec![Term::atom("user").into(), PatternPart::Any]).unwrap();
        let mut found: Vec<i64> = cache
            .all::<i64>(&pattern)
            .await
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        found.sort();

        assert_eq!(found, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concrete_pattern_uses_namespace_index() {
        let cache = cache_with_scan_count(10);
        let k = key(vec![Term::atom("a"), Term::from("b")]);
        cache.put(&k, "v").await.unwrap();
        cache
            .put(&key(vec![Term::atom("a"), Term::from("c")]), "w")
            .await
            .unwrap();

        let found: Vec<(CacheKey, String)> = cache.all(&KeyPattern::from(k.clone())).await.unwrap();
        assert_eq!(found, vec![(k, "v".to_string())]);
    }

    #[tokio::test]
    async fn test_leading_wildcard() {
        let cache = cache_with_scan_count(10);
        cache
            .put(&key(vec![Term::atom("a"), Term::atom("x")]), &1)
            .await
            .unwrap();
        cache
            .put(&key(vec![Term::atom("b"), Term::atom("x")]), &2)
            .await
            .unwrap();
        cache
            .put(&key(vec![Term::atom("b"), Term::atom("y")]), &3)
            .await
            .unwrap();

        let pattern = KeyPattern::new(vec![PatternPart::Any, Term::atom("x").into()]).unwrap();
        let mut found: Vec<i32> = cache
            .all::<i32>(&pattern)
            .await
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        found.sort();

        assert_eq!(found, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let backend: Arc<dyn crate::store::Backend> = Arc::new(MemoryBackend::new());
        let ttl = Duration::from_secs(60);
        let left = Cache::new(Arc::clone(&backend), CacheConfig::new(ttl).with_namespace("left"));
        let right = Cache::new(backend, CacheConfig::new(ttl).with_namespace("right"));

        let k = key(vec![Term::atom("session"), Term::from("abc")]);
        left.put(&k, "l").await.unwrap();

        let pattern = KeyPattern::new(vec![Term::atom("session").into(), PatternPart::Any]).unwrap();
        assert_eq!(left.all::<String>(&pattern).await.unwrap().len(), 1);
        assert!(right.all::<String>(&pattern).await.unwrap().is_empty());
        assert_eq!(right.get::<String>(&k).await.unwrap(), None);
    }
}
