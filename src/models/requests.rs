//! Request DTOs for the cache HTTP API
//!
//! Defines the structure of incoming HTTP request bodies. Key parts are
//! tagged terms, e.g. `{"atom": "session"}`, `{"str": "abc"}`, `{"int": 1}`.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{CacheKey, KeyPattern, PatternPart, Term};
use crate::error::Result;

/// Request body for PUT /put
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The cache key parts
    pub key: Vec<Term>,
    /// Any JSON value
    pub value: Value,
}

impl PutRequest {
    /// Validates the key, returning it in cache form.
    pub fn cache_key(&self) -> Result<CacheKey> {
        CacheKey::new(self.key.clone())
    }
}

/// Request body for POST /get and POST /delete
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRequest {
    pub key: Vec<Term>,
}

impl KeyRequest {
    pub fn cache_key(&self) -> Result<CacheKey> {
        CacheKey::new(self.key.clone())
    }
}

/// Request body for POST /all; `null` entries are wildcards.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub pattern: Vec<Option<Term>>,
}

impl ScanRequest {
    pub fn key_pattern(&self) -> Result<KeyPattern> {
        KeyPattern::new(self.pattern.iter().cloned().map(PatternPart::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_request_deserialize() {
        let json = r#"{"key": [{"atom": "session"}, {"str": "abc"}], "value": {"user": 1}}"#;
        let req: PutRequest = serde_json::from_str(json).unwrap();

        let key = req.cache_key().unwrap();
        assert_eq!(key.parts(), &[Term::atom("session"), Term::from("abc")]);
        assert_eq!(req.value["user"], 1);
    }

    #[test]
    fn test_key_request_rejects_empty_key() {
        let req: KeyRequest = serde_json::from_str(r#"{"key": []}"#).unwrap();
        assert!(req.cache_key().is_err());
    }

    #[test]
    fn test_scan_request_wildcards() {
        let json = r#"{"pattern": [{"atom": "session"}, null]}"#;
        let req: ScanRequest = serde_json::from_str(json).unwrap();

        let pattern = req.key_pattern().unwrap();
        assert_eq!(
            pattern.parts(),
            &[PatternPart::Exact(Term::atom("session")), PatternPart::Any]
        );
    }

    #[test]
    fn test_unknown_term_tag_rejected() {
        let json = r#"{"key": [{"float": 1.5}]}"#;
        assert!(serde_json::from_str::<KeyRequest>(json).is_err());
    }
}
