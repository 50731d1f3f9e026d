//! Response DTOs for the cache HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheKey, Term};

/// One record: response body of POST /get, and element of POST /all
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub key: Vec<Term>,
    pub value: Value,
}

impl EntryResponse {
    pub fn new(key: CacheKey, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /put
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    pub message: String,
    pub key: Vec<Term>,
}

impl PutResponse {
    pub fn new(key: CacheKey) -> Self {
        Self {
            message: format!("Key {} stored", key),
            key: key.into(),
        }
    }
}

/// Response body for POST /delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: Vec<Term>,
}

impl DeleteResponse {
    pub fn new(key: CacheKey) -> Self {
        Self {
            message: format!("Key {} deleted", key),
            key: key.into(),
        }
    }
}

/// Response body for POST /all
#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub count: usize,
    pub entries: Vec<EntryResponse>,
}

impl ScanResponse {
    pub fn new(entries: Vec<(CacheKey, Value)>) -> Self {
        let entries: Vec<EntryResponse> = entries
            .into_iter()
            .map(|(key, value)| EntryResponse::new(key, value))
            .collect();
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Backing store in use, "redis" or "memory"
    pub backend: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(backend: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            backend: backend.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session_key() -> CacheKey {
        CacheKey::new(vec![Term::atom("session"), Term::from("abc")]).unwrap()
    }

    #[test]
    fn test_entry_response_serialize() {
        let resp = EntryResponse::new(session_key(), json!({"user": 1}));
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["key"][0]["atom"], "session");
        assert_eq!(json["key"][1]["str"], "abc");
        assert_eq!(json["value"]["user"], 1);
    }

    #[test]
    fn test_put_response_message() {
        let resp = PutResponse::new(session_key());
        assert!(resp.message.contains(":session"));
        assert!(resp.message.contains("stored"));
    }

    #[test]
    fn test_scan_response_count() {
        let resp = ScanResponse::new(vec![
            (session_key(), json!(1)),
            (session_key(), json!(2)),
        ]);
        assert_eq!(resp.count, 2);
        assert_eq!(resp.entries.len(), 2);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy("memory");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("memory"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
