//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;

use crate::cache::Cache;
use crate::config::ServerConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, EntryResponse, HealthResponse, KeyRequest, PutRequest, PutResponse,
    ScanRequest, ScanResponse,
};
use crate::store::Backend;

/// Application state shared across all handlers.
///
/// The cache keeps no local state, so it is shared without a lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Creates an AppState over `backend` with settings from the Config.
    pub fn from_config(config: &ServerConfig, backend: Arc<dyn Backend>) -> Self {
        Self::new(Cache::new(backend, config.cache_config()))
    }
}

/// Handler for PUT /put
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    let key = req.cache_key()?;
    state.cache.put(&key, &req.value).await?;

    Ok(Json(PutResponse::new(key)))
}

/// Handler for POST /get
pub async fn get_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<EntryResponse>> {
    let key = req.cache_key()?;
    match state.cache.get::<Value>(&key).await? {
        Some(value) => Ok(Json(EntryResponse::new(key, value))),
        None => Err(CacheError::NotFound(key.to_string())),
    }
}

/// Handler for POST /delete
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<DeleteResponse>> {
    let key = req.cache_key()?;
    state.cache.delete(&key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /all
pub async fn all_handler(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanResponse>> {
    let pattern = req.key_pattern()?;
    let entries = state.cache.all::<Value>(&pattern).await?;

    Ok(Json(ScanResponse::new(entries)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.backend().name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Term;
    use crate::store::MemoryBackend;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::from_config(&ServerConfig::default(), Arc::new(MemoryBackend::new()))
    }

    fn session_key() -> Vec<Term> {
        vec![Term::atom("session"), Term::from("abc")]
    }

    #[tokio::test]
    async fn test_put_and_get_handler() {
        let state = test_state();

        let req = PutRequest {
            key: session_key(),
            value: json!({"user": 1}),
        };
        let result = put_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let req = KeyRequest { key: session_key() };
        let response = get_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.value, json!({"user": 1}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let req = KeyRequest { key: session_key() };
        let result = get_handler(State(test_state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();

        let req = PutRequest {
            key: session_key(),
            value: json!("v"),
        };
        put_handler(State(state.clone()), Json(req)).await.unwrap();

        let req = KeyRequest { key: session_key() };
        assert!(delete_handler(State(state.clone()), Json(req.clone())).await.is_ok());
        assert!(get_handler(State(state), Json(req)).await.is_err());
    }

    #[tokio::test]
    async fn test_all_handler() {
        let state = test_state();
        let req = PutRequest {
            key: session_key(),
            value: json!(1),
        };
        put_handler(State(state.clone()), Json(req)).await.unwrap();

        let req = ScanRequest {
            pattern: vec![Some(Term::atom("session")), None],
        };
        let response = all_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.entries[0].key, session_key());
    }

    #[tokio::test]
    async fn test_put_empty_key_rejected() {
        let req = PutRequest {
            key: Vec::new(),
            value: json!(1),
        };
        let result = put_handler(State(test_state()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.backend, "memory");
    }
}
