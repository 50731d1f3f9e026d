//! Error types for the prefix cache
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Command Failure ==
/// A pipelined store command whose reply was neither `OK` nor an integer.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Human readable rendering of the command, e.g. `ZADD _index:... 17 ...`
    pub command: String,
    /// Reply returned by the store for that command
    pub reply: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.command, self.reply)
    }
}

// == Cache Error Enum ==
/// Unified error type for the prefix cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A write was attempted without a configured TTL
    #[error("Configuration error: ttl is required for cache writes")]
    MissingTtl,

    /// The configured TTL does not fit a store expiry
    #[error("Configuration error: ttl of {0} is out of range")]
    InvalidTtl(String),

    /// One or more commands of an atomic batch reported an unexpected reply.
    /// The store has no rollback, so the cache state is indeterminate.
    #[error("Pipeline failed, cache state is indeterminate: {}", join_failures(.0))]
    Pipeline(Vec<CommandFailure>),

    /// A stored key segment or value could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A key part or value could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Transport or connection failure talking to the backing store
    #[error("Backend error: {0}")]
    Backend(String),

    /// Key not found (HTTP layer only, `get` itself returns `None`)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn join_failures(failures: &[CommandFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::MissingTtl | CacheError::InvalidTtl(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Backend(_) | CacheError::Pipeline(_) => StatusCode::BAD_GATEWAY,
            CacheError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the prefix cache.
pub type Result<T> = std::result::Result<T, CacheError>;
