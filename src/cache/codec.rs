//! Term Codec
//!
//! Reversible encoding of key parts into store-safe strings, and of values
//! into bytes. Key parts are MessagePack-encoded and then base64url-encoded
//! without padding, so an encoded part never contains the `:` delimiter.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Separator between encoded key parts
pub const DELIMITER: char = ':';

// == Term ==
/// One part of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    /// Symbolic name, e.g. `session`
    Atom(String),
    Str(String),
    Int(i64),
    Bytes(Vec<u8>),
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, ":{}", name),
            Term::Str(s) => write!(f, "{:?}", s),
            Term::Int(n) => write!(f, "{}", n),
            Term::Bytes(bytes) => write!(f, "<<{} bytes>>", bytes.len()),
        }
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Str(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Str(s)
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Int(n)
    }
}

impl From<Vec<u8>> for Term {
    fn from(bytes: Vec<u8>) -> Self {
        Term::Bytes(bytes)
    }
}

// == Term Encoding ==
/// Encodes one term as a base64url segment.
pub fn encode(term: &Term) -> Result<String> {
    let bytes = rmp_serde::to_vec(term).map_err(|e| CacheError::Encode(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decodes one base64url segment back into a term.
pub fn decode(segment: &str) -> Result<Term> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| CacheError::Decode(format!("segment '{}': {}", segment, e)))?;
    rmp_serde::from_slice(&bytes)
        .map_err(|e| CacheError::Decode(format!("segment '{}': {}", segment, e)))
}

// == Key Encoding ==
/// Encodes every part and joins them with [`DELIMITER`].
pub fn encode_key(parts: &[Term]) -> Result<String> {
    let segments = parts.iter().map(encode).collect::<Result<Vec<_>>>()?;
    Ok(segments.join(&DELIMITER.to_string()))
}

/// Splits on [`DELIMITER`] and decodes each segment.
pub fn decode_key(encoded: &str) -> Result<Vec<Term>> {
    if encoded.is_empty() {
        return Err(CacheError::Decode("empty key".to_string()));
    }
    encoded.split(DELIMITER).map(decode).collect()
}

// == Value Encoding ==
pub fn encode_value<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| CacheError::Encode(e.to_string()))
}

pub fn decode_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<V> {
    rmp_serde::from_slice(bytes).map_err(|e| CacheError::Decode(e.to_string()))
}
