//! Key/Prefix Model
//!
//! Cache keys, wildcard patterns, and the store keys derived from them.
//! Every function here that takes a key slice expects the namespaced form,
//! i.e. with the namespace term in first position.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::codec::{encode_key, Term};
use crate::error::{CacheError, Result};

/// Marker separating prefix index keys from value keys in one keyspace
pub const INDEX_MARKER: &str = "_index:";

// == Cache Key ==
/// Ordered, non-empty sequence of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Term>", into = "Vec<Term>")]
pub struct CacheKey(Vec<Term>);

impl CacheKey {
    pub fn new(parts: Vec<Term>) -> Result<Self> {
        if parts.is_empty() {
            return Err(CacheError::InvalidRequest(
                "cache key must have at least one part".to_string(),
            ));
        }
        Ok(Self(parts))
    }

    pub fn parts(&self) -> &[Term] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key with the namespace term prepended.
    pub fn namespaced(&self, namespace: &str) -> Vec<Term> {
        with_namespace(namespace, &self.0)
    }
}

impl TryFrom<Vec<Term>> for CacheKey {
    type Error = CacheError;

    fn try_from(parts: Vec<Term>) -> Result<Self> {
        Self::new(parts)
    }
}

impl From<CacheKey> for Vec<Term> {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_parts(f, self.0.iter())
    }
}

// == Key Pattern ==
/// One position of a [`KeyPattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternPart {
    /// Wildcard, matches exactly one part of any value
    Any,
    Exact(Term),
}

impl From<Term> for PatternPart {
    fn from(term: Term) -> Self {
        PatternPart::Exact(term)
    }
}

/// `None` is the wildcard.
impl From<Option<Term>> for PatternPart {
    fn from(term: Option<Term>) -> Self {
        term.map_or(PatternPart::Any, PatternPart::Exact)
    }
}

impl fmt::Display for PatternPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternPart::Any => write!(f, ":_"),
            PatternPart::Exact(term) => write!(f, "{}", term),
        }
    }
}

/// Key with zero or more wildcard positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern(Vec<PatternPart>);

impl KeyPattern {
    pub fn new(parts: Vec<PatternPart>) -> Result<Self> {
        if parts.is_empty() {
            return Err(CacheError::InvalidRequest(
                "key pattern must have at least one part".to_string(),
            ));
        }
        Ok(Self(parts))
    }

    pub fn parts(&self) -> &[PatternPart] {
        &self.0
    }

    /// Concrete parts before the first wildcard.
    ///
    /// A pattern without any wildcard scans from the namespace-only index, so
    /// its prefix is empty and the whole pattern acts as a filter.
    pub fn scan_prefix(&self) -> Vec<Term> {
        if !self.0.contains(&PatternPart::Any) {
            return Vec::new();
        }
        self.0
            .iter()
            .map_while(|part| match part {
                PatternPart::Exact(term) => Some(term.clone()),
                PatternPart::Any => None,
            })
            .collect()
    }

    /// The pattern with the namespace term prepended.
    pub fn namespaced(&self, namespace: &str) -> Vec<PatternPart> {
        std::iter::once(PatternPart::Exact(namespace_term(namespace)))
            .chain(self.0.iter().cloned())
            .collect()
    }
}

impl From<CacheKey> for KeyPattern {
    fn from(key: CacheKey) -> Self {
        Self(key.0.into_iter().map(PatternPart::Exact).collect())
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_parts(f, self.0.iter())
    }
}

fn write_parts<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    parts: impl Iterator<Item = T>,
) -> fmt::Result {
    write!(f, "[")?;
    for (i, part) in parts.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", part)?;
    }
    write!(f, "]")
}

// == Derived Store Keys ==
pub fn namespace_term(namespace: &str) -> Term {
    Term::Str(namespace.to_string())
}

pub fn with_namespace(namespace: &str, parts: &[Term]) -> Vec<Term> {
    let mut full = Vec::with_capacity(parts.len() + 1);
    full.push(namespace_term(namespace));
    full.extend_from_slice(parts);
    full
}

/// Every `(prefix, suffix)` split with both sides non-empty, shortest
/// prefix first. A key of `n` parts yields `n - 1` splits.
pub fn splits(full: &[Term]) -> impl Iterator<Item = (&[Term], &[Term])> {
    (1..full.len()).map(move |i| full.split_at(i))
}

pub fn index_key_for(prefix: &[Term]) -> Result<String> {
    Ok(format!("{}{}", INDEX_MARKER, encode_key(prefix)?))
}

pub fn value_key_for(full: &[Term]) -> Result<String> {
    encode_key(full)
}

/// Structural match: equal length, wildcards match any part, concrete parts
/// must be equal.
pub fn matches(pattern: &[PatternPart], key: &[Term]) -> bool {
    pattern.len() == key.len()
        && pattern.iter().zip(key).all(|(part, term)| match part {
            PatternPart::Any => true,
            PatternPart::Exact(expected) => expected == term,
        })
}
