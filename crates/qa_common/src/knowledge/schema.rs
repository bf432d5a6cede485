//! Knowledge Store Schema
//!
//! Data structures for stored question/answer entries.

use crate::error::{QaError, Result};
use crate::tokenizer::CanonicalKeywords;
use serde::{Deserialize, Serialize};

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 2;

/// Longest accepted namespace id
pub const MAX_NAMESPACE_LEN: usize = 64;

/// A question/answer pair in one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique key inside the namespace
    pub question: String,
    /// Stored verbatim, escapes included
    pub answer: String,
    /// Canonical keywords of `question`
    pub keywords: CanonicalKeywords,
}

impl Entry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question = question.into();
        let keywords = crate::tokenizer::canonicalize(&question);
        Self {
            question,
            answer: answer.into(),
            keywords,
        }
    }
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    /// Question was new
    Inserted,
    /// Existing question had its answer replaced
    Replaced,
}

impl UpsertOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertOutcome::Inserted => "inserted",
            UpsertOutcome::Replaced => "replaced",
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted)
    }
}

/// Namespace ids name storage files: 1-64 chars of [A-Za-z0-9_-]
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let valid = !namespace.is_empty()
        && namespace.len() <= MAX_NAMESPACE_LEN
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(QaError::InvalidNamespace(namespace.to_string()))
    }
}
