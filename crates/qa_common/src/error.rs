//! Error types for the QA engine.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage access timed out after {0:?}")]
    Timeout(Duration),

    #[error("Knowledge base is disabled for namespace {0}")]
    Disabled(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QaError {
    pub fn code(&self) -> i32 {
        match self {
            QaError::Storage(_) => -32010,
            QaError::Io(_) => -32011,
            QaError::Json(_) => -32700,
            QaError::Timeout(_) => -32012,
            QaError::Disabled(_) => -32013,
            QaError::InvalidInput(_) => -32602,
            QaError::Config(_) => -32014,
            QaError::InvalidNamespace(_) => -32015,
            QaError::Internal(_) => -32603,
        }
    }

    /// Failures of the backing medium (disk, SQLite, serialization)
    pub fn is_storage(&self) -> bool {
        matches!(self, QaError::Storage(_) | QaError::Io(_) | QaError::Json(_))
    }

    /// Contract violations that callers must not swallow
    pub fn is_fatal(&self) -> bool {
        matches!(self, QaError::InvalidNamespace(_) | QaError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
