//! Error types for the docket active-document tracking system.

use thiserror::Error;

/// Errors surfaced by tracking, cleanup, and hook operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Query evaluation failed for predicate '{predicate}': {message}")]
    QueryFailed { predicate: String, message: String },

    #[error("Failed to resolve query expression '{expression}': {message}")]
    ResolveFailed { expression: String, message: String },

    #[error("Active list unavailable: {0}")]
    HostList(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TrackerError {
    /// Build a query failure for a predicate, preserving the engine's message.
    pub fn query_failed(predicate: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::QueryFailed {
            predicate: predicate.into(),
            message: message.into(),
        }
    }

    /// Build a resolution failure for a raw query expression.
    pub fn resolve_failed(expression: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::ResolveFailed {
            expression: expression.into(),
            message: message.into(),
        }
    }
}
