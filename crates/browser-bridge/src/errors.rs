//! Error types for the browser session contract

use thiserror::Error;

/// Errors surfaced by a browser session collaborator
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Handle does not refer to a live node
    #[error("Unknown control: {0}")]
    UnknownControl(String),

    /// Query could not be executed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Apply operation (click/fill/select) failed
    #[error("Apply failed: {0}")]
    ApplyFailed(String),

    /// Collaborator-enforced timeout; treated as a non-match upstream
    #[error("Session timeout: {0}")]
    Timeout(String),
}

impl SessionError {
    /// Timeouts are treated as non-matches by the resolver, not faults.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout(_))
    }
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
