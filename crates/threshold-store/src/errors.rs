//! Error types for the threshold store

use thiserror::Error;

/// Store error enumeration
#[derive(Debug, Error)]
pub enum StoreError {
    /// Snapshot file could not be read or written
    #[error("Persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// Snapshot content was not valid JSON
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(#[from] serde_json::Error),

    /// Record violates a store invariant
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
