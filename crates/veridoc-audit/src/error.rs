//! Error types for the audit trail.

use thiserror::Error;

/// Errors that can occur while writing or reading the audit chain.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The audit store could not be reached. Callers must not treat this
    /// as an empty chain.
    #[error("audit store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("failed to serialize audit entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;
