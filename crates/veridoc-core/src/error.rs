//! Error types for VeriDoc core primitives.

use thiserror::Error;

/// Errors that can occur in core hashing and tree operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("invalid page index: {0}")]
    InvalidPageIndex(usize),

    #[error("invalid byte range: {start}..{end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
