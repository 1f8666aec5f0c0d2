//! Error types for the engine.

use thiserror::Error;

/// Errors the engine can return.
///
/// Expected verification failures are not here: a document that fails
/// verification is a [`crate::VerificationReport`], not an error. Only
/// infrastructure faults and issuance-path failures surface as `Err`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A collaborator (key repository or audit store) could not be
    /// reached. Never collapsed into a verification verdict.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("no key registered for tenant {0}")]
    UnknownTenant(String),

    /// Key management failed during signing. Deliberately opaque; the
    /// cryptographic detail stays in the logs.
    #[error("signing failed for tenant {0}")]
    Signing(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] veridoc_core::CoreError),

    #[error(transparent)]
    Codec(#[from] veridoc_codec::CodecError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
