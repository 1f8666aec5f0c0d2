//! Error types for the vault.

use thiserror::Error;

/// Errors that can occur during key management and signing.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Authentication tag check failed: tampered ciphertext, wrong nonce,
    /// or a different master key. Garbage key material is never returned.
    #[error("decryption failed: authentication tag mismatch")]
    Decryption,

    #[error("encryption failed")]
    Encryption,

    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("no key registered for tenant {0}")]
    KeyNotFound(String),

    /// The key repository collaborator could not be reached. Distinct from
    /// `KeyNotFound`: infrastructure failure is not a cryptographic verdict.
    #[error("key repository unavailable: {0}")]
    RepositoryUnavailable(String),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
