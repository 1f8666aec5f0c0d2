//! Error types for the codec.

use thiserror::Error;

/// Errors from encoding, stamping, and decoding credentials.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload decoded but does not match any known wire shape, or
    /// is missing a required field.
    #[error("credential payload malformed: {0}")]
    PayloadMalformed(String),

    /// No QR code was found by any decode strategy.
    #[error("no credential found in document")]
    DecodeNotFound,

    /// A QR code was found but its content is not usable JSON.
    #[error("credential found but unreadable: {0}")]
    DecodeUnreadable(String),

    /// The payload does not fit in a QR code.
    #[error("qr render failed: {0}")]
    Render(#[from] qrcode::types::QrError),

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
