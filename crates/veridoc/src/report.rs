//! Verification outcomes.

use veridoc_codec::CredentialPayload;

/// Terminal state of the verification pipeline.
///
/// Each stage of decode → parse → issuer lookup → signature check either
/// advances or stops in its own named state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// No scannable credential anywhere on the page.
    NotFound,
    /// A credential was found but its content is unreadable or matches
    /// no known shape.
    PayloadInvalid,
    /// The payload names an issuer with no registered key.
    IssuerUnknown,
    /// The signature does not verify under the issuer's key.
    SignatureInvalid,
    Verified,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// The full answer to "is this document authentic?".
///
/// Verification is a query: it always produces a report with whatever
/// diagnostics each stage managed to gather before stopping.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub outcome: VerificationOutcome,
    /// The normalized payload, when parsing got that far.
    pub payload: Option<CredentialPayload>,
    /// Hash of the presented file, when one was supplied. This is the
    /// post-stamp hash and is expected to differ from the payload's
    /// pre-stamp hash.
    pub presented_file_hash: Option<String>,
    /// First characters of the signature, for display and logs.
    pub signature_prefix: Option<String>,
    /// Human-readable detail for the terminal state.
    pub detail: String,
}

impl VerificationReport {
    pub(crate) fn terminal(outcome: VerificationOutcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            payload: None,
            presented_file_hash: None,
            signature_prefix: None,
            detail: detail.into(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.outcome.is_verified()
    }
}
