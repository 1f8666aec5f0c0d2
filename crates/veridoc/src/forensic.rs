//! Normalized forensic signal inputs.
//!
//! External forensic analyzers (copy-move detection, metadata anomaly
//! scoring, and the like) produce scores the trust calculator consumes
//! next to the cryptographic verdict. The engine only normalizes; the
//! weighted trust arithmetic lives outside it.

use serde::{Deserialize, Serialize};

/// Scores from an external forensic provider, each in `[0, 1]` where
/// higher means more suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForensicSignals {
    pub tamper_score: f64,
    pub manipulation_score: f64,
    pub anomaly_score: f64,
}

impl ForensicSignals {
    /// Clamp every score into `[0, 1]`. Non-finite inputs become 0.
    pub fn normalized(self) -> Self {
        Self {
            tamper_score: clamp_unit(self.tamper_score),
            manipulation_score: clamp_unit(self.manipulation_score),
            anomaly_score: clamp_unit(self.anomaly_score),
        }
    }
}

/// The inputs handed to the out-of-engine trust calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustInputs {
    /// The cryptographic verdict.
    pub signature_valid: bool,
    /// Normalized forensic scores, when a provider ran.
    pub forensics: Option<ForensicSignals>,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
