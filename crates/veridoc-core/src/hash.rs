//! Document fingerprints.
//!
//! Wraps SHA-256 digests with a strong type. On the wire a fingerprint is
//! always the 64-character lowercase hex form.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CoreError;

/// A 32-byte SHA-256 document fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentHash(pub [u8; 32]);

impl DocumentHash {
    /// Compute the SHA-256 fingerprint of the given data.
    pub fn hash(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(digest.into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The 64-character lowercase hex form used on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from the wire form. Accepts uppercase input but the value is
    /// normalized; anything that is not exactly 64 hex characters fails.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if s.len() != 64 {
            return Err(CoreError::InvalidFingerprint(s.to_string()));
        }
        let bytes =
            hex::decode(s).map_err(|_| CoreError::InvalidFingerprint(s.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Constant-time equality against another fingerprint.
    ///
    /// Used when comparing an attacker-supplied hex string against a
    /// recomputed digest.
    pub fn ct_eq(&self, other: &Self) -> bool {
        let mut diff = 0u8;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            diff |= a ^ b;
        }
        diff == 0
    }

    /// The zero fingerprint (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for DocumentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for DocumentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Fingerprint of a single document page, 1-indexed.
///
/// Produced once at issuance and immutable afterward. The hash is kept as
/// a string because Merkle leaves hash over the string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHash {
    /// 1-indexed page number.
    pub page_number: u32,
    /// Hex SHA-256 of the page content.
    pub hash: String,
}

impl PageHash {
    /// Create a page hash entry.
    pub fn new(page_number: u32, hash: impl Into<String>) -> Self {
        Self {
            page_number,
            hash: hash.into(),
        }
    }
}

/// One-shot SHA-256 of a byte slice, hex encoded.
pub fn hash_bytes(data: &[u8]) -> String {
    DocumentHash::hash(data).to_hex()
}

/// One-shot SHA-256 of a string's UTF-8 bytes, hex encoded.
pub fn hash_str(data: &str) -> String {
    hash_bytes(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let h1 = DocumentHash::hash(b"test data");
        let h2 = DocumentHash::hash(b"test data");
        assert_eq!(h1, h2);

        let h3 = DocumentHash::hash(b"different data");
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = DocumentHash::hash(b"roundtrip");
        let hex = h.to_hex();
        assert_eq!(hex.len(), 64);
        let recovered = DocumentHash::from_hex(&hex).unwrap();
        assert_eq!(h, recovered);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(DocumentHash::from_hex("abc").is_err());
        assert!(DocumentHash::from_hex(&"z".repeat(64)).is_err());
        assert!(DocumentHash::from_hex(&"a".repeat(63)).is_err());
    }

    #[test]
    fn test_ct_eq() {
        let a = DocumentHash::hash(b"x");
        let b = DocumentHash::hash(b"x");
        let c = DocumentHash::hash(b"y");
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
    }

    #[test]
    fn test_hash_str_matches_bytes() {
        assert_eq!(hash_str("hello"), hash_bytes(b"hello"));
    }

    #[test]
    fn test_distinct_inputs_never_collide() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for i in 0..1000u32 {
            let h = hash_bytes(&i.to_le_bytes());
            assert!(seen.insert(h));
        }
    }
}
