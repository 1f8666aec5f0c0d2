//! The key vault: master-key derivation and private-key envelopes.
//!
//! Private keys at rest are the 32-byte Ed25519 seed encrypted with
//! AES-256-GCM under a master key derived from the deployment secret.
//! Decryption fails closed on any tag mismatch.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::VaultError;
use crate::keys::Keypair;

/// AES-GCM nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// Domain-separation prefix for master-key derivation. Changing this
/// invalidates every envelope ever written.
const MASTER_KEY_DOMAIN: &[u8] = b"VeriDoc-KMS-v2";

/// An encrypted private key plus the nonce it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEnvelope {
    /// Base64 AES-256-GCM ciphertext (tag appended).
    pub ciphertext_b64: String,
    /// Base64 of the 12 random nonce bytes.
    pub nonce_b64: String,
}

/// The full key record stored by the key repository collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMaterial {
    /// Hex of the raw 32-byte Ed25519 public key.
    pub public_key: String,
    /// Base64 AES-256-GCM ciphertext of the private seed.
    pub encrypted_private_key: String,
    /// Base64 of the 12-byte nonce.
    pub key_nonce: String,
}

/// Generates tenant keypairs and seals/unseals their private seeds.
pub struct KeyVault {
    master_key: [u8; 32],
}

impl KeyVault {
    /// Create a vault from the deployment secret.
    ///
    /// The master key is a single domain-separated SHA-256 over the
    /// secret's bytes; the same secret always yields the same master key,
    /// so previously encrypted material stays decryptable.
    pub fn new(deployment_secret: &str) -> Self {
        Self {
            master_key: derive_master_key(deployment_secret),
        }
    }

    /// Generate a fresh Ed25519 keypair.
    pub fn generate_keypair(&self) -> Keypair {
        Keypair::generate()
    }

    /// Seal a private key: random 12-byte nonce, AES-256-GCM over the
    /// 32-byte seed, no associated data, both outputs base64.
    pub fn encrypt_private_key(&self, keypair: &Keypair) -> Result<KeyEnvelope, VaultError> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.master_key).map_err(|_| VaultError::Encryption)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);

        let seed = keypair.seed();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), seed.as_ref())
            .map_err(|_| VaultError::Encryption)?;

        Ok(KeyEnvelope {
            ciphertext_b64: BASE64.encode(ciphertext),
            nonce_b64: BASE64.encode(nonce),
        })
    }

    /// Unseal a private key.
    ///
    /// Any bit-level tampering of ciphertext or nonce, or a master key
    /// different from the one that sealed the envelope, fails the GCM tag
    /// check and returns `VaultError::Decryption`.
    pub fn decrypt_private_key(
        &self,
        ciphertext_b64: &str,
        nonce_b64: &str,
    ) -> Result<Keypair, VaultError> {
        let ciphertext = BASE64
            .decode(ciphertext_b64)
            .map_err(|_| VaultError::InvalidKeyMaterial("ciphertext is not base64".into()))?;
        let nonce = BASE64
            .decode(nonce_b64)
            .map_err(|_| VaultError::InvalidKeyMaterial("nonce is not base64".into()))?;

        if nonce.len() != NONCE_SIZE {
            return Err(VaultError::InvalidKeyMaterial(format!(
                "nonce must be {NONCE_SIZE} bytes, got {}",
                nonce.len()
            )));
        }

        let cipher =
            Aes256Gcm::new_from_slice(&self.master_key).map_err(|_| VaultError::Decryption)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| VaultError::Decryption)?;

        let seed: [u8; 32] = plaintext
            .try_into()
            .map_err(|_| VaultError::InvalidKeyMaterial("seed must be 32 bytes".into()))?;

        Ok(Keypair::from_seed(&seed))
    }

    /// Convenience composition for tenant onboarding: generate a keypair
    /// and seal it, returning the full repository record.
    pub fn create_tenant_keys(&self) -> Result<KeyMaterial, VaultError> {
        let keypair = self.generate_keypair();
        let envelope = self.encrypt_private_key(&keypair)?;

        Ok(KeyMaterial {
            public_key: keypair.public_key().to_hex(),
            encrypted_private_key: envelope.ciphertext_b64,
            key_nonce: envelope.nonce_b64,
        })
    }
}

/// Derive the 32-byte master key from the deployment secret.
pub fn derive_master_key(deployment_secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(MASTER_KEY_DOMAIN);
    hasher.update(deployment_secret.as_bytes());
    hasher.finalize().into()
}
