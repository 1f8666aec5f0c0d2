//! Per-tenant signing facade.
//!
//! A [`TenantSigner`] is the decrypted, ready-to-use keypair for one
//! tenant. [`SignerCache`] loads signers from the key repository on first
//! use and keeps them for the life of the process. [`LegacySigner`] is the
//! single shared key used for tenants onboarded before per-tenant keys.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::VaultError;
use crate::keys::{Keypair, PublicKey, Signature};
use crate::repository::KeyRepository;
use crate::vault::KeyVault;

/// A loaded signer for one tenant.
///
/// Signs document fingerprints: the message is the UTF-8 bytes of the
/// lowercase hex string, not the raw digest, so the wire signature is
/// reproducible from the fingerprint alone.
pub struct TenantSigner {
    tenant_id: String,
    keypair: Keypair,
}

impl TenantSigner {
    /// Build a signer directly from a keypair. Mostly useful in tests;
    /// production loads go through [`TenantSigner::load`].
    pub fn new(tenant_id: impl Into<String>, keypair: Keypair) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            keypair,
        }
    }

    /// Load and decrypt a tenant's key from the repository.
    ///
    /// `Err(KeyNotFound)` means the tenant has no registered key;
    /// `Err(RepositoryUnavailable)` means the store failed and the caller
    /// must not treat the tenant as unknown.
    pub async fn load<R: KeyRepository + ?Sized>(
        tenant_id: &str,
        repository: &R,
        vault: &KeyVault,
    ) -> Result<Self, VaultError> {
        let material = repository
            .get(tenant_id)
            .await?
            .ok_or_else(|| VaultError::KeyNotFound(tenant_id.to_string()))?;

        let keypair =
            vault.decrypt_private_key(&material.encrypted_private_key, &material.key_nonce)?;

        debug!(tenant_id, "tenant signer loaded");
        Ok(Self {
            tenant_id: tenant_id.to_string(),
            keypair,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// Sign a hex fingerprint, returning the base64 wire signature.
    pub fn sign_fingerprint(&self, fingerprint_hex: &str) -> String {
        self.keypair.sign(fingerprint_hex.as_bytes()).to_base64()
    }

    /// Check a base64 wire signature against a hex fingerprint.
    ///
    /// Malformed base64 or wrong-length signatures are simply invalid;
    /// this never errors because a bad signature is a verdict, not a fault.
    pub fn verify_fingerprint(&self, fingerprint_hex: &str, signature_b64: &str) -> bool {
        let Ok(signature) = Signature::from_base64(signature_b64) else {
            return false;
        };
        self.keypair
            .public_key()
            .verify(fingerprint_hex.as_bytes(), &signature)
    }
}

// Keypair's Debug only shows the public key, so nothing secret leaks.
impl fmt::Debug for TenantSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantSigner({}, {:?})", self.tenant_id, self.keypair)
    }
}

/// Process-lifetime cache of loaded tenant signers.
///
/// First use of a tenant takes the load lock, hits the repository, and
/// decrypts; every later use is a read-lock map hit. The load lock is
/// held across the await so concurrent first uses decrypt exactly once.
pub struct SignerCache<R: KeyRepository + ?Sized> {
    vault: KeyVault,
    repository: Arc<R>,
    signers: RwLock<HashMap<String, Arc<TenantSigner>>>,
    load_lock: Mutex<()>,
}

impl<R: KeyRepository + ?Sized> SignerCache<R> {
    pub fn new(vault: KeyVault, repository: Arc<R>) -> Self {
        Self {
            vault,
            repository,
            signers: RwLock::new(HashMap::new()),
            load_lock: Mutex::new(()),
        }
    }

    /// Get the signer for a tenant, loading it on first use.
    pub async fn signer(&self, tenant_id: &str) -> Result<Arc<TenantSigner>, VaultError> {
        if let Some(signer) = self.cached(tenant_id)? {
            return Ok(signer);
        }

        let _guard = self.load_lock.lock().await;
        // Another task may have finished the load while we waited.
        if let Some(signer) = self.cached(tenant_id)? {
            return Ok(signer);
        }

        let signer = Arc::new(
            TenantSigner::load(tenant_id, self.repository.as_ref(), &self.vault).await?,
        );

        let mut signers = self
            .signers
            .write()
            .map_err(|_| VaultError::RepositoryUnavailable("lock poisoned".into()))?;
        signers.insert(tenant_id.to_string(), Arc::clone(&signer));
        Ok(signer)
    }

    /// Onboard a tenant: generate keys, store them, and cache the signer.
    pub async fn onboard(&self, tenant_id: &str) -> Result<Arc<TenantSigner>, VaultError> {
        let _guard = self.load_lock.lock().await;

        let material = self.vault.create_tenant_keys()?;
        self.repository.put(tenant_id, material.clone()).await?;

        let keypair = self
            .vault
            .decrypt_private_key(&material.encrypted_private_key, &material.key_nonce)?;
        let signer = Arc::new(TenantSigner::new(tenant_id, keypair));

        let mut signers = self
            .signers
            .write()
            .map_err(|_| VaultError::RepositoryUnavailable("lock poisoned".into()))?;
        signers.insert(tenant_id.to_string(), Arc::clone(&signer));
        Ok(signer)
    }

    fn cached(&self, tenant_id: &str) -> Result<Option<Arc<TenantSigner>>, VaultError> {
        let signers = self
            .signers
            .read()
            .map_err(|_| VaultError::RepositoryUnavailable("lock poisoned".into()))?;
        Ok(signers.get(tenant_id).cloned())
    }
}

/// Single shared signer for credentials issued before per-tenant keys.
///
/// Verification falls back to this key when a payload carries no issuer
/// or its issuer has no registered key.
pub struct LegacySigner {
    keypair: Keypair,
}

impl LegacySigner {
    /// Generate a fresh legacy key. Tests only; deployments derive it
    /// from configuration so it survives restarts.
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(seed),
        }
    }

    /// Parse the configured base64 seed.
    pub fn from_base64_seed(seed_b64: &str) -> Result<Self, VaultError> {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;

        let bytes = BASE64
            .decode(seed_b64)
            .map_err(|_| VaultError::InvalidKeyMaterial("legacy seed is not base64".into()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VaultError::InvalidKeyMaterial("legacy seed must be 32 bytes".into()))?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn sign_fingerprint(&self, fingerprint_hex: &str) -> String {
        self.keypair.sign(fingerprint_hex.as_bytes()).to_base64()
    }

    pub fn verify_fingerprint(&self, fingerprint_hex: &str, signature_b64: &str) -> bool {
        let Ok(signature) = Signature::from_base64(signature_b64) else {
            return false;
        };
        self.keypair
            .public_key()
            .verify(fingerprint_hex.as_bytes(), &signature)
    }
}
