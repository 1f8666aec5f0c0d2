//! The engine: issuance and verification pipelines over the collaborators.

use std::path::Path;
use std::sync::Arc;

use tokio::task::spawn_blocking;
use tracing::{info, warn};

use veridoc_core::{hash_bytes, ChunkedHasher, CoreError, DocumentHash, MerkleTree, PageHash};
use veridoc_audit::{AuditChain, AuditStore, ChainReport, ChainScope};
use veridoc_codec::{
    decode_payload, render_qr, CodecError, CredentialPayload, DecodeConfig, EncodeOptions, Page,
    StampConfig,
};
use veridoc_vault::{
    KeyRepository, KeyVault, LegacySigner, PublicKey, Signature, SignerCache, VaultError,
};

use crate::error::{EngineError, Result};
use crate::forensic::{ForensicSignals, TrustInputs};
use crate::report::{VerificationOutcome, VerificationReport};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Secret the key-envelope master key is derived from.
    pub deployment_secret: String,
    pub stamp: StampConfig,
    pub decode: DecodeConfig,
    /// Issuer display name embedded in credentials.
    pub issuer_name: Option<String>,
    /// Base64 seed for the shared legacy key. When unset, legacy
    /// credentials terminate in `IssuerUnknown`.
    pub legacy_seed_b64: Option<String>,
}

impl EngineConfig {
    pub fn new(deployment_secret: impl Into<String>) -> Self {
        Self {
            deployment_secret: deployment_secret.into(),
            stamp: StampConfig::default(),
            decode: DecodeConfig::default(),
            issuer_name: None,
            legacy_seed_b64: None,
        }
    }
}

/// Everything produced by one issuance.
#[derive(Debug, Clone)]
pub struct IssuedDocument {
    pub document_id: String,
    pub tenant_id: String,
    /// Hex SHA-256 of the original file, the signed fingerprint.
    pub document_hash: String,
    pub page_hashes: Vec<PageHash>,
    /// Present only for multi-page documents.
    pub merkle_root: Option<String>,
    /// Base64 Ed25519 signature over the fingerprint hex.
    pub signature: String,
    /// The compact JSON carried by the stamped QR.
    pub wire_payload: String,
    /// Position of the issuance event in the tenant's audit chain.
    pub audit_position: u64,
}

/// The document integrity engine.
///
/// Ties the fingerprinting core, the key vault, the credential codec,
/// and the audit chain into the two pipelines deployments actually call:
/// [`Engine::issue`] and [`Engine::verify`].
pub struct Engine<K: KeyRepository, A: AuditStore> {
    repository: Arc<K>,
    signers: SignerCache<K>,
    legacy: Option<LegacySigner>,
    audit: AuditChain<A>,
    hasher: ChunkedHasher,
    config: EngineConfig,
}

impl<K: KeyRepository, A: AuditStore> Engine<K, A> {
    pub fn new(config: EngineConfig, repository: Arc<K>, audit_store: Arc<A>) -> Result<Self> {
        let vault = KeyVault::new(&config.deployment_secret);
        let legacy = match &config.legacy_seed_b64 {
            Some(seed) => Some(
                LegacySigner::from_base64_seed(seed)
                    .map_err(|e| EngineError::InvalidInput(format!("legacy seed: {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            signers: SignerCache::new(vault, Arc::clone(&repository)),
            repository,
            legacy,
            audit: AuditChain::new(audit_store),
            hasher: ChunkedHasher::new(),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audit(&self) -> &AuditChain<A> {
        &self.audit
    }

    /// Register a tenant: generate and store its keypair, record the
    /// onboarding event. Returns the tenant's public key hex.
    pub async fn onboard_tenant(&self, tenant_id: &str) -> Result<String> {
        let signer = self
            .signers
            .onboard(tenant_id)
            .await
            .map_err(|e| map_vault_error(e, tenant_id))?;
        let public_key = signer.public_key().to_hex();

        self.audit
            .record_tenant_onboarded(tenant_id, &public_key)
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        info!(tenant_id, "tenant onboarded");
        Ok(public_key)
    }

    /// Issue a credential for a document.
    ///
    /// Fingerprints the file, hashes each page, builds the Merkle root
    /// for multi-page documents, signs, renders the QR, stamps the first
    /// page, and records the issuance in the tenant's audit chain.
    #[allow(clippy::too_many_arguments)]
    pub async fn issue(
        &self,
        tenant_id: &str,
        document_id: &str,
        path: &Path,
        pages: &mut [Page],
        document_type: Option<&str>,
        subject_id: Option<&str>,
    ) -> Result<IssuedDocument> {
        if pages.is_empty() {
            return Err(EngineError::InvalidInput(
                "document has no pages to stamp".into(),
            ));
        }

        // Large uploads hash on the blocking pool so one file can't stall
        // unrelated requests on the executor thread.
        let document_hash = self.hash_file_off_thread(path).await??.to_hex();

        let page_hashes: Vec<PageHash> = pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                PageHash::new(index as u32 + 1, hash_bytes(page.rasterize(72).as_raw()))
            })
            .collect();

        let merkle_root = if page_hashes.len() > 1 {
            let leaves: Vec<String> = page_hashes.iter().map(|p| p.hash.clone()).collect();
            MerkleTree::build(leaves).root().map(str::to_string)
        } else {
            None
        };

        let signer = self
            .signers
            .signer(tenant_id)
            .await
            .map_err(|e| map_vault_error(e, tenant_id))?;
        let signature = signer.sign_fingerprint(&document_hash);

        let payload = CredentialPayload {
            document_id: document_id.to_string(),
            document_hash: document_hash.clone(),
            issuer_id: tenant_id.to_string(),
            signature: signature.clone(),
            merkle_root: merkle_root.clone(),
            credential_type: document_type.map(str::to_string),
        };
        let wire_payload = payload.to_wire_json(&EncodeOptions {
            issuer_name: self.config.issuer_name.clone(),
            credential_type: None,
        })?;

        let qr = render_qr(&wire_payload)?;
        pages[0].stamp(&qr, &self.config.stamp);

        let entry = self
            .audit
            .record_issuance(
                tenant_id,
                document_id,
                &document_hash,
                &signature,
                document_type,
                subject_id,
            )
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        info!(tenant_id, document_id, "document issued");
        Ok(IssuedDocument {
            document_id: document_id.to_string(),
            tenant_id: tenant_id.to_string(),
            document_hash,
            page_hashes,
            merkle_root,
            signature,
            wire_payload,
            audit_position: entry.chain_position,
        })
    }

    /// Verify a stamped page.
    ///
    /// Always returns a report for an expected failure; only collaborator
    /// unavailability is an `Err`. Every attempt is recorded in the audit
    /// chain.
    pub async fn verify(
        &self,
        page: &Page,
        presented_file: Option<&Path>,
    ) -> Result<VerificationReport> {
        // Decoding rasterizes and scans whole pages; that CPU work also
        // runs on the blocking pool.
        let decoded = {
            let page = page.clone();
            let decode_config = self.config.decode;
            spawn_blocking(move || decode_payload(&page, &decode_config))
                .await
                .map_err(|e| EngineError::Unavailable(format!("decode task failed: {e}")))?
        };
        let payload = match decoded {
            Ok(payload) => payload,
            Err(CodecError::DecodeNotFound) => {
                return self
                    .conclude(VerificationReport::terminal(
                        VerificationOutcome::NotFound,
                        "no credential found in document",
                    ))
                    .await;
            }
            Err(e @ (CodecError::DecodeUnreadable(_) | CodecError::PayloadMalformed(_))) => {
                return self
                    .conclude(VerificationReport::terminal(
                        VerificationOutcome::PayloadInvalid,
                        e.to_string(),
                    ))
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        let signature_prefix: String = payload.signature.chars().take(16).collect();
        let presented_file_hash = match presented_file {
            Some(path) => self
                .hash_file_off_thread(path)
                .await?
                .map(|h| h.to_hex())
                .map_err(|e| warn!(error = %e, "could not hash presented file"))
                .ok(),
            None => None,
        };

        let issuer_key = match self.issuer_public_key(&payload.issuer_id).await? {
            Some(key) => key,
            None => {
                return self
                    .conclude(VerificationReport {
                        outcome: VerificationOutcome::IssuerUnknown,
                        detail: format!("issuer {} not found", payload.issuer_id),
                        presented_file_hash,
                        signature_prefix: Some(signature_prefix),
                        payload: Some(payload),
                    })
                    .await;
            }
        };

        let signature_valid = match Signature::from_base64(&payload.signature) {
            Ok(signature) => issuer_key.verify(payload.document_hash.as_bytes(), &signature),
            Err(_) => false,
        };

        let (outcome, detail) = if signature_valid {
            (VerificationOutcome::Verified, "document verified".to_string())
        } else {
            (
                VerificationOutcome::SignatureInvalid,
                "signature verification failed".to_string(),
            )
        };

        self.conclude(VerificationReport {
            outcome,
            detail,
            presented_file_hash,
            signature_prefix: Some(signature_prefix),
            payload: Some(payload),
        })
        .await
    }

    /// Normalize forensic signals next to the crypto verdict for the
    /// external trust calculator.
    pub fn trust_inputs(
        &self,
        report: &VerificationReport,
        signals: Option<ForensicSignals>,
    ) -> TrustInputs {
        TrustInputs {
            signature_valid: report.is_verified(),
            forensics: signals.map(ForensicSignals::normalized),
        }
    }

    /// Walk an audit scope and report its integrity.
    pub async fn verify_audit_chain(
        &self,
        scope: &ChainScope,
        limit: usize,
    ) -> Result<ChainReport> {
        self.audit
            .verify_chain_integrity(scope, limit)
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))
    }

    /// Hash a file on the blocking pool.
    ///
    /// The outer error is a failed task; the inner result is the hash
    /// itself, left to the caller because issuance and verification treat
    /// an unreadable file differently.
    async fn hash_file_off_thread(
        &self,
        path: &Path,
    ) -> Result<std::result::Result<DocumentHash, CoreError>> {
        let hasher = self.hasher.clone();
        let path = path.to_path_buf();
        spawn_blocking(move || hasher.hash_file(&path))
            .await
            .map_err(|e| EngineError::Unavailable(format!("hashing task failed: {e}")))
    }

    /// Resolve the key that should have signed a payload.
    ///
    /// `Ok(None)` is "issuer unknown"; repository failure propagates so it
    /// can never masquerade as a cryptographic verdict.
    async fn issuer_public_key(&self, issuer_id: &str) -> Result<Option<PublicKey>> {
        if issuer_id == "legacy" {
            return Ok(self.legacy.as_ref().map(LegacySigner::public_key));
        }

        let material = self
            .repository
            .get(issuer_id)
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;
        let Some(material) = material else {
            return Ok(None);
        };

        PublicKey::from_hex(&material.public_key)
            .map(Some)
            .map_err(|e| EngineError::Unavailable(format!("stored key material invalid: {e}")))
    }

    /// Record the verification attempt and hand the report back.
    async fn conclude(&self, report: VerificationReport) -> Result<VerificationReport> {
        let tenant_id = report
            .payload
            .as_ref()
            .map(|p| p.issuer_id.as_str())
            .filter(|id| *id != "legacy");
        let document_hash = report.payload.as_ref().map(|p| p.document_hash.as_str());
        let failure_reason = (!report.is_verified()).then_some(report.detail.as_str());

        self.audit
            .record_verification(document_hash, report.is_verified(), tenant_id, failure_reason)
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        Ok(report)
    }
}

fn map_vault_error(error: VaultError, tenant_id: &str) -> EngineError {
    match error {
        VaultError::KeyNotFound(tenant) => EngineError::UnknownTenant(tenant),
        VaultError::RepositoryUnavailable(detail) => EngineError::Unavailable(detail),
        _ => EngineError::Signing(tenant_id.to_string()),
    }
}
