//! End-to-end issuance and verification.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use veridoc::{Engine, EngineConfig, EngineError, VerificationOutcome};
use veridoc_audit::{ChainScope, MemoryAuditStore};
use veridoc_codec::{render_qr, CredentialPayload, EncodeOptions, Page, StampConfig};
use veridoc_vault::{KeyMaterial, KeyRepository, LegacySigner, MemoryKeyRepository, VaultError};

fn engine() -> Engine<MemoryKeyRepository, MemoryAuditStore> {
    Engine::new(
        EngineConfig::new("test-deployment-secret"),
        Arc::new(MemoryKeyRepository::new()),
        Arc::new(MemoryAuditStore::new()),
    )
    .unwrap()
}

fn document_file(content: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn issue_then_verify_roundtrip() -> Result<()> {
    let engine = engine();
    engine.onboard_tenant("university-1").await?;

    let file = document_file(b"the original document bytes");
    let mut pages = vec![Page::blank(612.0, 792.0)];

    let issued = engine
        .issue(
            "university-1",
            "transcript-42",
            file.path(),
            &mut pages,
            Some("Transcript"),
            Some("student-9"),
        )
        .await?;

    assert_eq!(issued.document_hash.len(), 64);
    assert_eq!(issued.page_hashes.len(), 1);
    assert_eq!(issued.merkle_root, None);

    let report = engine.verify(&pages[0], Some(file.path())).await?;
    assert_eq!(report.outcome, VerificationOutcome::Verified);

    let payload = report.payload.unwrap();
    assert_eq!(payload.document_id, "transcript-42");
    assert_eq!(payload.issuer_id, "university-1");
    assert_eq!(payload.document_hash, issued.document_hash);
    assert_eq!(payload.credential_type.as_deref(), Some("Transcript"));

    // The presented file is the pre-stamp file here, so hashes agree;
    // either way the field is diagnostic, not part of the verdict.
    assert_eq!(
        report.presented_file_hash.as_deref(),
        Some(issued.document_hash.as_str())
    );
    Ok(())
}

#[tokio::test]
async fn multi_page_document_carries_merkle_root() -> Result<()> {
    let engine = engine();
    engine.onboard_tenant("university-1").await?;

    let file = document_file(b"a three page document");
    let mut pages = vec![
        Page::blank(612.0, 792.0),
        Page::blank(612.0, 792.0),
        Page::blank(595.0, 842.0),
    ];

    let issued = engine
        .issue("university-1", "doc-3p", file.path(), &mut pages, None, None)
        .await?;

    let root = issued.merkle_root.clone().expect("multi-page root");
    let leaves: Vec<String> = issued.page_hashes.iter().map(|p| p.hash.clone()).collect();
    let tree = veridoc_core::MerkleTree::build(leaves);
    assert_eq!(tree.root(), Some(root.as_str()));

    let report = engine.verify(&pages[0], None).await?;
    assert_eq!(report.outcome, VerificationOutcome::Verified);
    assert_eq!(report.payload.unwrap().merkle_root, Some(root));
    Ok(())
}

#[tokio::test]
async fn blank_page_is_not_found() -> Result<()> {
    let engine = engine();
    let report = engine.verify(&Page::blank(612.0, 792.0), None).await?;
    assert_eq!(report.outcome, VerificationOutcome::NotFound);
    assert!(report.payload.is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_issuer_is_reported_not_thrown() -> Result<()> {
    let engine = engine();

    let payload = CredentialPayload {
        document_id: "doc-1".into(),
        document_hash: "ab".repeat(32),
        issuer_id: "nobody-registered-this".into(),
        signature: BASE64.encode([0u8; 64]),
        merkle_root: None,
        credential_type: None,
    };
    let wire = payload.to_wire_json(&EncodeOptions::default())?;
    let mut page = Page::blank(612.0, 792.0);
    page.stamp(&render_qr(&wire)?, &StampConfig::default());

    let report = engine.verify(&page, None).await?;
    assert_eq!(report.outcome, VerificationOutcome::IssuerUnknown);
    assert!(report.payload.is_some());
    assert!(report.signature_prefix.is_some());
    Ok(())
}

#[tokio::test]
async fn signature_under_wrong_key_is_invalid() -> Result<()> {
    let engine = engine();
    engine.onboard_tenant("tenant-a").await?;
    engine.onboard_tenant("tenant-b").await?;

    let file = document_file(b"document");
    let mut pages = vec![Page::blank(612.0, 792.0)];
    let issued = engine
        .issue("tenant-a", "doc-1", file.path(), &mut pages, None, None)
        .await?;

    // Re-encode the credential claiming tenant-b as the issuer; the
    // signature was produced under tenant-a's key.
    let forged = CredentialPayload {
        document_id: issued.document_id.clone(),
        document_hash: issued.document_hash.clone(),
        issuer_id: "tenant-b".into(),
        signature: issued.signature.clone(),
        merkle_root: None,
        credential_type: None,
    };
    let wire = forged.to_wire_json(&EncodeOptions::default())?;
    let mut forged_page = Page::blank(612.0, 792.0);
    forged_page.stamp(&render_qr(&wire)?, &StampConfig::default());

    let report = engine.verify(&forged_page, None).await?;
    assert_eq!(report.outcome, VerificationOutcome::SignatureInvalid);
    Ok(())
}

#[tokio::test]
async fn legacy_credential_verifies_with_configured_seed() -> Result<()> {
    let seed = [7u8; 32];
    let mut config = EngineConfig::new("test-deployment-secret");
    config.legacy_seed_b64 = Some(BASE64.encode(seed));
    let engine = Engine::new(
        config,
        Arc::new(MemoryKeyRepository::new()),
        Arc::new(MemoryAuditStore::new()),
    )?;

    let document_hash = "cd".repeat(32);
    let signature = LegacySigner::from_seed(&seed).sign_fingerprint(&document_hash);
    let wire = serde_json::json!({
        "id": "old-doc",
        "hash": document_hash,
        "sig": signature,
    })
    .to_string();

    let mut page = Page::blank(612.0, 792.0);
    page.stamp(&render_qr(&wire)?, &StampConfig::default());

    let report = engine.verify(&page, None).await?;
    assert_eq!(report.outcome, VerificationOutcome::Verified);
    assert_eq!(report.payload.unwrap().issuer_id, "legacy");
    Ok(())
}

#[tokio::test]
async fn legacy_credential_without_seed_is_issuer_unknown() -> Result<()> {
    let engine = engine();

    let wire = serde_json::json!({
        "id": "old-doc",
        "hash": "cd".repeat(32),
        "sig": BASE64.encode([0u8; 64]),
    })
    .to_string();
    let mut page = Page::blank(612.0, 792.0);
    page.stamp(&render_qr(&wire)?, &StampConfig::default());

    let report = engine.verify(&page, None).await?;
    assert_eq!(report.outcome, VerificationOutcome::IssuerUnknown);
    Ok(())
}

#[tokio::test]
async fn every_attempt_lands_in_the_audit_chain() -> Result<()> {
    let engine = engine();
    engine.onboard_tenant("university-1").await?;

    let file = document_file(b"document");
    let mut pages = vec![Page::blank(612.0, 792.0)];
    engine
        .issue("university-1", "doc-1", file.path(), &mut pages, None, None)
        .await?;

    engine.verify(&pages[0], None).await?;
    engine.verify(&Page::blank(612.0, 792.0), None).await?;

    // Onboarding, issuance, and the successful verification share the
    // tenant scope; the NotFound attempt has no tenant and goes global.
    let scope = ChainScope::Tenant("university-1".into());
    let tenant_report = engine.verify_audit_chain(&scope, 1000).await?;
    assert!(tenant_report.is_valid);
    assert_eq!(tenant_report.checked, 3);

    let global_report = engine.verify_audit_chain(&ChainScope::Global, 1000).await?;
    assert!(global_report.is_valid);
    assert_eq!(global_report.checked, 1);
    Ok(())
}

/// Repository whose every call fails, simulating a dead backing store.
struct DownRepository;

#[async_trait]
impl KeyRepository for DownRepository {
    async fn get(&self, _tenant_id: &str) -> Result<Option<KeyMaterial>, VaultError> {
        Err(VaultError::RepositoryUnavailable("connection refused".into()))
    }

    async fn put(&self, _tenant_id: &str, _material: KeyMaterial) -> Result<(), VaultError> {
        Err(VaultError::RepositoryUnavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn repository_outage_is_unavailable_not_a_verdict() -> Result<()> {
    // Issue against a healthy engine, verify against one whose key
    // repository is down.
    let healthy = engine();
    healthy.onboard_tenant("university-1").await?;
    let file = document_file(b"document");
    let mut pages = vec![Page::blank(612.0, 792.0)];
    healthy
        .issue("university-1", "doc-1", file.path(), &mut pages, None, None)
        .await?;

    let degraded = Engine::new(
        EngineConfig::new("test-deployment-secret"),
        Arc::new(DownRepository),
        Arc::new(MemoryAuditStore::new()),
    )?;

    let err = degraded.verify(&pages[0], None).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
    Ok(())
}

#[tokio::test]
async fn concurrent_verifications_complete_on_one_runtime_thread() -> Result<()> {
    // Hashing and decoding run on the blocking pool, so several
    // in-flight verifications on the default single-thread test runtime
    // all make progress instead of serializing behind CPU work.
    let engine = engine();
    engine.onboard_tenant("university-1").await?;

    let file = document_file(&vec![0u8; 1 << 20]);
    let mut pages = vec![Page::blank(612.0, 792.0)];
    engine
        .issue("university-1", "doc-1", file.path(), &mut pages, None, None)
        .await?;

    let blank = Page::blank(612.0, 792.0);
    let (a, b, c) = tokio::join!(
        engine.verify(&pages[0], Some(file.path())),
        engine.verify(&pages[0], None),
        engine.verify(&blank, None),
    );
    assert_eq!(a?.outcome, VerificationOutcome::Verified);
    assert_eq!(b?.outcome, VerificationOutcome::Verified);
    assert_eq!(c?.outcome, VerificationOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn issuing_for_unknown_tenant_fails() -> Result<()> {
    let engine = engine();
    let file = document_file(b"document");
    let mut pages = vec![Page::blank(612.0, 792.0)];

    let err = engine
        .issue("ghost", "doc-1", file.path(), &mut pages, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownTenant(t) if t == "ghost"));
    Ok(())
}

#[tokio::test]
async fn trust_inputs_follow_the_verdict() -> Result<()> {
    let engine = engine();
    engine.onboard_tenant("university-1").await?;

    let file = document_file(b"document");
    let mut pages = vec![Page::blank(612.0, 792.0)];
    engine
        .issue("university-1", "doc-1", file.path(), &mut pages, None, None)
        .await?;
    let report = engine.verify(&pages[0], None).await?;

    let inputs = engine.trust_inputs(
        &report,
        Some(veridoc::ForensicSignals {
            tamper_score: 1.4,
            manipulation_score: -0.1,
            anomaly_score: 0.5,
        }),
    );
    assert!(inputs.signature_valid);
    let forensics = inputs.forensics.unwrap();
    assert_eq!(forensics.tamper_score, 1.0);
    assert_eq!(forensics.manipulation_score, 0.0);
    Ok(())
}
