//! The chain writer: links events into per-scope hash chains.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::entry::{AuditEntry, AuditEvent, EventType};
use crate::error::AuditError;
use crate::store::{AuditStore, ChainScope};

/// Result of a chain integrity walk. Returned as data; a broken chain is
/// a finding, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub is_valid: bool,
    /// Chain position of the first entry whose link or hash does not
    /// check out. `None` when the chain is intact.
    pub first_broken_position: Option<u64>,
    /// Entries examined.
    pub checked: usize,
}

impl ChainReport {
    fn intact(checked: usize) -> Self {
        Self {
            is_valid: true,
            first_broken_position: None,
            checked,
        }
    }

    fn broken(position: u64, checked: usize) -> Self {
        Self {
            is_valid: false,
            first_broken_position: Some(position),
            checked,
        }
    }
}

/// Appends events to per-scope hash chains.
///
/// Appends within one scope are serialized behind an async mutex so the
/// read-head-then-write step cannot interleave; two concurrent events can
/// never claim the same chain position.
pub struct AuditChain<A: AuditStore + ?Sized> {
    store: Arc<A>,
    scope_locks: Mutex<HashMap<ChainScope, Arc<Mutex<()>>>>,
}

impl<A: AuditStore + ?Sized> AuditChain<A> {
    pub fn new(store: Arc<A>) -> Self {
        Self {
            store,
            scope_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &A {
        self.store.as_ref()
    }

    /// Append an event to its scope's chain and return the linked entry.
    pub async fn append(&self, event: AuditEvent) -> Result<AuditEntry, AuditError> {
        let scope = ChainScope::for_tenant(event.tenant_id.as_deref());
        let lock = self.scope_lock(&scope).await;
        let _guard = lock.lock().await;

        let head = self.store.head(&scope).await?;
        let (previous_hash, position) = match head {
            Some(entry) => (Some(entry.log_hash), entry.chain_position + 1),
            None => (None, 1),
        };

        let entry = AuditEntry::link(event, position, previous_hash)?;
        self.store.append(&scope, entry.clone()).await?;
        debug!(
            event_type = entry.event_type.as_str(),
            position, "audit entry appended"
        );
        Ok(entry)
    }

    /// Record a document issuance.
    ///
    /// The signature goes into metadata as a truncated prefix and the
    /// subject id as a short hash; neither full value belongs in a log.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_issuance(
        &self,
        tenant_id: &str,
        document_id: &str,
        document_hash: &str,
        signature: &str,
        document_type: Option<&str>,
        subject_id: Option<&str>,
    ) -> Result<AuditEntry, AuditError> {
        let mut event = AuditEvent::new(EventType::DocumentIssued)
            .tenant(tenant_id)
            .document(document_id)
            .document_hash(document_hash)
            .meta("signature", Value::from(truncate_signature(signature)));
        if let Some(doc_type) = document_type {
            event = event.meta("document_type", Value::from(doc_type));
        }
        if let Some(subject) = subject_id {
            event = event.meta("subject_id_hash", Value::from(subject_id_hash(subject)));
        }
        self.append(event).await
    }

    /// Record a verification attempt, success or failure.
    pub async fn record_verification(
        &self,
        document_hash: Option<&str>,
        is_valid: bool,
        tenant_id: Option<&str>,
        failure_reason: Option<&str>,
    ) -> Result<AuditEntry, AuditError> {
        let event_type = if is_valid {
            EventType::VerificationSuccess
        } else {
            EventType::VerificationFailed
        };

        let mut event = AuditEvent::new(event_type);
        if let Some(tenant) = tenant_id {
            event = event.tenant(tenant);
        }
        if let Some(hash) = document_hash {
            event = event.document_hash(hash);
        }
        if let Some(reason) = failure_reason {
            event = event.meta("failure_reason", Value::from(reason));
        }
        self.append(event).await
    }

    /// Record a tenant coming online with a fresh keypair.
    pub async fn record_tenant_onboarded(
        &self,
        tenant_id: &str,
        public_key_hex: &str,
    ) -> Result<AuditEntry, AuditError> {
        self.append(
            AuditEvent::new(EventType::TenantOnboarded)
                .tenant(tenant_id)
                .meta("public_key", Value::from(public_key_hex)),
        )
        .await
    }

    /// Walk a scope's chain and check every link and every entry hash.
    pub async fn verify_chain_integrity(
        &self,
        scope: &ChainScope,
        limit: usize,
    ) -> Result<ChainReport, AuditError> {
        let entries = self.store.query(scope, limit, 0).await?;
        if entries.is_empty() {
            return Ok(ChainReport::intact(0));
        }

        let mut previous: Option<&AuditEntry> = None;
        for entry in &entries {
            // An entry rewritten in place no longer matches its own hash.
            if entry.compute_hash()? != entry.log_hash {
                return Ok(ChainReport::broken(entry.chain_position, entries.len()));
            }

            match previous {
                None => {
                    if entry.chain_position == 1 && entry.previous_log_hash.is_some() {
                        return Ok(ChainReport::broken(entry.chain_position, entries.len()));
                    }
                }
                Some(prior) => {
                    if entry.previous_log_hash.as_deref() != Some(prior.log_hash.as_str()) {
                        return Ok(ChainReport::broken(entry.chain_position, entries.len()));
                    }
                }
            }
            previous = Some(entry);
        }

        Ok(ChainReport::intact(entries.len()))
    }

    async fn scope_lock(&self, scope: &ChainScope) -> Arc<Mutex<()>> {
        let mut locks = self.scope_locks.lock().await;
        Arc::clone(locks.entry(scope.clone()).or_default())
    }
}

fn truncate_signature(signature: &str) -> String {
    let prefix: String = signature.chars().take(32).collect();
    format!("{prefix}...")
}

fn subject_id_hash(subject_id: &str) -> String {
    hex::encode(Sha256::digest(subject_id.as_bytes()))[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAuditStore;

    fn chain() -> AuditChain<MemoryAuditStore> {
        AuditChain::new(Arc::new(MemoryAuditStore::new()))
    }

    #[tokio::test]
    async fn test_first_entry_has_no_previous() {
        let chain = chain();
        let entry = chain
            .record_verification(Some("ab"), true, None, None)
            .await
            .unwrap();
        assert_eq!(entry.chain_position, 1);
        assert!(entry.previous_log_hash.is_none());
    }

    #[tokio::test]
    async fn test_entries_link_in_order() {
        let chain = chain();
        let first = chain
            .record_verification(Some("h1"), true, Some("tenant-a"), None)
            .await
            .unwrap();
        let second = chain
            .record_verification(Some("h2"), false, Some("tenant-a"), Some("bad signature"))
            .await
            .unwrap();

        assert_eq!(second.chain_position, 2);
        assert_eq!(second.previous_log_hash.as_deref(), Some(first.log_hash.as_str()));
        assert_eq!(second.event_type, EventType::VerificationFailed);
    }

    #[tokio::test]
    async fn test_scopes_chain_independently() {
        let chain = chain();
        let a = chain
            .record_verification(Some("h"), true, Some("tenant-a"), None)
            .await
            .unwrap();
        let b = chain
            .record_verification(Some("h"), true, Some("tenant-b"), None)
            .await
            .unwrap();
        let global = chain
            .record_verification(Some("h"), true, None, None)
            .await
            .unwrap();

        assert_eq!(a.chain_position, 1);
        assert_eq!(b.chain_position, 1);
        assert_eq!(global.chain_position, 1);
    }

    #[tokio::test]
    async fn test_issuance_metadata_is_redacted() {
        let chain = chain();
        let signature = "A".repeat(88);
        let entry = chain
            .record_issuance(
                "tenant-a",
                "doc-1",
                &"cd".repeat(32),
                &signature,
                Some("transcript"),
                Some("student-42"),
            )
            .await
            .unwrap();

        let sig = entry.metadata["signature"].as_str().unwrap();
        assert_eq!(sig, format!("{}...", "A".repeat(32)));

        let subject = entry.metadata["subject_id_hash"].as_str().unwrap();
        assert_eq!(subject.len(), 16);
        assert_ne!(subject, "student-42");
    }

    #[tokio::test]
    async fn test_intact_chain_verifies() {
        let chain = chain();
        for i in 0..5 {
            chain
                .record_verification(Some(&format!("h{i}")), true, Some("tenant-a"), None)
                .await
                .unwrap();
        }

        let report = chain
            .verify_chain_integrity(&ChainScope::Tenant("tenant-a".into()), 1000)
            .await
            .unwrap();
        assert!(report.is_valid);
        assert_eq!(report.first_broken_position, None);
        assert_eq!(report.checked, 5);
    }

    #[tokio::test]
    async fn test_empty_chain_is_valid() {
        let chain = chain();
        let report = chain
            .verify_chain_integrity(&ChainScope::Global, 1000)
            .await
            .unwrap();
        assert!(report.is_valid);
        assert_eq!(report.checked, 0);
    }

    #[tokio::test]
    async fn test_tampered_entry_is_localized() {
        let store = Arc::new(MemoryAuditStore::new());
        let chain = AuditChain::new(Arc::clone(&store));
        let scope = ChainScope::Tenant("tenant-a".into());

        for i in 0..4 {
            chain
                .record_verification(Some(&format!("h{i}")), true, Some("tenant-a"), None)
                .await
                .unwrap();
        }

        // Rewrite the third entry's payload without touching its hash.
        let mut entries = store.query(&scope, 100, 0).await.unwrap();
        let mut doctored = entries.remove(2);
        doctored.document_hash = Some("forged".into());
        store.tamper(&scope, 2, doctored);

        let report = chain.verify_chain_integrity(&scope, 1000).await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.first_broken_position, Some(3));
    }

    #[tokio::test]
    async fn test_recomputed_hash_still_breaks_next_link() {
        let store = Arc::new(MemoryAuditStore::new());
        let chain = AuditChain::new(Arc::clone(&store));
        let scope = ChainScope::Tenant("tenant-a".into());

        for i in 0..3 {
            chain
                .record_verification(Some(&format!("h{i}")), true, Some("tenant-a"), None)
                .await
                .unwrap();
        }

        // A smarter attacker recomputes the edited entry's own hash. The
        // next entry still carries the old hash, so the link breaks there.
        let entries = store.query(&scope, 100, 0).await.unwrap();
        let mut doctored = entries[1].clone();
        doctored.document_hash = Some("forged".into());
        doctored.log_hash = doctored.compute_hash().unwrap();
        store.tamper(&scope, 1, doctored);

        let report = chain.verify_chain_integrity(&scope, 1000).await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.first_broken_position, Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_appends_get_unique_positions() {
        let chain = Arc::new(AuditChain::new(Arc::new(MemoryAuditStore::new())));

        let mut handles = Vec::new();
        for i in 0..16 {
            let chain = Arc::clone(&chain);
            handles.push(tokio::spawn(async move {
                chain
                    .record_verification(Some(&format!("h{i}")), true, Some("tenant-a"), None)
                    .await
            }));
        }

        let mut positions = Vec::new();
        for handle in handles {
            positions.push(handle.await.unwrap().unwrap().chain_position);
        }
        positions.sort_unstable();
        assert_eq!(positions, (1..=16).collect::<Vec<u64>>());

        let report = chain
            .verify_chain_integrity(&ChainScope::Tenant("tenant-a".into()), 1000)
            .await
            .unwrap();
        assert!(report.is_valid);
    }
}
