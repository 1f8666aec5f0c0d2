//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a fully wired engine over
//! in-memory collaborators, plus shortcuts for making pages and files.

use std::io::Write;
use std::sync::Arc;

use veridoc::{Engine, EngineConfig, IssuedDocument};
use veridoc_audit::MemoryAuditStore;
use veridoc_codec::Page;
use veridoc_vault::MemoryKeyRepository;

/// Deterministic seed for fixtures that need a pinned legacy key.
pub const LEGACY_SEED: [u8; 32] = [0x42; 32];

/// An engine wired to in-memory collaborators.
pub struct TestFixture {
    pub repository: Arc<MemoryKeyRepository>,
    pub audit_store: Arc<MemoryAuditStore>,
    pub engine: Engine<MemoryKeyRepository, MemoryAuditStore>,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new("testkit-deployment-secret"))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let repository = Arc::new(MemoryKeyRepository::new());
        let audit_store = Arc::new(MemoryAuditStore::new());
        let engine = Engine::new(config, Arc::clone(&repository), Arc::clone(&audit_store))
            .expect("fixture config is valid");
        Self {
            repository,
            audit_store,
            engine,
        }
    }

    /// Onboard a tenant and return its public key hex.
    pub async fn onboard(&self, tenant_id: &str) -> String {
        self.engine
            .onboard_tenant(tenant_id)
            .await
            .expect("onboarding over memory stores cannot fail")
    }

    /// A blank US Letter page.
    pub fn letter_page() -> Page {
        Page::blank(612.0, 792.0)
    }

    /// A temp file with the given content, kept alive by the handle.
    pub fn document_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(content).expect("write temp file");
        file.flush().expect("flush temp file");
        file
    }

    /// Issue a single-page document in one call.
    ///
    /// Returns the issuance result, the stamped pages, and the file
    /// handle (dropping it deletes the file).
    pub async fn issue_simple(
        &self,
        tenant_id: &str,
        document_id: &str,
        content: &[u8],
    ) -> (IssuedDocument, Vec<Page>, tempfile::NamedTempFile) {
        let file = Self::document_file(content);
        let mut pages = vec![Self::letter_page()];
        let issued = self
            .engine
            .issue(tenant_id, document_id, file.path(), &mut pages, None, None)
            .await
            .expect("issue over memory stores cannot fail");
        (issued, pages, file)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridoc::VerificationOutcome;

    #[tokio::test]
    async fn test_fixture_roundtrip() {
        let fixture = TestFixture::new();
        fixture.onboard("tenant-a").await;
        let (issued, pages, _file) = fixture.issue_simple("tenant-a", "doc-1", b"bytes").await;

        assert_eq!(issued.tenant_id, "tenant-a");
        let report = fixture.engine.verify(&pages[0], None).await.unwrap();
        assert_eq!(report.outcome, VerificationOutcome::Verified);
    }

    #[tokio::test]
    async fn test_fixture_stores_are_shared_with_engine() {
        let fixture = TestFixture::new();
        fixture.onboard("tenant-a").await;
        assert_eq!(fixture.repository.len(), 1);
        assert_eq!(fixture.audit_store.len(), 1);
    }
}
