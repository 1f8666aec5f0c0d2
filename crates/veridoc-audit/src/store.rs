//! Audit store collaborator trait and in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::entry::AuditEntry;
use crate::error::AuditError;

/// Which chain an entry belongs to.
///
/// Every tenant has its own chain; events with no tenant go to the
/// global chain. Positions are per scope, so two scopes can both hold an
/// entry at position 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainScope {
    Global,
    Tenant(String),
}

impl ChainScope {
    pub fn for_tenant(tenant_id: Option<&str>) -> Self {
        match tenant_id {
            Some(id) => Self::Tenant(id.to_string()),
            None => Self::Global,
        }
    }
}

/// Abstract append-only store for audit entries.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist an entry. The chain writer has already linked it.
    async fn append(&self, scope: &ChainScope, entry: AuditEntry) -> Result<(), AuditError>;

    /// The most recent entry in a scope, by chain position.
    async fn head(&self, scope: &ChainScope) -> Result<Option<AuditEntry>, AuditError>;

    /// Entries in a scope ordered by chain position ascending.
    async fn query(
        &self,
        scope: &ChainScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AuditEntry>, AuditError>;
}

/// In-memory audit store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryAuditStore {
    chains: RwLock<HashMap<ChainScope, Vec<AuditEntry>>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all scopes.
    pub fn len(&self) -> usize {
        self.chains
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a stored entry in place, simulating a tampered store.
    /// Compiled only for this crate's own tests; the store is otherwise
    /// append-only.
    #[cfg(test)]
    pub(crate) fn tamper(&self, scope: &ChainScope, index: usize, entry: AuditEntry) {
        if let Ok(mut chains) = self.chains.write() {
            if let Some(chain) = chains.get_mut(scope) {
                if index < chain.len() {
                    chain[index] = entry;
                }
            }
        }
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, scope: &ChainScope, entry: AuditEntry) -> Result<(), AuditError> {
        let mut chains = self
            .chains
            .write()
            .map_err(|_| AuditError::StoreUnavailable("lock poisoned".into()))?;
        chains.entry(scope.clone()).or_default().push(entry);
        Ok(())
    }

    async fn head(&self, scope: &ChainScope) -> Result<Option<AuditEntry>, AuditError> {
        let chains = self
            .chains
            .read()
            .map_err(|_| AuditError::StoreUnavailable("lock poisoned".into()))?;
        Ok(chains
            .get(scope)
            .and_then(|chain| chain.iter().max_by_key(|e| e.chain_position))
            .cloned())
    }

    async fn query(
        &self,
        scope: &ChainScope,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AuditEntry>, AuditError> {
        let chains = self
            .chains
            .read()
            .map_err(|_| AuditError::StoreUnavailable("lock poisoned".into()))?;
        let mut entries: Vec<AuditEntry> = chains.get(scope).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.chain_position);
        Ok(entries.into_iter().skip(offset).take(limit).collect())
    }
}
