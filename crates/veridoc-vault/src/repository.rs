//! Key repository collaborator trait and in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::VaultError;
use crate::vault::KeyMaterial;

/// Abstract store for per-tenant key records.
///
/// The engine never talks to a database directly; it goes through this
/// trait so deployments can back it with whatever store they run.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// Fetch the key record for a tenant. `Ok(None)` means the tenant has
    /// no registered key; `Err` means the store itself failed.
    async fn get(&self, tenant_id: &str) -> Result<Option<KeyMaterial>, VaultError>;

    /// Store or replace the key record for a tenant.
    async fn put(&self, tenant_id: &str, material: KeyMaterial) -> Result<(), VaultError>;
}

/// In-memory key repository for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryKeyRepository {
    records: RwLock<HashMap<String, KeyMaterial>>,
}

impl MemoryKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tenants with a registered key.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyRepository for MemoryKeyRepository {
    async fn get(&self, tenant_id: &str) -> Result<Option<KeyMaterial>, VaultError> {
        let records = self
            .records
            .read()
            .map_err(|_| VaultError::RepositoryUnavailable("lock poisoned".into()))?;
        Ok(records.get(tenant_id).cloned())
    }

    async fn put(&self, tenant_id: &str, material: KeyMaterial) -> Result<(), VaultError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| VaultError::RepositoryUnavailable("lock poisoned".into()))?;
        records.insert(tenant_id.to_string(), material);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::KeyVault;

    #[tokio::test]
    async fn test_get_missing_tenant_is_none() {
        let repo = MemoryKeyRepository::new();
        assert!(repo.get("tenant-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let repo = MemoryKeyRepository::new();
        let vault = KeyVault::new("secret");
        let material = vault.create_tenant_keys().unwrap();

        repo.put("tenant-a", material.clone()).await.unwrap();
        let fetched = repo.get("tenant-a").await.unwrap().unwrap();
        assert_eq!(fetched, material);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let repo = MemoryKeyRepository::new();
        let vault = KeyVault::new("secret");
        let first = vault.create_tenant_keys().unwrap();
        let second = vault.create_tenant_keys().unwrap();

        repo.put("tenant-a", first).await.unwrap();
        repo.put("tenant-a", second.clone()).await.unwrap();

        let fetched = repo.get("tenant-a").await.unwrap().unwrap();
        assert_eq!(fetched, second);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let repo = MemoryKeyRepository::new();
        let vault = KeyVault::new("secret");
        let a = vault.create_tenant_keys().unwrap();
        let b = vault.create_tenant_keys().unwrap();

        repo.put("tenant-a", a.clone()).await.unwrap();
        repo.put("tenant-b", b.clone()).await.unwrap();

        assert_eq!(repo.get("tenant-a").await.unwrap().unwrap(), a);
        assert_eq!(repo.get("tenant-b").await.unwrap().unwrap(), b);
    }
}
