//! # VeriDoc Vault
//!
//! Per-tenant key management: Ed25519 keypair generation, authenticated
//! encryption of private key material under a deployment master key, and
//! the signing facade used by the issuance and verification pipelines.
//!
//! ## Key Types
//!
//! - [`KeyVault`] - Master-key derivation plus AES-256-GCM key envelopes
//! - [`KeyMaterial`] - The encrypted key record stored by the key repository
//! - [`KeyRepository`] - Collaborator trait for the external key store
//! - [`TenantSigner`] / [`SignerCache`] - Lazily loaded per-tenant signers
//! - [`LegacySigner`] - Single-key signer for tenants without a registered key
//!
//! The plaintext private key exists only in memory. Once a tenant signer
//! is loaded it is cached for the life of the process; that is a
//! documented tradeoff, not an accident.

pub mod error;
pub mod keys;
pub mod repository;
pub mod signer;
pub mod vault;

pub use error::VaultError;
pub use keys::{Keypair, PublicKey, Signature};
pub use repository::{KeyRepository, MemoryKeyRepository};
pub use signer::{LegacySigner, SignerCache, TenantSigner};
pub use vault::{KeyEnvelope, KeyMaterial, KeyVault, NONCE_SIZE};
