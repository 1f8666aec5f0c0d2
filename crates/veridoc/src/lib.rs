//! # VeriDoc
//!
//! Document integrity and trust engine. A tenant issues a document: the
//! engine fingerprints it, signs the fingerprint with the tenant's
//! Ed25519 key, and stamps a QR credential onto the first page. Anyone
//! with the stamped page can verify it offline-decodable and trace the
//! issuance through a tamper-evident audit chain.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use veridoc::{Engine, EngineConfig};
//! use veridoc_audit::MemoryAuditStore;
//! use veridoc_codec::Page;
//! use veridoc_vault::MemoryKeyRepository;
//!
//! # async fn demo() -> Result<(), veridoc::EngineError> {
//! let engine = Engine::new(
//!     EngineConfig::new("deployment-secret"),
//!     Arc::new(MemoryKeyRepository::new()),
//!     Arc::new(MemoryAuditStore::new()),
//! )?;
//!
//! engine.onboard_tenant("university-1").await?;
//!
//! let mut pages = vec![Page::blank(612.0, 792.0)];
//! let issued = engine
//!     .issue(
//!         "university-1",
//!         "transcript-42",
//!         "diploma.pdf".as_ref(),
//!         &mut pages,
//!         Some("Transcript"),
//!         None,
//!     )
//!     .await?;
//! assert_eq!(issued.audit_position, 2);
//!
//! let report = engine.verify(&pages[0], None).await?;
//! assert!(report.is_verified());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod forensic;
pub mod report;

pub use engine::{Engine, EngineConfig, IssuedDocument};
pub use error::EngineError;
pub use forensic::{ForensicSignals, TrustInputs};
pub use report::{VerificationOutcome, VerificationReport};
