//! # VeriDoc Audit
//!
//! Tamper-evident audit trail: every event carries the hash of the entry
//! before it, forming a per-scope hash chain. Rewriting one entry breaks
//! every link after it.
//!
//! Chains are scoped: one global chain plus one chain per tenant. The
//! chain writer serializes appends within a scope so concurrent events
//! cannot claim the same position.
//!
//! This is tamper *evidence*, not tamper *proof*: an attacker who can
//! rewrite the whole store can recompute every hash. External anchoring
//! of chain heads is out of scope here.

pub mod chain;
pub mod entry;
pub mod error;
pub mod store;

pub use chain::{AuditChain, ChainReport};
pub use entry::{AuditEntry, AuditEvent, EventType};
pub use error::AuditError;
pub use store::{AuditStore, ChainScope, MemoryAuditStore};
