//! # VeriDoc Testkit
//!
//! Testing utilities for the VeriDoc engine.
//!
//! - **Golden vectors**: known digests, Merkle roots, and signing inputs
//!   that any reimplementation must reproduce bit-for-bit
//! - **Generators**: proptest strategies for leaf lists, payloads, and
//!   audit event sequences
//! - **Fixtures**: a fully wired engine over in-memory collaborators
//!
//! ```no_run
//! use veridoc_testkit::TestFixture;
//!
//! # async fn demo() {
//! let fixture = TestFixture::new();
//! fixture.onboard("tenant-a").await;
//! let (issued, pages, _file) = fixture.issue_simple("tenant-a", "doc-1", b"bytes").await;
//! assert_eq!(issued.audit_position, 2);
//! # let _ = pages;
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
pub use vectors::{hash_vectors, merkle_vectors, sign_vectors, verify_all_vectors};
