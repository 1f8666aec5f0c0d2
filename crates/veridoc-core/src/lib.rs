//! # VeriDoc Core
//!
//! Pure primitives for the VeriDoc engine: document fingerprints, chunked
//! hashing, and Merkle trees for per-page tamper localization.
//!
//! This crate contains no networking and no storage. The only I/O it
//! performs is reading the files it is asked to fingerprint, always in
//! bounded 64 KiB buffers.
//!
//! ## Key Types
//!
//! - [`DocumentHash`] - A SHA-256 document fingerprint (64 hex chars on the wire)
//! - [`ChunkedHasher`] - Bounded-memory hashing of files, streams, and byte ranges
//! - [`MerkleTree`] - Flat, arena-style hash tree over per-page hashes
//! - [`MerkleProof`] - Sibling path proving a page belongs to a known root

pub mod error;
pub mod hash;
pub mod hasher;
pub mod merkle;

pub use error::CoreError;
pub use hash::{hash_bytes, hash_str, DocumentHash, PageHash};
pub use hasher::{split_ranges, ChunkedHasher, CHUNK_SIZE};
pub use merkle::{hash_pair, MerkleProof, MerkleTree, Side};
