//! Bounded-memory hashing of files, streams, and byte ranges.
//!
//! All reads go through a fixed-size buffer so memory use is O(1) in the
//! size of the input, and the resulting digest is independent of the
//! buffer size used internally.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::CoreError;
use crate::hash::DocumentHash;

/// Default read buffer: 64 KiB.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Chunked SHA-256 hasher.
///
/// The chunk size is configurable for tests; it never changes the digest.
#[derive(Debug, Clone)]
pub struct ChunkedHasher {
    chunk_size: usize,
}

impl ChunkedHasher {
    /// Create a hasher with the default 64 KiB chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Create a hasher with a custom chunk size (minimum 1 byte).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Hash an entire file.
    ///
    /// Missing or unreadable files surface as `CoreError::Io`; a
    /// placeholder digest is never returned.
    pub fn hash_file(&self, path: impl AsRef<Path>) -> Result<DocumentHash, CoreError> {
        let mut file = File::open(path)?;
        self.hash_reader(&mut file)
    }

    /// Hash everything remaining in a reader.
    pub fn hash_reader(&self, reader: &mut impl Read) -> Result<DocumentHash, CoreError> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(DocumentHash(hasher.finalize().into()))
    }

    /// Hash a seekable stream and rewind it to the start afterward, so the
    /// caller can re-read the same bytes (e.g. an upload buffer).
    pub fn hash_stream(
        &self,
        stream: &mut (impl Read + Seek),
    ) -> Result<DocumentHash, CoreError> {
        let digest = self.hash_reader(stream)?;
        stream.seek(SeekFrom::Start(0))?;
        Ok(digest)
    }

    /// Hash the byte range `start..end` of a file.
    pub fn hash_range(
        &self,
        path: impl AsRef<Path>,
        start: u64,
        end: u64,
    ) -> Result<DocumentHash, CoreError> {
        if end < start {
            return Err(CoreError::InvalidRange { start, end });
        }

        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(start))?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut remaining = end - start;

        while remaining > 0 {
            let want = (self.chunk_size as u64).min(remaining) as usize;
            let n = file.read(&mut buf[..want])?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            remaining -= n as u64;
        }

        Ok(DocumentHash(hasher.finalize().into()))
    }
}

impl Default for ChunkedHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Partition `len` bytes into `parts` contiguous ranges for parallel
/// hashing. The last range absorbs the remainder.
pub fn split_ranges(len: u64, parts: u32) -> Vec<(u64, u64)> {
    let parts = parts.max(1) as u64;
    let part_size = len / parts;

    (0..parts)
        .map(|i| {
            let start = i * part_size;
            let end = if i == parts - 1 { len } else { (i + 1) * part_size };
            (start, end)
        })
        .collect()
}
