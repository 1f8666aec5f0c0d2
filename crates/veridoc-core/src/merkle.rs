//! Merkle tree over per-page hashes.
//!
//! The tree is stored as flat per-level arrays (an arena of `Vec<String>`),
//! not linked nodes. Leaves are the string forms of the page hashes; a
//! parent is `SHA256(left_string || right_string)` hex. The leaf list is
//! padded to the next power of two by duplicating the last real leaf, and
//! padding leaves are never reported to callers as real pages.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Which side of the current node a proof sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Proof that a specific page hash belongs to a Merkle root.
///
/// Replaying `path` against `leaf_hash` in order must reproduce
/// `root_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// 1-indexed page number.
    pub page_number: u32,
    /// The leaf hash being proven.
    pub leaf_hash: String,
    /// Sibling hashes from leaf to root, with the side each sibling is on.
    pub path: Vec<(String, Side)>,
    /// The expected root.
    pub root_hash: String,
}

impl MerkleProof {
    /// Replay the sibling path and compare against the recorded root.
    ///
    /// Returns a boolean; never panics on malformed input.
    pub fn verify(&self) -> bool {
        let mut current = self.leaf_hash.clone();

        for (sibling, side) in &self.path {
            current = match side {
                Side::Left => hash_pair(sibling, &current),
                Side::Right => hash_pair(&current, sibling),
            };
        }

        current == self.root_hash
    }
}

/// Hash two node strings together: `SHA256(left || right)` hex.
pub fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Binary hash tree over an ordered list of leaf hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// The real (unpadded) leaves, in page order.
    leaves: Vec<String>,
    /// Level arrays, `levels[0]` being the padded leaf level and the last
    /// level holding the root alone. Empty when there are no leaves.
    levels: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Build a tree from ordered leaf hashes.
    ///
    /// Zero leaves is legal: the tree has no root and no proofs.
    pub fn build(leaves: Vec<String>) -> Self {
        let levels = build_levels(&leaves);
        Self { leaves, levels }
    }

    /// The root hash, or `None` for an empty tree.
    ///
    /// A single-leaf tree's root equals that leaf.
    pub fn root(&self) -> Option<&str> {
        self.levels.last().and_then(|top| top.first()).map(String::as_str)
    }

    /// Number of real leaves (padding excluded).
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// The real leaves, in page order.
    pub fn leaves(&self) -> &[String] {
        &self.leaves
    }

    /// Generate an inclusion proof for the 0-indexed leaf `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, CoreError> {
        if index >= self.leaves.len() {
            return Err(CoreError::InvalidPageIndex(index));
        }

        // Root is guaranteed: index < leaves.len() implies a non-empty tree.
        let root = self.root().expect("non-empty tree has a root").to_string();

        let mut path = Vec::new();
        let mut current = index;

        // Padding makes every level below the root even-length, so the
        // sibling always exists.
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_index, side) = if current % 2 == 0 {
                (current + 1, Side::Right)
            } else {
                (current - 1, Side::Left)
            };
            path.push((level[sibling_index].clone(), side));
            current /= 2;
        }

        Ok(MerkleProof {
            page_number: index as u32 + 1,
            leaf_hash: self.leaves[index].clone(),
            path,
            root_hash: root,
        })
    }

    /// Position-wise comparison against the full original leaf list,
    /// returning the 1-indexed pages whose hashes differ.
    ///
    /// This requires possession of the complete original hash list, not
    /// just a trusted root; localizing tampering from a root alone would
    /// instead need a per-page inclusion proof for every page.
    pub fn find_tampered_pages(&self, original: &[String]) -> Vec<u32> {
        original
            .iter()
            .zip(self.leaves.iter())
            .enumerate()
            .filter(|(_, (orig, current))| orig != current)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }
}

/// Build the level arrays bottom-up from the (unpadded) leaves.
fn build_levels(leaves: &[String]) -> Vec<Vec<String>> {
    if leaves.is_empty() {
        return Vec::new();
    }

    // Pad to the next power of two by duplicating the last real leaf.
    let padded_len = leaves.len().next_power_of_two();
    let mut level: Vec<String> = leaves.to_vec();
    while level.len() < padded_len {
        level.push(level[level.len() - 1].clone());
    }

    let mut levels = vec![level];
    while levels.last().map_or(0, Vec::len) > 1 {
        let current = levels.last().expect("at least one level");
        let next: Vec<String> = current
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
        levels.push(next);
    }

    levels
}
