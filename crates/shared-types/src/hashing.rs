//! Hashing utilities shared by the ledger and the block model.
//!
//! Both the state root and the transaction root fold their leaves with
//! [`merkle_root`], so a verifier only needs one algorithm.

use crate::entities::{Hash, ZERO_HASH};
use sha2::{Digest, Sha256};

/// Compute SHA-256 of data.
#[inline]
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute SHA-256 over the concatenation of several parts.
#[inline]
pub fn sha256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Fold leaves pairwise into a single root.
///
/// Each level hashes `left || right`; an odd last element is paired with
/// itself. No leaves yields [`ZERO_HASH`], one leaf is its own root.
pub fn merkle_root(leaves: Vec<Hash>) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }

    let mut level = leaves;
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                sha256_concat(&[left.as_slice(), right.as_slice()])
            })
            .collect();
    }
    level[0]
}
