//! State root over a key/value set.
//!
//! Each entry hashes to `sha256(key || value)`. The hashes are sorted, so
//! insertion order never matters, then folded with the shared pairwise
//! Merkle algorithm. An empty set yields the zero hash.

use shared_types::{merkle_root, sha256_concat, Hash};

pub fn entry_hash(key: &[u8], value: &[u8]) -> Hash {
    sha256_concat(&[key, value])
}

pub fn compute_root<'a, I>(entries: I) -> Hash
where
    I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
{
    let mut hashes: Vec<Hash> = entries
        .into_iter()
        .map(|(key, value)| entry_hash(key, value))
        .collect();
    hashes.sort_unstable();
    merkle_root(hashes)
}
