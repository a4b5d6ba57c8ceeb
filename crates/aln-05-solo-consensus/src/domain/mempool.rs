//! FIFO pool of admitted transactions.

use aln_01_chainlexeme::Chainlexeme;
use shared_types::{Hash, Timestamp};
use std::collections::VecDeque;

/// An admitted transaction waiting for a block.
#[derive(Debug, Clone, PartialEq)]
pub struct MempoolEntry {
    pub chainlexeme: Chainlexeme,
    pub hash: Hash,
    pub arrival_timestamp: Timestamp,
}

impl MempoolEntry {
    pub fn new(chainlexeme: Chainlexeme, arrival_timestamp: Timestamp) -> Self {
        let hash = chainlexeme.hash();
        Self {
            chainlexeme,
            hash,
            arrival_timestamp,
        }
    }
}

/// Arrival-ordered pool. No deduplication: a resubmitted transaction is
/// admitted again and fails its nonce check at apply time.
#[derive(Debug, Default)]
pub struct Mempool {
    entries: VecDeque<MempoolEntry>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and return the new size.
    pub fn push(&mut self, entry: MempoolEntry) -> usize {
        self.entries.push_back(entry);
        self.entries.len()
    }

    /// Take up to `max` entries from the front, oldest first.
    pub fn drain(&mut self, max: usize) -> Vec<MempoolEntry> {
        let count = max.min(self.entries.len());
        self.entries.drain(..count).collect()
    }

    /// Put a drained batch back at the front, keeping its order ahead of
    /// anything admitted since.
    pub fn restore_front(&mut self, batch: Vec<MempoolEntry>) {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aln_01_chainlexeme::DocumentBuilder;

    fn entry(nonce: u64) -> MempoolEntry {
        let tx = DocumentBuilder::transfer("aln1alice", "aln1bob", 1u64, nonce)
            .timestamp(1_700_000_000)
            .build_chainlexeme()
            .unwrap();
        MempoolEntry::new(tx, 1_700_000_000 + nonce)
    }

    #[test]
    fn test_drain_is_fifo_and_bounded() {
        let mut pool = Mempool::new();
        for nonce in 0..5 {
            pool.push(entry(nonce));
        }

        let batch = pool.drain(3);
        let nonces: Vec<u64> = batch.iter().map(|e| e.chainlexeme.nonce()).collect();
        assert_eq!(nonces, vec![0, 1, 2]);
        assert_eq!(pool.len(), 2);

        assert_eq!(pool.drain(10).len(), 2);
        assert!(pool.is_empty());
        assert!(pool.drain(10).is_empty());
    }

    #[test]
    fn test_restore_front_keeps_order() {
        let mut pool = Mempool::new();
        for nonce in 0..3 {
            pool.push(entry(nonce));
        }
        let batch = pool.drain(2);
        pool.push(entry(3));
        pool.restore_front(batch);

        let expected: Vec<Hash> = (0..4).map(|n| entry(n).hash).collect();
        let drained: Vec<Hash> = pool.drain(10).iter().map(|e| e.hash).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_entry_hash_matches_transaction() {
        let e = entry(7);
        assert_eq!(e.hash, e.chainlexeme.hash());
    }

    #[test]
    fn test_duplicates_admitted() {
        let mut pool = Mempool::new();
        pool.push(entry(0));
        assert_eq!(pool.push(entry(0)), 2);
    }
}
