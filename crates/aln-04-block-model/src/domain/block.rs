//! Blocks and headers.

use super::errors::BlockError;
use aln_01_chainlexeme::Chainlexeme;
use serde::{Deserialize, Serialize};
use shared_types::{hash_to_hex, merkle_root, sha256, Hash, Timestamp, ZERO_HASH};

pub const BLOCK_VERSION: u32 = 1;

/// Block header.
///
/// `hash` is `None` until [`Block::finalize`] fills it in, and is always
/// recomputed from the other fields, never set by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub height: u64,
    pub timestamp: Timestamp,
    pub parent_hash: Hash,
    pub state_root: Hash,
    pub tx_root: Hash,
    /// Zero for a single-authority chain.
    pub validator_set_hash: Hash,
    pub proposer: String,
    pub hash: Option<Hash>,
}

impl BlockHeader {
    /// A provisional header chained to `parent_hash`.
    pub fn new(
        height: u64,
        timestamp: Timestamp,
        parent_hash: Hash,
        proposer: impl Into<String>,
    ) -> Self {
        Self {
            version: BLOCK_VERSION,
            height,
            timestamp,
            parent_hash,
            state_root: ZERO_HASH,
            tx_root: ZERO_HASH,
            validator_set_hash: ZERO_HASH,
            proposer: proposer.into(),
            hash: None,
        }
    }

    /// The `|`-joined fields the header hash commits to.
    pub fn hash_preimage(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.version,
            self.height,
            self.timestamp,
            hash_to_hex(&self.parent_hash),
            hash_to_hex(&self.state_root),
            hash_to_hex(&self.tx_root),
            hash_to_hex(&self.validator_set_hash),
            self.proposer,
        )
    }

    pub fn compute_hash(&self) -> Hash {
        sha256(self.hash_preimage().as_bytes())
    }
}

/// A header and its ordered transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Chainlexeme>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Chainlexeme>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Height 0, zero parent, no transactions, already finalized.
    pub fn genesis(proposer: impl Into<String>, state_root: Hash, timestamp: Timestamp) -> Self {
        let header = BlockHeader::new(0, timestamp, ZERO_HASH, proposer);
        let mut block = Self::new(header, Vec::new());
        block.seal(state_root);
        block
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp
    }

    pub fn hash(&self) -> Option<Hash> {
        self.header.hash
    }

    pub fn is_finalized(&self) -> bool {
        self.header.hash.is_some()
    }

    /// Merkle root over the transactions' content hashes, in block order.
    pub fn compute_tx_root(&self) -> Hash {
        merkle_root(self.transactions.iter().map(Chainlexeme::hash).collect())
    }

    /// Fill in the transaction root, state root and hash.
    ///
    /// Called once, after the ledger has applied the transactions.
    pub fn finalize(&mut self, state_root: Hash) -> Result<Hash, BlockError> {
        if self.is_finalized() {
            return Err(BlockError::AlreadyFinalized {
                height: self.header.height,
            });
        }
        Ok(self.seal(state_root))
    }

    fn seal(&mut self, state_root: Hash) -> Hash {
        self.header.tx_root = self.compute_tx_root();
        self.header.state_root = state_root;
        let hash = self.header.compute_hash();
        self.header.hash = Some(hash);
        hash
    }
}
