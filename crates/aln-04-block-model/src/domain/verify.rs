//! Block verification.
//!
//! Pure checks over already-built blocks. Every check runs, so a
//! tampered block reports all of its mismatches at once.

use super::block::Block;
use super::errors::ConsensusError;
use shared_types::{hash_to_hex, ZERO_HASH};
use thiserror::Error;

/// Outcome of [`verify_block`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockVerification {
    pub errors: Vec<ConsensusError>,
}

impl BlockVerification {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), Vec<ConsensusError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// A block in a chain that failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {height} failed verification with {} error(s)", .errors.len())]
pub struct ChainFault {
    pub height: u64,
    pub errors: Vec<ConsensusError>,
}

/// Check `block` against its `parent`.
///
/// Recomputes the transaction root and header hash rather than trusting
/// the recorded ones.
pub fn verify_block(block: &Block, parent: &Block) -> BlockVerification {
    let mut errors = Vec::new();
    let header = &block.header;

    let expected_height = parent.header.height.saturating_add(1);
    if header.height != expected_height {
        errors.push(ConsensusError::InvalidHeight {
            expected: expected_height,
            actual: header.height,
        });
    }

    match parent.header.hash {
        None => errors.push(ConsensusError::ParentNotFinalized {
            height: parent.header.height,
        }),
        Some(parent_hash) if parent_hash != header.parent_hash => {
            errors.push(ConsensusError::InvalidParentHash {
                expected: hash_to_hex(&parent_hash),
                actual: hash_to_hex(&header.parent_hash),
            })
        }
        Some(_) => {}
    }

    if header.timestamp <= parent.header.timestamp {
        errors.push(ConsensusError::NonIncreasingTimestamp {
            parent: parent.header.timestamp,
            block: header.timestamp,
        });
    }

    check_roots_and_hash(block, &mut errors);

    BlockVerification { errors }
}

/// Check the shape of a genesis block: height 0, zero parent, no
/// transactions, and a hash matching its header.
pub fn verify_genesis(block: &Block) -> BlockVerification {
    let mut errors = Vec::new();
    let header = &block.header;

    if header.height != 0 {
        errors.push(ConsensusError::InvalidGenesis(format!(
            "height is {}",
            header.height
        )));
    }
    if header.parent_hash != ZERO_HASH {
        errors.push(ConsensusError::InvalidGenesis(format!(
            "parent hash is {}",
            hash_to_hex(&header.parent_hash)
        )));
    }
    if !block.transactions.is_empty() {
        errors.push(ConsensusError::InvalidGenesis(format!(
            "carries {} transaction(s)",
            block.transactions.len()
        )));
    }

    check_roots_and_hash(block, &mut errors);

    BlockVerification { errors }
}

/// Walk a chain from genesis, verifying each block against its parent.
///
/// Stops at the first faulty block.
pub fn verify_chain(blocks: &[Block]) -> Result<(), ChainFault> {
    let Some(genesis) = blocks.first() else {
        return Ok(());
    };

    let report = verify_genesis(genesis);
    if !report.is_valid() {
        return Err(ChainFault {
            height: genesis.header.height,
            errors: report.errors,
        });
    }

    for pair in blocks.windows(2) {
        let report = verify_block(&pair[1], &pair[0]);
        if !report.is_valid() {
            return Err(ChainFault {
                height: pair[1].header.height,
                errors: report.errors,
            });
        }
    }
    Ok(())
}

fn check_roots_and_hash(block: &Block, errors: &mut Vec<ConsensusError>) {
    let header = &block.header;

    let tx_root = block.compute_tx_root();
    if tx_root != header.tx_root {
        errors.push(ConsensusError::InvalidTxRoot {
            computed: hash_to_hex(&tx_root),
            recorded: hash_to_hex(&header.tx_root),
        });
    }

    match header.hash {
        None => errors.push(ConsensusError::MissingHash {
            height: header.height,
        }),
        Some(recorded) => {
            let computed = header.compute_hash();
            if computed != recorded {
                errors.push(ConsensusError::InvalidBlockHash {
                    computed: hash_to_hex(&computed),
                    recorded: hash_to_hex(&recorded),
                });
            }
        }
    }
}

impl Block {
    /// See [`verify_genesis`].
    pub fn verify_genesis(&self) -> BlockVerification {
        verify_genesis(self)
    }
}
