//! # Block Model
//!
//! **Crate:** aln-04
//!
//! ## Purpose
//!
//! Defines blocks and headers, the header hash and transaction root they
//! commit to, and the pure checks that prove a chain is linked and
//! untampered.
//!
//! ## Header Hash
//!
//! SHA-256 over the UTF-8 string
//! `version|height|timestamp|parent_hash|state_root|tx_root|validator_set_hash|proposer`,
//! with every hash rendered as 64 lowercase hex characters.
//!
//! ## Verification
//!
//! | Check | Error |
//! |-------|-------|
//! | height = parent height + 1 | [`ConsensusError::InvalidHeight`] |
//! | parent hash matches | [`ConsensusError::InvalidParentHash`] |
//! | parent finalized | [`ConsensusError::ParentNotFinalized`] |
//! | timestamp strictly increasing | [`ConsensusError::NonIncreasingTimestamp`] |
//! | tx root recomputes | [`ConsensusError::InvalidTxRoot`] |
//! | hash present and recomputes | [`ConsensusError::MissingHash`], [`ConsensusError::InvalidBlockHash`] |

pub mod domain;

pub use domain::block::{Block, BlockHeader, BLOCK_VERSION};
pub use domain::errors::{BlockError, ConsensusError, Result};
pub use domain::verify::{verify_block, verify_chain, verify_genesis, BlockVerification, ChainFault};
