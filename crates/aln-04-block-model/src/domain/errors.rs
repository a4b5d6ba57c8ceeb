use shared_types::Timestamp;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("block {height} is already finalized")]
    AlreadyFinalized { height: u64 },
}

/// Consensus failures: chain verification mismatches and scheduler
/// lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    #[error("invalid height: expected {expected}, got {actual}")]
    InvalidHeight { expected: u64, actual: u64 },

    #[error("invalid parent hash: expected {expected}, got {actual}")]
    InvalidParentHash { expected: String, actual: String },

    #[error("parent block {height} is not finalized")]
    ParentNotFinalized { height: u64 },

    #[error("block timestamp {block} must be greater than parent timestamp {parent}")]
    NonIncreasingTimestamp { parent: Timestamp, block: Timestamp },

    #[error("block {height} has no hash")]
    MissingHash { height: u64 },

    #[error("invalid block hash: computed {computed}, header has {recorded}")]
    InvalidBlockHash { computed: String, recorded: String },

    #[error("invalid transaction root: computed {computed}, header has {recorded}")]
    InvalidTxRoot { computed: String, recorded: String },

    #[error("invalid genesis block: {0}")]
    InvalidGenesis(String),

    #[error("chain is not initialized")]
    NotInitialized,

    #[error("block production is already running")]
    AlreadyRunning,

    #[error("no async runtime to run block production on")]
    NoRuntime,

    #[error("ledger unavailable: {0}")]
    Ledger(String),

    #[error("batch for height {height} failed, transactions restored: {reason}")]
    Batch { height: u64, reason: String },

    #[error(transparent)]
    Block(#[from] BlockError),
}

impl ConsensusError {
    /// True for mismatches found while verifying a block.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            ConsensusError::InvalidHeight { .. }
                | ConsensusError::InvalidParentHash { .. }
                | ConsensusError::ParentNotFinalized { .. }
                | ConsensusError::NonIncreasingTimestamp { .. }
                | ConsensusError::MissingHash { .. }
                | ConsensusError::InvalidBlockHash { .. }
                | ConsensusError::InvalidTxRoot { .. }
                | ConsensusError::InvalidGenesis(_)
        )
    }

    /// True when retrying on a later tick can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConsensusError::Batch { .. } | ConsensusError::Ledger(_))
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
