use crate::ports::KvStoreError;
use aln_01_chainlexeme::OpCode;
use shared_types::Amount;
use thiserror::Error;

/// Ledger failures.
///
/// Everything except [`LedgerError::Storage`] is a verdict on a single
/// transaction. A storage fault means the ledger itself could not proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid nonce for {address}: expected {expected}, got {actual}")]
    InvalidNonce {
        address: String,
        expected: u64,
        actual: u64,
    },

    #[error("insufficient {asset} balance for {address}: have {available}, need {required}")]
    InsufficientBalance {
        address: String,
        asset: String,
        available: Amount,
        required: Amount,
    },

    #[error("{asset} balance of {address} would overflow")]
    BalanceOverflow { address: String, asset: String },

    #[error("tally for proposal {0} would overflow")]
    TallyOverflow(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("{op_code} is missing data field `{field}`")]
    MissingField {
        op_code: OpCode,
        field: &'static str,
    },

    #[error("proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("proposal already exists: {0}")]
    ProposalExists(String),

    #[error("migration already minted for source transaction {0}")]
    MigrationAlreadyMinted(String),

    #[error("unsupported op_code: {0}")]
    UnsupportedOpCode(OpCode),

    #[error("failed to encode record: {0}")]
    Serialization(String),

    #[error("storage fault: {0}")]
    Storage(#[from] KvStoreError),
}

impl LedgerError {
    /// True when the store failed rather than the transaction.
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }

    /// True when the error rejects only the offending transaction and the
    /// rest of the block can proceed.
    pub fn is_recoverable(&self) -> bool {
        !self.is_storage_fault()
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
