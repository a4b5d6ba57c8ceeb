//! Structural errors and advisory warnings for chainlexeme documents.

use super::chainlexeme::OpCode;
use thiserror::Error;

/// A fatal structural defect. The transaction must be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("missing [{0}] section")]
    MissingSection(&'static str),

    #[error("missing header field `{0}`")]
    MissingHeaderField(&'static str),

    #[error("invalid op_code `{0}`")]
    InvalidOpCode(String),

    #[error("`{field}` must start with aln1, got `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("nonce must be a non-negative integer, got `{0}`")]
    InvalidNonce(String),

    #[error("jurisdiction_tags must be a list")]
    JurisdictionTagsNotList,

    #[error("missing footer field `{0}`")]
    MissingFooterField(&'static str),

    #[error("timestamp must be a positive integer, got `{0}`")]
    InvalidTimestamp(String),

    #[error("`{field}` must be a non-negative integer, got `{value}`")]
    InvalidGasField { field: &'static str, value: String },

    #[error("{op_code} requires data field `{field}`")]
    MissingDataField { op_code: OpCode, field: &'static str },
}

/// A non-fatal finding. Policy collaborators may still reject on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentWarning {
    #[error("{op_code} should carry chat metadata `{field}`")]
    MissingChatMetadata { op_code: OpCode, field: &'static str },

    #[error("signature is not ed25519-prefixed")]
    UnprefixedSignature,

    #[error("gas_limit {0} is below the 21000 minimum")]
    LowGasLimit(u64),

    #[error("parser: {0}")]
    ParseDiagnostic(String),
}

/// Raised when a document with structural errors is turned into a
/// typed chainlexeme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("structural validation failed: {}", join_errors(.errors))]
pub struct StructuralError {
    pub errors: Vec<DocumentError>,
}

fn join_errors(errors: &[DocumentError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, StructuralError>;
