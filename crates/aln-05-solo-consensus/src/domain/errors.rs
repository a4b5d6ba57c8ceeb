use aln_01_chainlexeme::{DocumentError, DocumentWarning, StructuralError};
use aln_02_safety::{SafetyError, SafetyWarning};
use std::fmt;
use thiserror::Error;

pub use aln_04_block_model::{ConsensusError, Result};

/// Why a transaction was refused admission to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("structural validation failed: {}", join(.0))]
    Structural(Vec<DocumentError>),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("rejected by policy: {0}")]
    Policy(String),
}

impl SubmissionError {
    /// Label used for the submission outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::Structural(_) => "structural",
            SubmissionError::Safety(_) => "safety",
            SubmissionError::Policy(_) => "policy",
        }
    }
}

impl From<StructuralError> for SubmissionError {
    fn from(err: StructuralError) -> Self {
        SubmissionError::Structural(err.errors)
    }
}

fn join(errors: &[DocumentError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// An advisory finding returned with an admitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitWarning {
    Document(DocumentWarning),
    Safety(SafetyWarning),
}

impl fmt::Display for SubmitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitWarning::Document(w) => write!(f, "{}", w),
            SubmitWarning::Safety(w) => write!(f, "{}", w),
        }
    }
}
