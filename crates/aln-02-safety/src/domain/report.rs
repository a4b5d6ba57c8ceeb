//! Safety findings.

use shared_types::{Amount, Timestamp};
use thiserror::Error;

/// A check failure that rejects the transaction before admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyViolation {
    #[error("amount is missing")]
    MissingAmount,

    #[error("amount cannot be negative: {0}")]
    NegativeAmount(String),

    #[error("amount exceeds maximum allowed value: {0}")]
    AmountExceedsMaximum(String),

    #[error("amount is not an integer: {0}")]
    MalformedAmount(String),

    #[error("gas_limit {gas_limit} outside [{min}, {max}]")]
    GasLimitOutOfRange { gas_limit: u64, min: u64, max: u64 },

    #[error("{field} = {value} outside [{min}, {max}]")]
    ProposalParameterOutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },

    #[error("{field} must be numeric, got `{value}`")]
    InvalidProposalParameter { field: &'static str, value: String },

    #[error("migration proof_hash is missing")]
    MissingProofHash,

    #[error("migration proof_hash is malformed: {0}")]
    MalformedProofHash(String),

    #[error("migration source_tx_hash is missing")]
    MissingSourceTxHash,

    #[error("{count} constraints exceed the maximum of {max}")]
    TooManyConstraints { count: usize, max: usize },

    #[error("signature must use ed25519: prefix")]
    InvalidSignatureFormat,
}

/// An advisory finding; the transaction is still admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SafetyWarning {
    #[error("zero-value transfer")]
    ZeroValueTransfer,

    #[error("self-transfer")]
    SelfTransfer,

    #[error("gas_price {0} outside the recommended range")]
    GasPriceOutOfRange(u64),

    #[error("high-value transfer of {0} without high_value_approved constraint")]
    HighValueWithoutApproval(Amount),

    #[error("unknown constraint `{0}`")]
    UnknownConstraint(String),

    #[error("timestamp {timestamp} is more than {tolerance}s from now ({now})")]
    TimestampSkew {
        timestamp: Timestamp,
        now: Timestamp,
        tolerance: u64,
    },
}

/// Result of one or more safety checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyReport {
    pub errors: Vec<SafetyViolation>,
    pub warnings: Vec<SafetyWarning>,
}

impl SafetyReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, violation: SafetyViolation) {
        self.errors.push(violation);
    }

    pub(crate) fn warn(&mut self, warning: SafetyWarning) {
        self.warnings.push(warning);
    }

    /// Append the findings of another report.
    pub fn merge(mut self, other: SafetyReport) -> Self {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self
    }

    /// Warnings on success, the violations otherwise.
    pub fn into_result(self) -> Result<Vec<SafetyWarning>, SafetyError> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(SafetyError {
                violations: self.errors,
            })
        }
    }
}

/// Rejection carrying every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("safety check failed: {}", join(.violations))]
pub struct SafetyError {
    pub violations: Vec<SafetyViolation>,
}

fn join(violations: &[SafetyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
