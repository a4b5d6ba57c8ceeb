//! Admission policy port.

use aln_01_chainlexeme::Chainlexeme;

/// Verdict of a [`PolicyValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Accept,
    Reject(String),
}

impl PolicyDecision {
    pub fn reject(reason: impl Into<String>) -> Self {
        PolicyDecision::Reject(reason.into())
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, PolicyDecision::Accept)
    }
}

/// Last admission check, run after structural and safety validation.
pub trait PolicyValidator: Send + Sync {
    fn validate_transaction(&self, tx: &Chainlexeme) -> PolicyDecision;
}
