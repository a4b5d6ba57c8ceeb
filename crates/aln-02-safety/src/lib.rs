//! # Safety Verifier
//!
//! **Crate:** aln-02
//!
//! Pure checks run on a typed [`Chainlexeme`] before it is admitted to the
//! mempool. Each check returns a [`SafetyReport`]; errors reject the
//! transaction, warnings are passed back to the submitter.
//!
//! | Check | Applies to |
//! |-------|------------|
//! | [`verify_conservation`] | `transfer`, `token_transfer` |
//! | [`verify_limits`] | every operation |
//! | [`verify_signature_format`] | every operation |
//!
//! Balances are not consulted here. Whether the sender can afford a
//! transfer is decided by the ledger at apply time.

pub mod domain;

pub use domain::conservation::{read_amount, verify_conservation, AmountReading};
pub use domain::limits::{verify_limits, verify_limits_with, SafetyLimits, KNOWN_CONSTRAINTS};
pub use domain::report::{SafetyError, SafetyReport, SafetyViolation, SafetyWarning};
pub use domain::signature::verify_signature_format;

use aln_01_chainlexeme::Chainlexeme;
use shared_types::Timestamp;
use tracing::debug;

/// Run every check and merge the findings.
pub fn verify_all(tx: &Chainlexeme, now: Timestamp) -> SafetyReport {
    let report = verify_conservation(tx)
        .merge(verify_limits(tx, now))
        .merge(verify_signature_format(tx));

    debug!(
        op_code = %tx.op_code(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "safety checks complete"
    );
    report
}
