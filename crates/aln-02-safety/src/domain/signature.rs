//! Signature shape check.
//!
//! Cryptographic verification is the signer's concern; the node only
//! checks that the footer carries an ed25519-tagged signature.

use super::report::{SafetyReport, SafetyViolation};
use aln_01_chainlexeme::ports::signer::SIGNATURE_PREFIX;
use aln_01_chainlexeme::Chainlexeme;

pub fn verify_signature_format(tx: &Chainlexeme) -> SafetyReport {
    let mut report = SafetyReport::default();
    if !tx.footer().signature.starts_with(SIGNATURE_PREFIX) {
        report.error(SafetyViolation::InvalidSignatureFormat);
    }
    report
}
