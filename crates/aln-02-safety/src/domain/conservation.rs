//! Conservation-of-value pre-check.
//!
//! Only verifies that the amount is well-formed and bounded. The balance
//! itself is checked by the ledger when the transfer is applied.

use super::report::{SafetyReport, SafetyViolation, SafetyWarning};
use aln_01_chainlexeme::{Chainlexeme, Value};
use shared_types::{Amount, PrimitiveError};

/// How an `amount` field reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountReading {
    Valid(Amount),
    Negative(String),
    Overflow(String),
    Malformed(String),
}

/// Classify an amount field.
pub fn read_amount(value: &Value) -> AmountReading {
    if let Value::String(text) = value {
        let text = text.trim();
        if let Some(magnitude) = text.strip_prefix('-') {
            let numeric = !magnitude.is_empty()
                && magnitude
                    .split_once('.')
                    .map(|(w, f)| is_digits(w) && is_digits(f))
                    .unwrap_or_else(|| is_digits(magnitude));
            if numeric {
                return AmountReading::Negative(text.to_string());
            }
        }
    }

    match value.to_amount() {
        Ok(amount) => AmountReading::Valid(amount),
        Err(PrimitiveError::AmountOverflow(text)) => AmountReading::Overflow(text),
        Err(_) => AmountReading::Malformed(value.to_plain_string()),
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Check a value-moving transaction's amount.
///
/// Applies to `transfer` and `token_transfer`; every other operation
/// passes untouched.
pub fn verify_conservation(tx: &Chainlexeme) -> SafetyReport {
    let mut report = SafetyReport::default();

    if !tx.op_code().is_value_transfer() {
        return report;
    }

    match tx.data_field("amount").map(read_amount) {
        None => report.error(SafetyViolation::MissingAmount),
        Some(AmountReading::Negative(text)) => report.error(SafetyViolation::NegativeAmount(text)),
        Some(AmountReading::Overflow(text)) => {
            report.error(SafetyViolation::AmountExceedsMaximum(text))
        }
        Some(AmountReading::Malformed(text)) => {
            report.error(SafetyViolation::MalformedAmount(text))
        }
        Some(AmountReading::Valid(amount)) if amount.is_zero() => {
            report.warn(SafetyWarning::ZeroValueTransfer)
        }
        Some(AmountReading::Valid(_)) => {}
    }

    if tx.from() == tx.to() {
        report.warn(SafetyWarning::SelfTransfer);
    }

    report
}
