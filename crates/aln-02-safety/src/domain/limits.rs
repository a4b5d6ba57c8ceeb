//! Resource and rate limits.

use super::conservation::{read_amount, AmountReading};
use super::report::{SafetyReport, SafetyViolation, SafetyWarning};
use aln_01_chainlexeme::{Chainlexeme, OpCode, Value};
use shared_types::{Amount, Timestamp};

/// Constraint tags a transaction may declare in `data.constraints`.
pub const KNOWN_CONSTRAINTS: [&str; 6] = [
    "rate_limit_daily",
    "compliance_kyc",
    "high_value_approved",
    "proof_verified",
    "escrow_confirmed",
    "min_stake_requirement",
];

pub const HIGH_VALUE_APPROVAL: &str = "high_value_approved";

/// Bounds enforced by [`verify_limits_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyLimits {
    pub min_gas_limit: u64,
    pub max_gas_limit: u64,
    pub min_gas_price: u64,
    pub max_gas_price: u64,
    /// Transfers above this need the `high_value_approved` constraint.
    pub high_value_threshold: Amount,
    pub min_duration_blocks: f64,
    pub max_duration_blocks: f64,
    pub min_quorum: f64,
    pub max_quorum: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub max_constraints: usize,
    pub timestamp_tolerance_secs: u64,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            min_gas_limit: 21_000,
            max_gas_limit: 10_000_000,
            min_gas_price: 1,
            max_gas_price: 1_000_000,
            // 10,000 ALN at 18 decimals
            high_value_threshold: Amount::from(10_000u64)
                .checked_mul(Amount::exp10(18))
                .unwrap_or(Amount::MAX),
            min_duration_blocks: 1_000.0,
            max_duration_blocks: 100_000.0,
            min_quorum: 0.1,
            max_quorum: 1.0,
            min_threshold: 0.5,
            max_threshold: 1.0,
            max_constraints: 10,
            timestamp_tolerance_secs: 300,
        }
    }
}

/// Check limits with the default bounds.
pub fn verify_limits(tx: &Chainlexeme, now: Timestamp) -> SafetyReport {
    verify_limits_with(tx, &SafetyLimits::default(), now)
}

/// Check gas, high-value approval, governance parameters, migration
/// proofs, constraint tags and timestamp skew.
///
/// A nonce is an unsigned integer once typed, so negative nonces are
/// already rejected by structural validation.
pub fn verify_limits_with(tx: &Chainlexeme, limits: &SafetyLimits, now: Timestamp) -> SafetyReport {
    let mut report = SafetyReport::default();

    check_gas(tx, limits, &mut report);
    check_high_value(tx, limits, &mut report);

    match tx.op_code() {
        OpCode::GovernanceProposal => check_proposal(tx, limits, &mut report),
        OpCode::MigrationMint | OpCode::MigrationBurn => check_migration_proof(tx, &mut report),
        _ => {}
    }

    check_constraints(tx, limits, &mut report);

    let timestamp = tx.timestamp();
    if timestamp.abs_diff(now) > limits.timestamp_tolerance_secs {
        report.warn(SafetyWarning::TimestampSkew {
            timestamp,
            now,
            tolerance: limits.timestamp_tolerance_secs,
        });
    }

    report
}

fn check_gas(tx: &Chainlexeme, limits: &SafetyLimits, report: &mut SafetyReport) {
    let gas_limit = tx.footer().gas_limit.unwrap_or(0);
    if gas_limit < limits.min_gas_limit || gas_limit > limits.max_gas_limit {
        report.error(SafetyViolation::GasLimitOutOfRange {
            gas_limit,
            min: limits.min_gas_limit,
            max: limits.max_gas_limit,
        });
    }

    if let Some(gas_price) = tx.footer().gas_price {
        if gas_price < limits.min_gas_price || gas_price > limits.max_gas_price {
            report.warn(SafetyWarning::GasPriceOutOfRange(gas_price));
        }
    }
}

fn check_high_value(tx: &Chainlexeme, limits: &SafetyLimits, report: &mut SafetyReport) {
    if !tx.op_code().is_value_transfer() {
        return;
    }
    let Some(AmountReading::Valid(amount)) = tx.data_field("amount").map(read_amount) else {
        return;
    };
    if amount > limits.high_value_threshold
        && !tx.constraints().iter().any(|c| c == HIGH_VALUE_APPROVAL)
    {
        report.warn(SafetyWarning::HighValueWithoutApproval(amount));
    }
}

fn check_proposal(tx: &Chainlexeme, limits: &SafetyLimits, report: &mut SafetyReport) {
    let ranges = [
        ("duration_blocks", limits.min_duration_blocks, limits.max_duration_blocks),
        ("quorum", limits.min_quorum, limits.max_quorum),
        ("threshold", limits.min_threshold, limits.max_threshold),
    ];

    for (field, min, max) in ranges {
        let Some(value) = tx.data_field(field) else {
            continue;
        };
        match value.as_f64() {
            Some(number) if number >= min && number <= max => {}
            Some(_) => report.error(SafetyViolation::ProposalParameterOutOfRange {
                field,
                value: value.to_plain_string(),
                min: Value::from(min).to_plain_string(),
                max: Value::from(max).to_plain_string(),
            }),
            None => report.error(SafetyViolation::InvalidProposalParameter {
                field,
                value: value.to_plain_string(),
            }),
        }
    }
}

fn check_migration_proof(tx: &Chainlexeme, report: &mut SafetyReport) {
    match tx.data_text("proof_hash") {
        None => report.error(SafetyViolation::MissingProofHash),
        Some(proof) if !is_proof_hash(&proof) => {
            report.error(SafetyViolation::MalformedProofHash(proof))
        }
        Some(_) => {}
    }

    let has_source = tx
        .data_text("source_tx_hash")
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    if !has_source {
        report.error(SafetyViolation::MissingSourceTxHash);
    }
}

/// `0x` followed by exactly 64 hex characters.
fn is_proof_hash(text: &str) -> bool {
    text.len() == 66
        && text
            .strip_prefix("0x")
            .map(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false)
}

fn check_constraints(tx: &Chainlexeme, limits: &SafetyLimits, report: &mut SafetyReport) {
    let constraints = tx.constraints();
    if constraints.len() > limits.max_constraints {
        report.error(SafetyViolation::TooManyConstraints {
            count: constraints.len(),
            max: limits.max_constraints,
        });
    }
    for constraint in constraints {
        if !KNOWN_CONSTRAINTS.contains(&constraint.as_str()) {
            report.warn(SafetyWarning::UnknownConstraint(constraint));
        }
    }
}
