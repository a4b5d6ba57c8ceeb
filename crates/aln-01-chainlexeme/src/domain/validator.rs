//! Structural validation of parsed documents.
//!
//! Checks shape only. Nonces are compared against ledger state at apply
//! time, never here.

use super::chainlexeme::OpCode;
use super::document::{ParsedDocument, DATA, FOOTER, HEADER};
use super::errors::{DocumentError, DocumentWarning};
use crate::ports::signer::SIGNATURE_PREFIX;
use shared_types::is_aln_address;

/// Gas below this draws a warning here and a rejection from the safety limits.
pub const MIN_GAS_LIMIT: u64 = 21_000;

const REQUIRED_HEADER_FIELDS: [&str; 4] = ["op_code", "from", "to", "nonce"];
const REQUIRED_FOOTER_FIELDS: [&str; 2] = ["signature", "timestamp"];
const CHAT_FIELDS: [&str; 2] = ["chat_context_id", "transcript_hash"];

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<DocumentError>,
    pub warnings: Vec<DocumentWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Data fields each operation cannot do without.
pub fn required_data_fields(op_code: OpCode) -> &'static [&'static str] {
    match op_code {
        OpCode::Transfer | OpCode::TokenTransfer | OpCode::MigrationMint => &["amount"],
        OpCode::GovernanceVote => &["proposal_id", "support"],
        OpCode::GovernanceProposal => &["proposal_id", "title", "category"],
        _ => &[],
    }
}

/// Enumerate structural errors and advisory warnings.
pub fn validate(doc: &ParsedDocument) -> ValidationReport {
    let mut report = ValidationReport::default();

    for diagnostic in &doc.diagnostics {
        report
            .warnings
            .push(DocumentWarning::ParseDiagnostic(diagnostic.clone()));
    }

    for (name, section) in [(HEADER, &doc.header), (DATA, &doc.data), (FOOTER, &doc.footer)] {
        if section.is_empty() {
            report.errors.push(DocumentError::MissingSection(name));
        }
    }

    validate_header(doc, &mut report);
    validate_footer(doc, &mut report);

    report
}

fn validate_header(doc: &ParsedDocument, report: &mut ValidationReport) {
    if doc.header.is_empty() {
        return;
    }
    let header = &doc.header;

    for field in REQUIRED_HEADER_FIELDS {
        if !header.contains_key(field) {
            report.errors.push(DocumentError::MissingHeaderField(field));
        }
    }

    if let Some(tags) = header.get("jurisdiction_tags") {
        if !tags.is_list() {
            report.errors.push(DocumentError::JurisdictionTagsNotList);
        }
    }

    let op_code = header.get("op_code").and_then(|raw| {
        let text = raw.to_plain_string();
        match text.parse::<OpCode>() {
            Ok(op) => Some(op),
            Err(_) => {
                report.errors.push(DocumentError::InvalidOpCode(text));
                None
            }
        }
    });

    for field in ["from", "to"] {
        if let Some(value) = header.get(field) {
            let is_valid = value.as_str().map(is_aln_address).unwrap_or(false);
            if !is_valid {
                report.errors.push(DocumentError::InvalidAddress {
                    field,
                    value: value.to_plain_string(),
                });
            }
        }
    }

    if let Some(nonce) = header.get("nonce") {
        if nonce.as_u64().is_none() {
            report
                .errors
                .push(DocumentError::InvalidNonce(nonce.to_plain_string()));
        }
    }

    let Some(op_code) = op_code else {
        return;
    };

    for &field in required_data_fields(op_code) {
        if !doc.data.contains_key(field) {
            report
                .errors
                .push(DocumentError::MissingDataField { op_code, field });
        }
    }

    if op_code.expects_chat_metadata() {
        for field in CHAT_FIELDS {
            if !header.contains_key(field) {
                report
                    .warnings
                    .push(DocumentWarning::MissingChatMetadata { op_code, field });
            }
        }
    }
}

fn validate_footer(doc: &ParsedDocument, report: &mut ValidationReport) {
    if doc.footer.is_empty() {
        return;
    }
    let footer = &doc.footer;

    for field in REQUIRED_FOOTER_FIELDS {
        if !footer.contains_key(field) {
            report.errors.push(DocumentError::MissingFooterField(field));
        }
    }

    if let Some(timestamp) = footer.get("timestamp") {
        match timestamp.as_u64() {
            Some(ts) if ts > 0 => {}
            _ => report
                .errors
                .push(DocumentError::InvalidTimestamp(timestamp.to_plain_string())),
        }
    }

    if let Some(signature) = footer.get("signature") {
        if !signature.to_plain_string().starts_with(SIGNATURE_PREFIX) {
            report.warnings.push(DocumentWarning::UnprefixedSignature);
        }
    }

    for field in ["gas_limit", "gas_price"] {
        let Some(value) = footer.get(field) else {
            continue;
        };
        match value.as_u64() {
            Some(limit) if field == "gas_limit" && limit < MIN_GAS_LIMIT => {
                report.warnings.push(DocumentWarning::LowGasLimit(limit));
            }
            Some(_) => {}
            None => report.errors.push(DocumentError::InvalidGasField {
                field,
                value: value.to_plain_string(),
            }),
        }
    }
}
