//! Chat metadata and jurisdiction policy.

use crate::ports::{PolicyDecision, PolicyValidator};
use aln_01_chainlexeme::{Chainlexeme, OpCode};

/// Jurisdiction tags a transaction may carry.
pub const JURISDICTIONS: [&str; 9] = [
    "US_federal",
    "EU",
    "UK",
    "cross_border",
    "US_state_CA",
    "US_state_NY",
    "GDPR",
    "CCPA",
    "JFMIP",
];

/// Rejects transactions whose chat metadata or jurisdiction tags are out
/// of bounds, and governance or migration transactions that lack the
/// metadata they need.
#[derive(Debug, Clone)]
pub struct ChatMetadataPolicy {
    pub max_chat_context_id_len: usize,
    pub max_transcript_hash_len: usize,
    pub max_jurisdiction_tags: usize,
    pub allowed_jurisdictions: Vec<String>,
}

impl Default for ChatMetadataPolicy {
    fn default() -> Self {
        Self {
            max_chat_context_id_len: 36,
            max_transcript_hash_len: 64,
            max_jurisdiction_tags: 10,
            allowed_jurisdictions: JURISDICTIONS.iter().map(|j| j.to_string()).collect(),
        }
    }
}

impl ChatMetadataPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_metadata(&self, tx: &Chainlexeme) -> Result<(), String> {
        let header = tx.header();

        if let Some(ctx) = &header.chat_context_id {
            if ctx.chars().count() > self.max_chat_context_id_len {
                return Err("chat_context_id exceeds allowed length".into());
            }
        }
        if let Some(hash) = &header.transcript_hash {
            if hash.chars().count() > self.max_transcript_hash_len {
                return Err("transcript_hash exceeds allowed length".into());
            }
        }
        if let Some(tags) = &header.jurisdiction_tags {
            if tags.len() > self.max_jurisdiction_tags {
                return Err("jurisdiction_tags exceeds allowed length".into());
            }
            if let Some(tag) = tags
                .iter()
                .find(|tag| !self.allowed_jurisdictions.contains(*tag))
            {
                return Err(format!("invalid jurisdiction tag {}", tag));
            }
        }
        Ok(())
    }

    fn check_required(&self, tx: &Chainlexeme) -> Result<(), String> {
        let header = tx.header();
        let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());

        match tx.op_code() {
            op if op.is_governance() => {
                if !present(&header.chat_context_id) {
                    return Err("governance transactions require chat_context_id".into());
                }
                if !present(&header.transcript_hash) {
                    return Err("governance transactions require transcript_hash".into());
                }
            }
            OpCode::MigrationMint => {
                if !present(&header.transcript_hash) {
                    return Err("migration_mint requires transcript_hash".into());
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl PolicyValidator for ChatMetadataPolicy {
    fn validate_transaction(&self, tx: &Chainlexeme) -> PolicyDecision {
        match self
            .check_metadata(tx)
            .and_then(|()| self.check_required(tx))
        {
            Ok(()) => PolicyDecision::Accept,
            Err(reason) => PolicyDecision::Reject(reason),
        }
    }
}
