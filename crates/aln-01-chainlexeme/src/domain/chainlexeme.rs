//! Typed, immutable chainlexeme transactions.

use super::document::{ParsedDocument, Section, DATA, HEADER};
use super::errors::{Result, StructuralError};
use super::serializer::{serialize, serialize_section};
use super::validator::validate;
use super::value::Value;
use crate::ports::signer::{is_ed25519_signature_format, Signer, SignerError};
use serde::{Deserialize, Serialize};
use shared_types::{sha256, Hash, Timestamp};
use std::fmt;
use std::str::FromStr;

/// Operation kinds a chainlexeme may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCode {
    Transfer,
    GovernanceProposal,
    GovernanceVote,
    MigrationLock,
    MigrationMint,
    MigrationBurn,
    TokenMint,
    TokenTransfer,
    Delegation,
}

impl OpCode {
    pub const ALL: [OpCode; 9] = [
        OpCode::Transfer,
        OpCode::GovernanceProposal,
        OpCode::GovernanceVote,
        OpCode::MigrationLock,
        OpCode::MigrationMint,
        OpCode::MigrationBurn,
        OpCode::TokenMint,
        OpCode::TokenTransfer,
        OpCode::Delegation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpCode::Transfer => "transfer",
            OpCode::GovernanceProposal => "governance_proposal",
            OpCode::GovernanceVote => "governance_vote",
            OpCode::MigrationLock => "migration_lock",
            OpCode::MigrationMint => "migration_mint",
            OpCode::MigrationBurn => "migration_burn",
            OpCode::TokenMint => "token_mint",
            OpCode::TokenTransfer => "token_transfer",
            OpCode::Delegation => "delegation",
        }
    }

    /// Operations that move value between two accounts.
    pub fn is_value_transfer(&self) -> bool {
        matches!(self, OpCode::Transfer | OpCode::TokenTransfer)
    }

    pub fn is_governance(&self) -> bool {
        matches!(self, OpCode::GovernanceProposal | OpCode::GovernanceVote)
    }

    /// Operations expected to link back to a chat transcript.
    pub fn expects_chat_metadata(&self) -> bool {
        matches!(
            self,
            OpCode::GovernanceProposal
                | OpCode::GovernanceVote
                | OpCode::MigrationLock
                | OpCode::MigrationMint
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpCode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        OpCode::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Routing and identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub op_code: OpCode,
    pub from: String,
    pub to: String,
    pub nonce: u64,
    pub chat_context_id: Option<String>,
    pub transcript_hash: Option<String>,
    pub jurisdiction_tags: Option<Vec<String>>,
    /// Header fields outside the known set, kept for hashing and round-trips.
    pub extra: Section,
}

/// Authorization and resource fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    pub signature: String,
    pub timestamp: Timestamp,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u64>,
    pub extra: Section,
}

/// A structurally valid transaction.
///
/// Only constructed through [`Chainlexeme::from_document`], so every
/// instance has passed [`validate`]. Fields are read-only; signing yields
/// a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chainlexeme {
    header: Header,
    data: Section,
    footer: Footer,
}

impl Chainlexeme {
    /// Convert a parsed document into a typed transaction.
    ///
    /// Fails with every structural error found by [`validate`].
    pub fn from_document(doc: &ParsedDocument) -> Result<Self> {
        let report = validate(doc);
        if !report.errors.is_empty() {
            return Err(StructuralError {
                errors: report.errors,
            });
        }

        let mut header_fields = doc.header.clone();
        let mut take = |key: &str| header_fields.remove(key);

        // validate() guarantees presence and shape of the required fields
        let op_code = take("op_code")
            .map(|v| v.to_plain_string())
            .and_then(|s| s.parse().ok())
            .unwrap_or(OpCode::Transfer);
        let from = take("from").map(|v| v.to_plain_string()).unwrap_or_default();
        let to = take("to").map(|v| v.to_plain_string()).unwrap_or_default();
        let nonce = take("nonce").and_then(|v| v.as_u64()).unwrap_or_default();
        let chat_context_id = take("chat_context_id").map(|v| v.to_plain_string());
        let transcript_hash = take("transcript_hash").map(|v| v.to_plain_string());
        let jurisdiction_tags = take("jurisdiction_tags").map(|v| {
            v.as_list()
                .unwrap_or_default()
                .iter()
                .map(Value::to_plain_string)
                .collect()
        });

        let mut footer_fields = doc.footer.clone();
        let signature = footer_fields
            .remove("signature")
            .map(|v| v.to_plain_string())
            .unwrap_or_default();
        let timestamp = footer_fields
            .remove("timestamp")
            .and_then(|v| v.as_u64())
            .unwrap_or_default();
        let gas_limit = footer_fields.remove("gas_limit").and_then(|v| v.as_u64());
        let gas_price = footer_fields.remove("gas_price").and_then(|v| v.as_u64());

        Ok(Self {
            header: Header {
                op_code,
                from,
                to,
                nonce,
                chat_context_id,
                transcript_hash,
                jurisdiction_tags,
                extra: header_fields,
            },
            data: doc.data.clone(),
            footer: Footer {
                signature,
                timestamp,
                gas_limit,
                gas_price,
                extra: footer_fields,
            },
        })
    }

    /// Parse and convert in one step.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_document(&super::parser::parse(text))
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn data(&self) -> &Section {
        &self.data
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn op_code(&self) -> OpCode {
        self.header.op_code
    }

    pub fn from(&self) -> &str {
        &self.header.from
    }

    pub fn to(&self) -> &str {
        &self.header.to
    }

    pub fn nonce(&self) -> u64 {
        self.header.nonce
    }

    pub fn timestamp(&self) -> Timestamp {
        self.footer.timestamp
    }

    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// A data field rendered as plain text.
    pub fn data_text(&self, key: &str) -> Option<String> {
        self.data.get(key).map(Value::to_plain_string)
    }

    /// Constraint tags from `data.constraints`; a scalar counts as one tag.
    pub fn constraints(&self) -> Vec<String> {
        match self.data.get("constraints") {
            Some(Value::List(items)) => items.iter().map(Value::to_plain_string).collect(),
            Some(other) => vec![other.to_plain_string()],
            None => Vec::new(),
        }
    }

    /// True when either chat-linkage field is present.
    pub fn has_chat_metadata(&self) -> bool {
        self.header.chat_context_id.is_some() || self.header.transcript_hash.is_some()
    }

    /// Back to the untyped document form.
    pub fn to_document(&self) -> ParsedDocument {
        let mut doc = ParsedDocument::new();

        let header = &mut doc.header;
        header.extend(self.header.extra.clone());
        header.insert("op_code".into(), Value::from(self.header.op_code.as_str()));
        header.insert("from".into(), Value::from(self.header.from.as_str()));
        header.insert("to".into(), Value::from(self.header.to.as_str()));
        header.insert("nonce".into(), Value::from(self.header.nonce));
        if let Some(id) = &self.header.chat_context_id {
            header.insert("chat_context_id".into(), Value::from(id.as_str()));
        }
        if let Some(hash) = &self.header.transcript_hash {
            header.insert("transcript_hash".into(), Value::from(hash.as_str()));
        }
        if let Some(tags) = &self.header.jurisdiction_tags {
            let tags = tags.iter().map(|t| Value::from(t.as_str())).collect();
            header.insert("jurisdiction_tags".into(), Value::List(tags));
        }

        doc.data = self.data.clone();

        let footer = &mut doc.footer;
        footer.extend(self.footer.extra.clone());
        footer.insert("signature".into(), Value::from(self.footer.signature.as_str()));
        footer.insert("timestamp".into(), Value::from(self.footer.timestamp));
        if let Some(limit) = self.footer.gas_limit {
            footer.insert("gas_limit".into(), Value::from(limit));
        }
        if let Some(price) = self.footer.gas_price {
            footer.insert("gas_price".into(), Value::from(price));
        }

        doc
    }

    /// Canonical text encoding: the serialized document form.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serialize(&self.to_document()).into_bytes()
    }

    /// Content hash identifying this transaction in the mempool and in blocks.
    pub fn hash(&self) -> Hash {
        sha256(&self.canonical_bytes())
    }

    /// Digest handed to a signer: header followed by data, footer excluded.
    pub fn signing_digest(&self) -> Hash {
        let doc = self.to_document();
        let mut text = serialize_section(HEADER, &doc.header);
        text.push_str(&serialize_section(DATA, &doc.data));
        sha256(text.as_bytes())
    }

    /// A copy of this transaction carrying `signature`.
    pub fn with_signature(&self, signature: impl Into<String>) -> Self {
        let mut signed = self.clone();
        signed.footer.signature = signature.into();
        signed
    }

    /// Have `signer` sign the digest and return the signed copy.
    pub fn sign_with(&self, signer: &dyn Signer) -> std::result::Result<Self, SignerError> {
        let signature = signer.sign(&self.signing_digest())?;
        if !is_ed25519_signature_format(&signature) {
            return Err(SignerError::MalformedSignature(signature));
        }
        Ok(self.with_signature(signature))
    }
}
