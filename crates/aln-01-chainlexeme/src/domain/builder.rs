//! Fluent construction of chainlexeme documents.

use super::chainlexeme::{Chainlexeme, OpCode};
use super::document::ParsedDocument;
use super::errors::Result;
use super::serializer::serialize;
use super::value::Value;
use shared_types::{Amount, SystemTimeSource, TimeSource, Timestamp};

/// Council address that governance transactions are sent to.
pub const GOVERNANCE_ADDRESS: &str = "aln1governance000000000000000000000000000";

/// Gas limit for a plain transfer.
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

pub const DEFAULT_GAS_PRICE: u64 = 100;

/// Signature placeholder used until a signer replaces it.
pub const UNSIGNED_SIGNATURE: &str = "ed25519:0x00";

/// Builds a [`ParsedDocument`] with wallet defaults for the footer.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    doc: ParsedDocument,
}

impl DocumentBuilder {
    pub fn new(op_code: OpCode, from: &str, to: &str, nonce: u64) -> Self {
        let mut doc = ParsedDocument::new();
        doc.header.insert("op_code".into(), Value::from(op_code.as_str()));
        doc.header.insert("from".into(), Value::from(from));
        doc.header.insert("to".into(), Value::from(to));
        doc.header.insert("nonce".into(), Value::from(nonce));

        doc.footer
            .insert("signature".into(), Value::from(UNSIGNED_SIGNATURE));
        doc.footer
            .insert("timestamp".into(), Value::from(SystemTimeSource.now()));
        doc.footer
            .insert("gas_limit".into(), Value::from(DEFAULT_GAS_LIMIT));
        doc.footer
            .insert("gas_price".into(), Value::from(DEFAULT_GAS_PRICE));

        Self { doc }
    }

    pub fn transfer(from: &str, to: &str, amount: impl Into<Amount>, nonce: u64) -> Self {
        Self::new(OpCode::Transfer, from, to, nonce).amount(amount)
    }

    pub fn token_transfer(
        from: &str,
        to: &str,
        asset: &str,
        amount: impl Into<Amount>,
        nonce: u64,
    ) -> Self {
        Self::new(OpCode::TokenTransfer, from, to, nonce)
            .amount(amount)
            .data("asset", asset)
    }

    pub fn governance_proposal(
        from: &str,
        proposal_id: &str,
        title: &str,
        category: &str,
        nonce: u64,
    ) -> Self {
        Self::new(OpCode::GovernanceProposal, from, GOVERNANCE_ADDRESS, nonce)
            .data("proposal_id", proposal_id)
            .data("title", title)
            .data("category", category)
    }

    pub fn governance_vote(from: &str, proposal_id: &str, support: &str, nonce: u64) -> Self {
        Self::new(OpCode::GovernanceVote, from, GOVERNANCE_ADDRESS, nonce)
            .data("proposal_id", proposal_id)
            .data("support", support)
    }

    pub fn migration_mint(
        from: &str,
        to: &str,
        amount: impl Into<Amount>,
        source_tx_hash: &str,
        proof_hash: &str,
        nonce: u64,
    ) -> Self {
        Self::new(OpCode::MigrationMint, from, to, nonce)
            .amount(amount)
            .data("source_tx_hash", source_tx_hash)
            .data("proof_hash", proof_hash)
    }

    pub fn delegation(from: &str, delegate: &str, nonce: u64) -> Self {
        Self::new(OpCode::Delegation, from, delegate, nonce).data("delegate_to", delegate)
    }

    pub fn amount(self, amount: impl Into<Amount>) -> Self {
        let digits = amount.into().to_string();
        self.data("amount", Value::Integer(digits))
    }

    pub fn data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.doc.data.insert(key.to_string(), value.into());
        self
    }

    pub fn header_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.doc.header.insert(key.to_string(), value.into());
        self
    }

    pub fn footer_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.doc.footer.insert(key.to_string(), value.into());
        self
    }

    pub fn remove_footer_field(mut self, key: &str) -> Self {
        self.doc.footer.remove(key);
        self
    }

    /// Attach chat-linkage metadata.
    pub fn chat(self, chat_context_id: &str, transcript_hash: &str) -> Self {
        self.header_field("chat_context_id", chat_context_id)
            .header_field("transcript_hash", transcript_hash)
    }

    pub fn jurisdiction(self, tags: &[&str]) -> Self {
        let tags = tags.iter().map(|t| Value::from(*t)).collect::<Vec<_>>();
        self.header_field("jurisdiction_tags", Value::List(tags))
    }

    pub fn timestamp(self, timestamp: Timestamp) -> Self {
        self.footer_field("timestamp", timestamp)
    }

    pub fn signature(self, signature: &str) -> Self {
        self.footer_field("signature", signature)
    }

    pub fn gas(self, gas_limit: u64, gas_price: u64) -> Self {
        self.footer_field("gas_limit", gas_limit)
            .footer_field("gas_price", gas_price)
    }

    pub fn build(self) -> ParsedDocument {
        self.doc
    }

    pub fn build_chainlexeme(self) -> Result<Chainlexeme> {
        Chainlexeme::from_document(&self.doc)
    }

    pub fn to_text(&self) -> String {
        serialize(&self.doc)
    }
}
