//! # Ledger Entities
//!
//! Records persisted under the ledger's key namespaces. All of them are
//! stored as JSON, with amounts as decimal strings.

use aln_01_chainlexeme::OpCode;
use serde::{Deserialize, Serialize};
use shared_types::{Amount, Hash, Timestamp, NATIVE_ASSET};
use std::collections::BTreeMap;

/// Account state under `acc:{address}`.
///
/// The native asset lives in `balance`; every other asset id lives in
/// `token_balances`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    /// Count of applied transactions sent from this account. Never decreases.
    pub nonce: u64,
    pub balance: Amount,
    #[serde(default)]
    pub token_balances: BTreeMap<String, Amount>,
    pub voting_power: Amount,
    pub delegated_to: Option<String>,
    /// Reserved for contract accounts.
    pub code_hash: Option<String>,
    pub storage_root: Option<String>,
}

impl Account {
    /// A fresh account with all-zero defaults.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            nonce: 0,
            balance: Amount::ZERO,
            token_balances: BTreeMap::new(),
            voting_power: Amount::ZERO,
            delegated_to: None,
            code_hash: None,
            storage_root: None,
        }
    }

    pub fn with_balance(mut self, balance: impl Into<Amount>) -> Self {
        self.balance = balance.into();
        self
    }

    pub fn with_voting_power(mut self, power: impl Into<Amount>) -> Self {
        self.voting_power = power.into();
        self
    }

    pub fn balance_of(&self, asset: &str) -> Amount {
        if asset == NATIVE_ASSET {
            self.balance
        } else {
            self.token_balances.get(asset).copied().unwrap_or_default()
        }
    }

    pub fn set_balance_of(&mut self, asset: &str, amount: Amount) {
        if asset == NATIVE_ASSET {
            self.balance = amount;
        } else {
            self.token_balances.insert(asset.to_string(), amount);
        }
    }
}

/// How a vote's power is tallied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

impl VoteChoice {
    /// `for` and `against` select their tally; anything else abstains.
    pub fn from_support(support: &str) -> Self {
        match support {
            "for" => VoteChoice::For,
            "against" => VoteChoice::Against,
            _ => VoteChoice::Abstain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub address: String,
    pub support: VoteChoice,
    pub power: Amount,
}

/// Governance proposal under `prop:{proposal_id}`.
///
/// Tallies change only by applying `governance_vote` transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: String,
    pub title: String,
    pub category: String,
    pub proposer: String,
    pub votes_for: Amount,
    pub votes_against: Amount,
    pub votes_abstain: Amount,
    #[serde(default)]
    pub voters: Vec<VoterRecord>,
    pub duration_blocks: Option<u64>,
    pub quorum: Option<f64>,
    pub threshold: Option<f64>,
    pub created_at: Timestamp,
}

impl Proposal {
    pub fn new(
        proposal_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        proposer: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            proposal_id: proposal_id.into(),
            title: title.into(),
            category: category.into(),
            proposer: proposer.into(),
            votes_for: Amount::ZERO,
            votes_against: Amount::ZERO,
            votes_abstain: Amount::ZERO,
            voters: Vec::new(),
            duration_blocks: None,
            quorum: None,
            threshold: None,
            created_at,
        }
    }

    pub fn tally(&self, choice: VoteChoice) -> Amount {
        match choice {
            VoteChoice::For => self.votes_for,
            VoteChoice::Against => self.votes_against,
            VoteChoice::Abstain => self.votes_abstain,
        }
    }

    pub(crate) fn tally_mut(&mut self, choice: VoteChoice) -> &mut Amount {
        match choice {
            VoteChoice::For => &mut self.votes_for,
            VoteChoice::Against => &mut self.votes_against,
            VoteChoice::Abstain => &mut self.votes_abstain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Minted,
}

/// Cross-chain mint under `mig:{source_tx_hash}`. One per source hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub source_chain: Option<String>,
    pub source_tx_hash: String,
    pub dest_address: String,
    pub asset: String,
    pub amount: Amount,
    pub proof_hash: Option<String>,
    pub status: MigrationStatus,
    pub created_at: Timestamp,
}

/// Chat-linkage trail under `audit:{from}:{timestamp}:{nonce}:{op_code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub from: String,
    pub to: String,
    pub op_code: OpCode,
    pub nonce: u64,
    pub chat_context_id: Option<String>,
    pub transcript_hash: Option<String>,
    pub jurisdiction_tags: Option<Vec<String>>,
    pub timestamp: Timestamp,
}

/// One observable effect of an applied transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateChange {
    BalanceDecrease {
        address: String,
        asset: String,
        amount: Amount,
    },
    BalanceIncrease {
        address: String,
        asset: String,
        amount: Amount,
    },
    ProposalCreated {
        proposal_id: String,
    },
    VoteCast {
        proposal_id: String,
        voter: String,
        support: VoteChoice,
        power: Amount,
    },
    MigrationMint {
        address: String,
        asset: String,
        amount: Amount,
        source_tx_hash: String,
    },
    Delegation {
        from: String,
        to: String,
    },
    NonceIncrement {
        address: String,
        nonce: u64,
    },
    ChatMetadata {
        chat_context_id: Option<String>,
        transcript_hash: Option<String>,
        jurisdiction_tags: Option<Vec<String>>,
    },
}

/// Outcome of a successful `apply_transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransaction {
    pub tx_hash: Hash,
    pub state_changes: Vec<StateChange>,
}

/// A transaction dropped while applying a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTransaction {
    /// Position within the block's transaction list.
    pub index: usize,
    pub tx_hash: Hash,
    pub reason: String,
}

/// Outcome of `apply_block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockApplication {
    pub state_root: Hash,
    pub applied: usize,
    pub failed: Vec<FailedTransaction>,
}
