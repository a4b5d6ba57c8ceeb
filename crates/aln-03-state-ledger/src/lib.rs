//! # State Ledger
//!
//! **Crate:** aln-03
//!
//! ## Purpose
//!
//! Owns account, proposal, migration and audit records, applies
//! transactions to them, and computes the state root committed in every
//! block header.
//!
//! ## Key Namespaces
//!
//! | Prefix | Record |
//! |--------|--------|
//! | `acc:{address}` | [`Account`] |
//! | `prop:{proposal_id}` | [`Proposal`] |
//! | `mig:{source_tx_hash}` | [`MigrationRecord`] |
//! | `audit:{from}:{timestamp}:{nonce}:{op_code}` | [`AuditRecord`] |
//!
//! Values are JSON. Amounts are decimal strings.
//!
//! ## Atomicity
//!
//! A transaction's writes are staged and only merged into the block's
//! pending set when it succeeds. [`Ledger::apply_block`] commits the
//! pending set through [`KeyValueStore::atomic_batch_write`], or discards
//! it on a storage fault.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::InMemoryKvStore;
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbKvStore};
pub use domain::cache::CacheStats;
pub use domain::config::LedgerConfig;
pub use domain::entities::{
    Account, AppliedTransaction, AuditRecord, BlockApplication, FailedTransaction,
    MigrationRecord, MigrationStatus, Proposal, StateChange, VoteChoice, VoterRecord,
};
pub use domain::errors::{LedgerError, Result};
pub use domain::ledger::Ledger;
pub use domain::state_root::{compute_root, entry_hash};
pub use ports::{BatchOperation, KeyValueStore, KvStoreError, ScanResult};
