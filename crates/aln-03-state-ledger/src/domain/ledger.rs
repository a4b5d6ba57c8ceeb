//! # Ledger
//!
//! The single state-mutation entry point.
//!
//! ## Write Path
//!
//! ```text
//! apply_transaction ──> staged (one tx) ──ok──> pending (one block) ──commit──> store
//!                            │
//!                            └──err──> discarded
//! ```
//!
//! Reads look at the staged writes, then pending, then the account cache,
//! then the store. A transaction that fails leaves nothing behind, and a
//! block reaches the store in one atomic batch.

use super::cache::{AccountCache, CacheStats};
use super::config::LedgerConfig;
use super::entities::{
    Account, AppliedTransaction, AuditRecord, BlockApplication, FailedTransaction,
    MigrationRecord, MigrationStatus, Proposal, StateChange, VoteChoice, VoterRecord,
};
use super::errors::{LedgerError, Result};
use super::keys::{
    account_key, audit_key, migration_key, proposal_key, ACCOUNT_PREFIX, AUDIT_PREFIX,
};
use super::state_root::compute_root;
use crate::ports::{BatchOperation, KeyValueStore, KvStoreError};
use aln_01_chainlexeme::{Chainlexeme, OpCode, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{hash_to_hex, Amount, Hash, NATIVE_ASSET};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

type WriteSet = BTreeMap<Vec<u8>, Vec<u8>>;

pub struct Ledger<S: KeyValueStore> {
    store: S,
    pending: WriteSet,
    cache: AccountCache,
}

impl<S: KeyValueStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            pending: WriteSet::new(),
            cache: AccountCache::new(config.cache_capacity),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of keys written since the last commit or rollback.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub fn get_account(&mut self, address: &str) -> Result<Option<Account>> {
        self.load_account(&WriteSet::new(), address)
    }

    /// The stored account, or a zeroed one that is not yet persisted.
    pub fn get_or_create(&mut self, address: &str) -> Result<Account> {
        Ok(self
            .get_account(address)?
            .unwrap_or_else(|| Account::new(address)))
    }

    /// Write an account straight to the store.
    pub fn set_account(&mut self, address: &str, account: &Account) -> Result<()> {
        let key = account_key(address);
        self.store.put(key.as_bytes(), &encode(account)?)?;
        self.pending.remove(key.as_bytes());
        self.cache.invalidate(address);
        Ok(())
    }

    pub fn get_balance(&mut self, address: &str, asset: &str) -> Result<Amount> {
        Ok(self
            .get_account(address)?
            .map(|account| account.balance_of(asset))
            .unwrap_or_default())
    }

    /// Write-through balance update, creating the account if needed.
    pub fn set_balance(&mut self, address: &str, asset: &str, amount: Amount) -> Result<()> {
        let mut account = self.get_or_create(address)?;
        account.set_balance_of(asset, amount);
        self.set_account(address, &account)
    }

    // =========================================================================
    // Records
    // =========================================================================

    pub fn get_proposal(&self, proposal_id: &str) -> Result<Option<Proposal>> {
        self.load_record(None, &proposal_key(proposal_id))
    }

    pub fn get_migration(&self, source_tx_hash: &str) -> Result<Option<MigrationRecord>> {
        self.load_record(None, &migration_key(source_tx_hash))
    }

    /// Audit trail of transactions sent from `from`, ordered by key.
    pub fn audit_records(&self, from: &str) -> Result<Vec<AuditRecord>> {
        let prefix = format!("{}{}:", AUDIT_PREFIX, from);
        self.scan_merged(prefix.as_bytes())?
            .iter()
            .map(|(key, raw)| decode(&String::from_utf8_lossy(key), raw))
            .collect()
    }

    // =========================================================================
    // Apply
    // =========================================================================

    /// Apply one transaction to the pending write-set.
    ///
    /// Not idempotent: the sender's nonce advances on success, so applying
    /// the same transaction again fails with [`LedgerError::InvalidNonce`].
    pub fn apply_transaction(&mut self, tx: &Chainlexeme) -> Result<AppliedTransaction> {
        let mut staged = WriteSet::new();
        let mut changes = Vec::new();

        let from = tx.from();
        let mut sender = self
            .load_account(&staged, from)?
            .unwrap_or_else(|| Account::new(from));

        if sender.nonce != tx.nonce() {
            return Err(LedgerError::InvalidNonce {
                address: from.to_string(),
                expected: sender.nonce,
                actual: tx.nonce(),
            });
        }

        match tx.op_code() {
            OpCode::Transfer | OpCode::TokenTransfer => {
                self.apply_transfer(tx, &mut sender, &mut staged, &mut changes)?
            }
            OpCode::GovernanceVote => self.apply_vote(tx, &sender, &mut staged, &mut changes)?,
            OpCode::GovernanceProposal => self.apply_proposal(tx, &mut staged, &mut changes)?,
            OpCode::MigrationMint => {
                self.apply_migration_mint(tx, &mut sender, &mut staged, &mut changes)?
            }
            OpCode::Delegation => apply_delegation(tx, &mut sender, &mut changes),
            other => return Err(LedgerError::UnsupportedOpCode(other)),
        }

        sender.nonce += 1;
        changes.push(StateChange::NonceIncrement {
            address: from.to_string(),
            nonce: sender.nonce,
        });
        stage(&mut staged, &account_key(from), &sender)?;

        if tx.has_chat_metadata() {
            let header = tx.header();
            changes.push(StateChange::ChatMetadata {
                chat_context_id: header.chat_context_id.clone(),
                transcript_hash: header.transcript_hash.clone(),
                jurisdiction_tags: header.jurisdiction_tags.clone(),
            });
            self.stage_audit_record(tx, &mut staged);
        }

        self.pending.extend(staged);

        let tx_hash = tx.hash();
        debug!(
            tx_hash = %hash_to_hex(&tx_hash),
            op_code = %tx.op_code(),
            from = %from,
            changes = changes.len(),
            "[aln-03] Transaction applied"
        );

        Ok(AppliedTransaction {
            tx_hash,
            state_changes: changes,
        })
    }

    fn apply_transfer(
        &mut self,
        tx: &Chainlexeme,
        sender: &mut Account,
        staged: &mut WriteSet,
        changes: &mut Vec<StateChange>,
    ) -> Result<()> {
        let asset = asset_field(tx);
        let amount = amount_field(tx)?;
        let from = tx.from();
        let to = tx.to();

        let available = sender.balance_of(&asset);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    address: from.to_string(),
                    asset: asset.clone(),
                    available,
                    required: amount,
                })?;

        if to != from {
            let mut receiver = self
                .load_account(staged, to)?
                .unwrap_or_else(|| Account::new(to));
            credit(&mut receiver, &asset, amount)?;
            sender.set_balance_of(&asset, remaining);
            stage(staged, &account_key(to), &receiver)?;
        }

        changes.push(StateChange::BalanceDecrease {
            address: from.to_string(),
            asset: asset.clone(),
            amount,
        });
        changes.push(StateChange::BalanceIncrease {
            address: to.to_string(),
            asset,
            amount,
        });
        Ok(())
    }

    fn apply_vote(
        &mut self,
        tx: &Chainlexeme,
        voter: &Account,
        staged: &mut WriteSet,
        changes: &mut Vec<StateChange>,
    ) -> Result<()> {
        let proposal_id = required_text(tx, "proposal_id")?;
        let key = proposal_key(&proposal_id);
        let mut proposal: Proposal = self
            .load_record(Some(&*staged), &key)?
            .ok_or_else(|| LedgerError::ProposalNotFound(proposal_id.clone()))?;

        let choice = VoteChoice::from_support(&tx.data_text("support").unwrap_or_default());
        let power = voter.voting_power;

        let tally = proposal.tally_mut(choice);
        *tally = tally
            .checked_add(power)
            .ok_or_else(|| LedgerError::TallyOverflow(proposal_id.clone()))?;
        proposal.voters.push(VoterRecord {
            address: tx.from().to_string(),
            support: choice,
            power,
        });
        stage(staged, &key, &proposal)?;

        changes.push(StateChange::VoteCast {
            proposal_id,
            voter: tx.from().to_string(),
            support: choice,
            power,
        });
        Ok(())
    }

    fn apply_proposal(
        &mut self,
        tx: &Chainlexeme,
        staged: &mut WriteSet,
        changes: &mut Vec<StateChange>,
    ) -> Result<()> {
        let proposal_id = required_text(tx, "proposal_id")?;
        let key = proposal_key(&proposal_id);
        if self.lookup(Some(&*staged), &key)?.is_some() {
            return Err(LedgerError::ProposalExists(proposal_id));
        }

        let mut proposal = Proposal::new(
            proposal_id.clone(),
            required_text(tx, "title")?,
            required_text(tx, "category")?,
            tx.from(),
            tx.timestamp(),
        );
        proposal.duration_blocks = tx.data_field("duration_blocks").and_then(Value::as_u64);
        proposal.quorum = tx.data_field("quorum").and_then(Value::as_f64);
        proposal.threshold = tx.data_field("threshold").and_then(Value::as_f64);
        stage(staged, &key, &proposal)?;

        changes.push(StateChange::ProposalCreated { proposal_id });
        Ok(())
    }

    fn apply_migration_mint(
        &mut self,
        tx: &Chainlexeme,
        sender: &mut Account,
        staged: &mut WriteSet,
        changes: &mut Vec<StateChange>,
    ) -> Result<()> {
        let source_tx_hash = required_text(tx, "source_tx_hash")?;
        let key = migration_key(&source_tx_hash);
        if self.lookup(Some(&*staged), &key)?.is_some() {
            return Err(LedgerError::MigrationAlreadyMinted(source_tx_hash));
        }

        let asset = asset_field(tx);
        let amount = amount_field(tx)?;
        let to = tx.to();

        if to == tx.from() {
            credit(sender, &asset, amount)?;
        } else {
            let mut receiver = self
                .load_account(staged, to)?
                .unwrap_or_else(|| Account::new(to));
            credit(&mut receiver, &asset, amount)?;
            stage(staged, &account_key(to), &receiver)?;
        }

        let record = MigrationRecord {
            source_chain: tx.data_text("source_chain"),
            source_tx_hash: source_tx_hash.clone(),
            dest_address: to.to_string(),
            asset: asset.clone(),
            amount,
            proof_hash: tx.data_text("proof_hash"),
            status: MigrationStatus::Minted,
            created_at: tx.timestamp(),
        };
        stage(staged, &key, &record)?;

        changes.push(StateChange::MigrationMint {
            address: to.to_string(),
            asset,
            amount,
            source_tx_hash,
        });
        Ok(())
    }

    /// Audit records never fail the transaction.
    fn stage_audit_record(&self, tx: &Chainlexeme, staged: &mut WriteSet) {
        let header = tx.header();
        let record = AuditRecord {
            from: header.from.clone(),
            to: header.to.clone(),
            op_code: header.op_code,
            nonce: header.nonce,
            chat_context_id: header.chat_context_id.clone(),
            transcript_hash: header.transcript_hash.clone(),
            jurisdiction_tags: header.jurisdiction_tags.clone(),
            timestamp: tx.timestamp(),
        };
        let key = audit_key(
            &header.from,
            tx.timestamp(),
            header.nonce,
            header.op_code.as_str(),
        );
        if let Err(e) = stage(staged, &key, &record) {
            warn!(key = %key, error = %e, "[aln-03] Audit record skipped");
        }
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Apply a block's transactions in order, then commit.
    ///
    /// Transactions that fail are dropped and listed in the result. A
    /// storage fault discards every pending write and is returned as the
    /// error, leaving the store as it was.
    pub fn apply_block(&mut self, transactions: &[Chainlexeme]) -> Result<BlockApplication> {
        match self.apply_and_commit(transactions) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(error = %e, "[aln-03] Block application aborted, pending writes discarded");
                self.rollback();
                Err(e)
            }
        }
    }

    fn apply_and_commit(&mut self, transactions: &[Chainlexeme]) -> Result<BlockApplication> {
        let mut applied = 0;
        let mut failed = Vec::new();

        for (index, tx) in transactions.iter().enumerate() {
            match self.apply_transaction(tx) {
                Ok(_) => applied += 1,
                Err(e) if e.is_storage_fault() => return Err(e),
                Err(e) => {
                    let tx_hash = tx.hash();
                    warn!(
                        index,
                        tx_hash = %hash_to_hex(&tx_hash),
                        reason = %e,
                        "[aln-03] Transaction dropped"
                    );
                    failed.push(FailedTransaction {
                        index,
                        tx_hash,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let state_root = self.compute_state_root()?;
        self.commit()?;
        self.clear_cache();

        info!(
            applied,
            failed = failed.len(),
            state_root = %hash_to_hex(&state_root),
            "[aln-03] Block applied"
        );

        Ok(BlockApplication {
            state_root,
            applied,
            failed,
        })
    }

    /// Root over the store overlaid with pending writes.
    pub fn compute_state_root(&self) -> Result<Hash> {
        let mut entries: WriteSet = self.store.iter_all()?.into_iter().collect();
        entries.extend(self.pending.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(compute_root(
            entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())),
        ))
    }

    /// Flush pending writes in one atomic batch.
    ///
    /// On failure the pending set is kept, so the caller may retry or
    /// roll back.
    pub fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let operations = self
            .pending
            .iter()
            .map(|(k, v)| BatchOperation::put(k.clone(), v.clone()))
            .collect();
        self.store.atomic_batch_write(operations)?;

        // cached accounts predate the flushed writes
        for key in self.pending.keys() {
            if let Some(address) = key.strip_prefix(ACCOUNT_PREFIX.as_bytes()) {
                if let Ok(address) = std::str::from_utf8(address) {
                    self.cache.invalidate(address);
                }
            }
        }
        self.pending.clear();
        Ok(())
    }

    /// Discard pending writes.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn lookup(&self, staged: Option<&WriteSet>, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.as_bytes();
        if let Some(raw) = staged
            .and_then(|s| s.get(key))
            .or_else(|| self.pending.get(key))
        {
            return Ok(Some(raw.clone()));
        }
        Ok(self.store.get(key)?)
    }

    fn load_record<T: DeserializeOwned>(
        &self,
        staged: Option<&WriteSet>,
        key: &str,
    ) -> Result<Option<T>> {
        self.lookup(staged, key)?
            .map(|raw| decode(key, &raw))
            .transpose()
    }

    fn load_account(&mut self, staged: &WriteSet, address: &str) -> Result<Option<Account>> {
        let key = account_key(address);
        if let Some(raw) = staged
            .get(key.as_bytes())
            .or_else(|| self.pending.get(key.as_bytes()))
        {
            return decode(&key, raw).map(Some);
        }

        if let Some(account) = self.cache.get(address) {
            return Ok(Some(account));
        }

        match self.store.get(key.as_bytes())? {
            Some(raw) => {
                let account: Account = decode(&key, &raw)?;
                self.cache.put(account.clone());
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    fn scan_merged(&self, prefix: &[u8]) -> Result<WriteSet> {
        let mut entries: WriteSet = self.store.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .pending
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            entries.insert(key.clone(), value.clone());
        }
        Ok(entries)
    }
}

fn apply_delegation(tx: &Chainlexeme, sender: &mut Account, changes: &mut Vec<StateChange>) {
    let delegate = tx
        .data_text("delegate_to")
        .unwrap_or_else(|| tx.to().to_string());
    sender.delegated_to = Some(delegate.clone());
    changes.push(StateChange::Delegation {
        from: tx.from().to_string(),
        to: delegate,
    });
}

fn credit(account: &mut Account, asset: &str, amount: Amount) -> Result<()> {
    let credited = account
        .balance_of(asset)
        .checked_add(amount)
        .ok_or_else(|| LedgerError::BalanceOverflow {
            address: account.address.clone(),
            asset: asset.to_string(),
        })?;
    account.set_balance_of(asset, credited);
    Ok(())
}

fn asset_field(tx: &Chainlexeme) -> String {
    tx.data_text("asset")
        .filter(|asset| !asset.is_empty())
        .unwrap_or_else(|| NATIVE_ASSET.to_string())
}

fn amount_field(tx: &Chainlexeme) -> Result<Amount> {
    let value = tx
        .data_field("amount")
        .ok_or(LedgerError::MissingField {
            op_code: tx.op_code(),
            field: "amount",
        })?;
    value
        .to_amount()
        .map_err(|_| LedgerError::InvalidAmount(value.to_plain_string()))
}

fn required_text(tx: &Chainlexeme, field: &'static str) -> Result<String> {
    tx.data_text(field)
        .filter(|text| !text.is_empty())
        .ok_or(LedgerError::MissingField {
            op_code: tx.op_code(),
            field,
        })
}

fn stage<T: Serialize>(staged: &mut WriteSet, key: &str, value: &T) -> Result<()> {
    staged.insert(key.as_bytes().to_vec(), encode(value)?);
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(key: &str, raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|e| {
        LedgerError::Storage(KvStoreError::CorruptionError {
            message: format!("{}: {}", key, e),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKvStore;
    use crate::ports::ScanResult;
    use aln_01_chainlexeme::DocumentBuilder;
    use proptest::prelude::*;
    use shared_types::ZERO_HASH;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const ALICE: &str = "aln1alice";
    const BOB: &str = "aln1bob";
    const CAROL: &str = "aln1carol";
    const TS: u64 = 1_700_000_000;

    fn ledger() -> Ledger<InMemoryKvStore> {
        Ledger::new(InMemoryKvStore::new())
    }

    fn funded(balance: u64) -> Ledger<InMemoryKvStore> {
        let mut ledger = ledger();
        ledger
            .set_account(ALICE, &Account::new(ALICE).with_balance(balance))
            .unwrap();
        ledger
    }

    fn transfer(from: &str, to: &str, amount: impl Into<Amount>, nonce: u64) -> Chainlexeme {
        DocumentBuilder::transfer(from, to, amount, nonce)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap()
    }

    fn proposal(from: &str, id: &str, nonce: u64) -> Chainlexeme {
        DocumentBuilder::governance_proposal(from, id, "Raise limits", "protocol", nonce)
            .chat("ctx-1", "abc")
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap()
    }

    fn vote(from: &str, id: &str, support: &str, nonce: u64) -> Chainlexeme {
        DocumentBuilder::governance_vote(from, id, support, nonce)
            .chat("ctx-1", "abc")
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap()
    }

    fn mint(to: &str, amount: u64, source: &str, nonce: u64) -> Chainlexeme {
        DocumentBuilder::migration_mint("aln1bridge", to, amount, source, "0xproof", nonce)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap()
    }

    /// Store double whose reads or batch writes can be made to fail.
    #[derive(Default, Clone)]
    struct FaultyStore {
        inner: InMemoryKvStore,
        fail_reads: Arc<AtomicBool>,
        fail_writes: Arc<AtomicBool>,
    }

    impl FaultyStore {
        fn fault() -> KvStoreError {
            KvStoreError::IoError {
                message: "injected".into(),
            }
        }
    }

    impl KeyValueStore for FaultyStore {
        fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, KvStoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Self::fault());
            }
            self.inner.get(key)
        }

        fn put(&mut self, key: &[u8], value: &[u8]) -> std::result::Result<(), KvStoreError> {
            self.inner.put(key, value)
        }

        fn delete(&mut self, key: &[u8]) -> std::result::Result<(), KvStoreError> {
            self.inner.delete(key)
        }

        fn atomic_batch_write(
            &mut self,
            operations: Vec<BatchOperation>,
        ) -> std::result::Result<(), KvStoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Self::fault());
            }
            self.inner.atomic_batch_write(operations)
        }

        fn prefix_scan(&self, prefix: &[u8]) -> std::result::Result<ScanResult, KvStoreError> {
            self.inner.prefix_scan(prefix)
        }
    }

    #[test]
    fn test_get_or_create_defaults_without_persisting() {
        let mut ledger = ledger();
        let account = ledger.get_or_create(ALICE).unwrap();
        assert_eq!(account, Account::new(ALICE));
        assert!(ledger.get_account(ALICE).unwrap().is_none());
        assert!(ledger.store().is_empty());
    }

    #[test]
    fn test_set_balance_is_write_through() {
        let mut ledger = ledger();
        ledger.set_balance(ALICE, "USDX", Amount::from(7u64)).unwrap();
        assert_eq!(ledger.get_balance(ALICE, "USDX").unwrap(), Amount::from(7u64));
        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::ZERO);
        assert!(ledger.store().exists(b"acc:aln1alice").unwrap());
        assert_eq!(ledger.pending_writes(), 0);
    }

    #[test]
    fn test_transfer_moves_value_and_bumps_nonce() {
        let mut ledger = funded(1000);
        let applied = ledger.apply_transaction(&transfer(ALICE, BOB, 100u64, 0)).unwrap();

        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::from(900u64));
        assert_eq!(ledger.get_balance(BOB, NATIVE_ASSET).unwrap(), Amount::from(100u64));
        assert_eq!(ledger.get_account(ALICE).unwrap().unwrap().nonce, 1);
        assert!(applied.state_changes.contains(&StateChange::NonceIncrement {
            address: ALICE.into(),
            nonce: 1
        }));

        // nothing reaches the store before commit
        let stored: Account =
            serde_json::from_slice(&ledger.store().get(b"acc:aln1alice").unwrap().unwrap()).unwrap();
        assert_eq!(stored.balance, Amount::from(1000u64));

        ledger.commit().unwrap();
        let stored: Account =
            serde_json::from_slice(&ledger.store().get(b"acc:aln1alice").unwrap().unwrap()).unwrap();
        assert_eq!(stored.balance, Amount::from(900u64));
    }

    #[test]
    fn test_commit_refreshes_cached_accounts() {
        let mut ledger = funded(1000);
        ledger.apply_transaction(&transfer(ALICE, BOB, 100u64, 0)).unwrap();
        ledger.commit().unwrap();

        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::from(900u64));
        assert_eq!(ledger.get_account(ALICE).unwrap().unwrap().nonce, 1);

        let replay = ledger.apply_transaction(&transfer(ALICE, BOB, 100u64, 0));
        assert!(matches!(replay, Err(LedgerError::InvalidNonce { .. })));
        ledger.apply_transaction(&transfer(ALICE, BOB, 100u64, 1)).unwrap();
        ledger.commit().unwrap();
        assert_eq!(ledger.get_balance(BOB, NATIVE_ASSET).unwrap(), Amount::from(200u64));
    }

    #[test]
    fn test_token_transfer_uses_token_balances() {
        let mut ledger = ledger();
        ledger.set_balance(ALICE, "USDX", Amount::from(50u64)).unwrap();
        let tx = DocumentBuilder::token_transfer(ALICE, BOB, "USDX", 20u64, 0)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap();
        ledger.apply_transaction(&tx).unwrap();

        assert_eq!(ledger.get_balance(ALICE, "USDX").unwrap(), Amount::from(30u64));
        assert_eq!(ledger.get_balance(BOB, "USDX").unwrap(), Amount::from(20u64));
        assert_eq!(ledger.get_balance(BOB, NATIVE_ASSET).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut ledger = funded(10);
        ledger.apply_transaction(&transfer(ALICE, ALICE, 4u64, 0)).unwrap();
        let alice = ledger.get_account(ALICE).unwrap().unwrap();
        assert_eq!(alice.balance, Amount::from(10u64));
        assert_eq!(alice.nonce, 1);
    }

    #[test]
    fn test_insufficient_balance_leaves_no_trace() {
        let mut ledger = funded(50);
        let err = ledger
            .apply_transaction(&transfer(ALICE, BOB, 51u64, 0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.pending_writes(), 0);
        assert_eq!(ledger.get_account(ALICE).unwrap().unwrap().nonce, 0);
        assert!(ledger.get_account(BOB).unwrap().is_none());
    }

    #[test]
    fn test_double_apply_rejected_by_nonce() {
        let mut ledger = funded(1000);
        let tx = transfer(ALICE, BOB, 100u64, 0);
        ledger.apply_transaction(&tx).unwrap();
        let root = ledger.compute_state_root().unwrap();

        let err = ledger.apply_transaction(&tx).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidNonce {
                address: ALICE.into(),
                expected: 1,
                actual: 0
            }
        );
        assert_eq!(ledger.compute_state_root().unwrap(), root);
    }

    #[test]
    fn test_conservation_above_u128() {
        let big = Amount::from(u128::MAX)
            .checked_mul(Amount::from(1_000u64))
            .unwrap();
        let send = Amount::from(u128::MAX).checked_add(Amount::from(1u64)).unwrap();
        let mut ledger = ledger();
        ledger.set_balance(ALICE, NATIVE_ASSET, big).unwrap();

        ledger.apply_transaction(&transfer(ALICE, BOB, send, 0)).unwrap();
        let a = ledger.get_balance(ALICE, NATIVE_ASSET).unwrap();
        let b = ledger.get_balance(BOB, NATIVE_ASSET).unwrap();
        assert_eq!(a.checked_add(b).unwrap(), big);
        assert_eq!(b, send);
    }

    #[test]
    fn test_receiver_overflow_rejected() {
        let mut ledger = funded(1);
        ledger.set_balance(BOB, NATIVE_ASSET, Amount::MAX).unwrap();
        let err = ledger.apply_transaction(&transfer(ALICE, BOB, 1u64, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::from(1u64));
    }

    #[test]
    fn test_governance_flow() {
        let mut ledger = ledger();
        ledger
            .set_account(BOB, &Account::new(BOB).with_voting_power(40u64))
            .unwrap();
        ledger
            .set_account(CAROL, &Account::new(CAROL).with_voting_power(15u64))
            .unwrap();

        ledger.apply_transaction(&proposal(ALICE, "p1", 0)).unwrap();
        ledger.apply_transaction(&vote(BOB, "p1", "for", 0)).unwrap();
        ledger.apply_transaction(&vote(CAROL, "p1", "later", 0)).unwrap();

        let p = ledger.get_proposal("p1").unwrap().unwrap();
        assert_eq!(p.proposer, ALICE);
        assert_eq!(p.votes_for, Amount::from(40u64));
        assert_eq!(p.votes_abstain, Amount::from(15u64));
        assert_eq!(p.votes_against, Amount::ZERO);
        assert_eq!(p.voters.len(), 2);
        assert_eq!(p.voters[1].support, VoteChoice::Abstain);
    }

    #[test]
    fn test_proposal_parameters_recorded() {
        let mut ledger = ledger();
        let tx = DocumentBuilder::governance_proposal(ALICE, "p2", "Fees", "economic", 0)
            .data("duration_blocks", 5_000u64)
            .data("quorum", 0.4)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap();
        ledger.apply_transaction(&tx).unwrap();

        let p = ledger.get_proposal("p2").unwrap().unwrap();
        assert_eq!(p.duration_blocks, Some(5_000));
        assert_eq!(p.quorum, Some(0.4));
        assert_eq!(p.threshold, None);
        assert_eq!(p.created_at, TS);
    }

    #[test]
    fn test_duplicate_proposal_rejected() {
        let mut ledger = ledger();
        ledger.apply_transaction(&proposal(ALICE, "p1", 0)).unwrap();
        let err = ledger.apply_transaction(&proposal(ALICE, "p1", 1)).unwrap_err();
        assert_eq!(err, LedgerError::ProposalExists("p1".into()));
    }

    #[test]
    fn test_vote_on_missing_proposal() {
        let mut ledger = ledger();
        let err = ledger.apply_transaction(&vote(BOB, "nope", "for", 0)).unwrap_err();
        assert_eq!(err, LedgerError::ProposalNotFound("nope".into()));
        assert_eq!(ledger.get_account(BOB).unwrap(), None);
    }

    #[test]
    fn test_migration_mint_exactly_once() {
        let mut ledger = ledger();
        ledger.apply_transaction(&mint(ALICE, 500, "0xsrc1", 0)).unwrap();
        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::from(500u64));

        let record = ledger.get_migration("0xsrc1").unwrap().unwrap();
        assert_eq!(record.status, MigrationStatus::Minted);
        assert_eq!(record.dest_address, ALICE);
        assert_eq!(record.proof_hash.as_deref(), Some("0xproof"));

        let err = ledger.apply_transaction(&mint(ALICE, 500, "0xsrc1", 1)).unwrap_err();
        assert_eq!(err, LedgerError::MigrationAlreadyMinted("0xsrc1".into()));
        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::from(500u64));
    }

    #[test]
    fn test_migration_mint_needs_source_hash() {
        let mut ledger = ledger();
        let tx = DocumentBuilder::new(OpCode::MigrationMint, "aln1bridge", ALICE, 0)
            .data("amount", 5u64)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap();
        let err = ledger.apply_transaction(&tx).unwrap_err();
        assert_eq!(
            err,
            LedgerError::MissingField {
                op_code: OpCode::MigrationMint,
                field: "source_tx_hash"
            }
        );
    }

    #[test]
    fn test_delegation_prefers_data_field() {
        let mut ledger = ledger();
        let tx = DocumentBuilder::new(OpCode::Delegation, ALICE, BOB, 0)
            .data("delegate_to", CAROL)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap();
        ledger.apply_transaction(&tx).unwrap();
        assert_eq!(
            ledger.get_account(ALICE).unwrap().unwrap().delegated_to.as_deref(),
            Some(CAROL)
        );

        let tx = DocumentBuilder::new(OpCode::Delegation, ALICE, BOB, 1)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap();
        ledger.apply_transaction(&tx).unwrap();
        assert_eq!(
            ledger.get_account(ALICE).unwrap().unwrap().delegated_to.as_deref(),
            Some(BOB)
        );
    }

    #[test]
    fn test_unsupported_op_code() {
        let mut ledger = ledger();
        let tx = DocumentBuilder::new(OpCode::TokenMint, ALICE, BOB, 0)
            .timestamp(TS)
            .build_chainlexeme()
            .unwrap();
        assert_eq!(
            ledger.apply_transaction(&tx).unwrap_err(),
            LedgerError::UnsupportedOpCode(OpCode::TokenMint)
        );
    }

    #[test]
    fn test_chat_metadata_writes_audit_record() {
        let mut ledger = ledger();
        let applied = ledger.apply_transaction(&proposal(ALICE, "p1", 0)).unwrap();
        assert!(matches!(
            applied.state_changes.last(),
            Some(StateChange::ChatMetadata { .. })
        ));

        let audits = ledger.audit_records(ALICE).unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].op_code, OpCode::GovernanceProposal);
        assert_eq!(audits[0].chat_context_id.as_deref(), Some("ctx-1"));

        ledger.commit().unwrap();
        assert!(ledger
            .store()
            .exists(b"audit:aln1alice:1700000000:0:governance_proposal")
            .unwrap());
    }

    #[test]
    fn test_plain_transfer_has_no_audit_record() {
        let mut ledger = funded(10);
        ledger.apply_transaction(&transfer(ALICE, BOB, 1u64, 0)).unwrap();
        assert!(ledger.audit_records(ALICE).unwrap().is_empty());
    }

    #[test]
    fn test_state_root_empty_store() {
        assert_eq!(ledger().compute_state_root().unwrap(), ZERO_HASH);
    }

    #[test]
    fn test_state_root_covers_pending_and_matches_after_commit() {
        let mut ledger = funded(1000);
        let before = ledger.compute_state_root().unwrap();
        ledger.apply_transaction(&transfer(ALICE, BOB, 1u64, 0)).unwrap();
        let with_pending = ledger.compute_state_root().unwrap();
        assert_ne!(before, with_pending);

        ledger.commit().unwrap();
        assert_eq!(ledger.compute_state_root().unwrap(), with_pending);
    }

    #[test]
    fn test_state_root_after_commit_covers_every_stored_entry() {
        let mut ledger = funded(1000);
        ledger.apply_transaction(&proposal(ALICE, "p1", 0)).unwrap();
        ledger.commit().unwrap();

        let entries = ledger.store().iter_all().unwrap();
        assert!(entries.iter().any(|(k, _)| k.starts_with(b"audit:")));
        let expected = compute_root(entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())));
        assert_eq!(ledger.compute_state_root().unwrap(), expected);
    }

    #[test]
    fn test_rollback_discards_pending() {
        let mut ledger = funded(1000);
        let before = ledger.compute_state_root().unwrap();
        ledger.apply_transaction(&transfer(ALICE, BOB, 1u64, 0)).unwrap();
        ledger.rollback();
        assert_eq!(ledger.compute_state_root().unwrap(), before);
        assert_eq!(ledger.get_account(ALICE).unwrap().unwrap().nonce, 0);
    }

    #[test]
    fn test_apply_block_counts_and_commits() {
        let mut ledger = funded(1000);
        let txs = vec![
            transfer(ALICE, BOB, 100u64, 0),
            transfer(ALICE, BOB, 100u64, 0),
            transfer(ALICE, CAROL, 5_000u64, 1),
            transfer(ALICE, CAROL, 50u64, 1),
        ];
        let outcome = ledger.apply_block(&txs).unwrap();

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].index, 1);
        assert_eq!(outcome.failed[0].tx_hash, txs[1].hash());
        assert!(outcome.failed[0].reason.contains("invalid nonce"));
        assert!(outcome.failed[1].reason.contains("insufficient"));

        assert_eq!(ledger.pending_writes(), 0);
        assert_eq!(ledger.compute_state_root().unwrap(), outcome.state_root);
        assert_eq!(ledger.get_balance(ALICE, NATIVE_ASSET).unwrap(), Amount::from(850u64));
        assert_eq!(ledger.cache_stats().entries, 1);
    }

    #[test]
    fn test_apply_block_rolls_back_on_commit_fault() {
        let store = FaultyStore::default();
        let fail_writes = store.fail_writes.clone();
        let mut ledger = Ledger::new(store);
        ledger
            .set_account(ALICE, &Account::new(ALICE).with_balance(1000u64))
            .unwrap();
        let before = ledger.compute_state_root().unwrap();

        fail_writes.store(true, Ordering::SeqCst);
        let err = ledger
            .apply_block(&[transfer(ALICE, BOB, 100u64, 0)])
            .unwrap_err();
        assert!(err.is_storage_fault());
        assert_eq!(ledger.pending_writes(), 0);
        assert_eq!(ledger.compute_state_root().unwrap(), before);

        fail_writes.store(false, Ordering::SeqCst);
        let outcome = ledger.apply_block(&[transfer(ALICE, BOB, 100u64, 0)]).unwrap();
        assert_eq!(outcome.applied, 1);
    }

    #[test]
    fn test_apply_block_aborts_on_read_fault() {
        let store = FaultyStore::default();
        let fail_reads = store.fail_reads.clone();
        let mut ledger = Ledger::new(store);
        fail_reads.store(true, Ordering::SeqCst);

        let err = ledger
            .apply_block(&[transfer(ALICE, BOB, 0u64, 0)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(ledger.pending_writes(), 0);
    }

    #[test]
    fn test_corrupt_record_is_storage_fault() {
        let mut store = InMemoryKvStore::new();
        store.put(b"acc:aln1alice", b"not json").unwrap();
        let mut ledger = Ledger::new(store);
        assert!(ledger.get_account(ALICE).unwrap_err().is_storage_fault());
    }

    #[test]
    fn test_cache_serves_committed_reads() {
        let mut ledger = funded(5);
        ledger.get_account(ALICE).unwrap();
        ledger.get_account(ALICE).unwrap();
        let stats = ledger.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    proptest! {
        #[test]
        fn prop_transfers_conserve_total(
            start in 0u64..1_000_000,
            amounts in proptest::collection::vec(0u64..400_000, 1..8),
        ) {
            let mut ledger = funded(start);
            for (nonce, amount) in amounts.iter().enumerate() {
                let _ = ledger.apply_transaction(&transfer(ALICE, BOB, *amount, nonce as u64));
            }
            let a = ledger.get_balance(ALICE, NATIVE_ASSET).unwrap();
            let b = ledger.get_balance(BOB, NATIVE_ASSET).unwrap();
            prop_assert_eq!(a.checked_add(b).unwrap(), Amount::from(start));
        }
    }
}
