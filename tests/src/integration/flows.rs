//! # End-to-End Flows
//!
//! Drives a [`SoloConsensus`] by hand, one `produce_block` per tick, and
//! checks ledger state, events and chain verification after each step.
//!
//! ## Flows Tested
//!
//! 1. **Transfer**: admit → seal → balances, nonce and event
//! 2. **Replay**: an already applied transaction fails in the next block
//! 3. **Governance**: proposal and vote in one block, tallied by voting power
//! 4. **Migration**: a source hash mints once
//! 5. **Storage fault**: the batch returns to the pool front and is sealed later
//! 6. **Chain audit**: tampering with any sealed block is detected

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use aln_01_chainlexeme::{DocumentBuilder, ParsedDocument};
    use aln_03_state_ledger::{
        Account, BatchOperation, InMemoryKvStore, KeyValueStore, KvStoreError, Ledger,
        ScanResult, VoteChoice,
    };
    use aln_04_block_model::{verify_chain, ConsensusError};
    use aln_05_solo_consensus::{
        ChatMetadataPolicy, ConsensusConfig, SoloConsensus, SubmissionError,
    };
    use shared_types::{Amount, ManualTimeSource, Timestamp, NATIVE_ASSET};

    const ALICE: &str = "aln1alice";
    const BOB: &str = "aln1bob";
    const BRIDGE: &str = "aln1bridge";
    const NOW: Timestamp = 1_700_000_000;
    const PROOF: &str = "0xabababababababababababababababababababababababababababababababab";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Store double whose batch writes fail while the flag is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryKvStore,
        fail_writes: Arc<AtomicBool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError> {
            self.inner.get(key)
        }

        fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError> {
            self.inner.put(key, value)
        }

        fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError> {
            self.inner.delete(key)
        }

        fn atomic_batch_write(
            &mut self,
            operations: Vec<BatchOperation>,
        ) -> Result<(), KvStoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(KvStoreError::IoError {
                    message: "disk full".into(),
                });
            }
            self.inner.atomic_batch_write(operations)
        }

        fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KvStoreError> {
            self.inner.prefix_scan(prefix)
        }
    }

    /// Alice holds 1000 ALN and 10 voting power. Genesis is sealed.
    fn node_over<S: KeyValueStore + 'static>(store: S) -> SoloConsensus<S> {
        let mut ledger = Ledger::new(store);
        ledger
            .set_account(
                ALICE,
                &Account::new(ALICE)
                    .with_balance(1000u64)
                    .with_voting_power(10u64),
            )
            .unwrap();

        let node = SoloConsensus::new(ConsensusConfig::default(), ledger)
            .with_policy(Arc::new(ChatMetadataPolicy::default()))
            .with_time_source(Arc::new(ManualTimeSource::at_secs(NOW)));
        node.initialize().unwrap();
        node
    }

    fn node() -> SoloConsensus<InMemoryKvStore> {
        node_over(InMemoryKvStore::new())
    }

    fn transfer(amount: u64, nonce: u64) -> ParsedDocument {
        DocumentBuilder::transfer(ALICE, BOB, amount, nonce)
            .timestamp(NOW)
            .build()
    }

    fn balance<S: KeyValueStore + 'static>(node: &SoloConsensus<S>, address: &str) -> Amount {
        node.with_ledger(|l| l.get_balance(address, NATIVE_ASSET))
            .unwrap()
    }

    fn nonce<S: KeyValueStore + 'static>(node: &SoloConsensus<S>, address: &str) -> u64 {
        node.with_ledger(|l| l.get_account(address))
            .unwrap()
            .map(|a| a.nonce)
            .unwrap_or(0)
    }

    // =============================================================================
    // FLOW 1: TRANSFER
    // =============================================================================

    #[test]
    fn test_transfer_sealed_into_block_one() {
        let node = node();
        let mut events = node.subscribe();

        let receipt = node.submit_transaction(&transfer(100, 0)).unwrap();
        assert_eq!(receipt.mempool_size, 1);

        let block = node.produce_block().unwrap().unwrap();
        assert_eq!(block.height(), 1);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].hash(), receipt.tx_hash);

        assert_eq!(balance(&node, ALICE), Amount::from(900u64));
        assert_eq!(balance(&node, BOB), Amount::from(100u64));
        assert_eq!(nonce(&node, ALICE), 1);

        let event = events.try_recv().unwrap();
        assert_eq!(event.height, 1);
        assert_eq!(Some(event.hash), block.hash());
        assert_eq!(event.applied_tx_count, 1);
        assert_eq!(event.failed_tx_count, 0);

        let status = node.status();
        assert_eq!(status.height, 1);
        assert_eq!(status.latest_block_hash, block.hash());
        assert_eq!(status.mempool_size, 0);
        assert!(node.verify_chain().is_ok());
    }

    #[test]
    fn test_text_submission_matches_builder() {
        let node = node();
        let text = DocumentBuilder::transfer(ALICE, BOB, 5u64, 0)
            .timestamp(NOW)
            .to_text();

        let receipt = node.submit_text(&text).unwrap();
        node.produce_block().unwrap().unwrap();

        assert_eq!(node.get_block(1).unwrap().transactions[0].hash(), receipt.tx_hash);
        assert_eq!(balance(&node, BOB), Amount::from(5u64));
    }

    #[test]
    fn test_rejections_never_reach_pool() {
        let node = node();

        let mut broken = transfer(1, 0);
        broken.header.clear();
        assert!(matches!(
            node.submit_transaction(&broken),
            Err(SubmissionError::Structural(_))
        ));

        let unknown_tag = DocumentBuilder::transfer(ALICE, BOB, 1u64, 0)
            .timestamp(NOW)
            .jurisdiction(&["Narnia"])
            .build();
        assert!(matches!(
            node.submit_transaction(&unknown_tag),
            Err(SubmissionError::Policy(reason)) if reason == "invalid jurisdiction tag Narnia"
        ));

        assert_eq!(node.mempool_size(), 0);
        assert_eq!(node.produce_block(), Ok(None));
        assert_eq!(node.metrics().transactions_rejected, 2);
    }

    // =============================================================================
    // FLOW 2: REPLAY
    // =============================================================================

    #[test]
    fn test_replayed_transaction_fails_at_apply() {
        let node = node();
        let mut events = node.subscribe();
        let tx = transfer(100, 0);

        node.submit_transaction(&tx).unwrap();
        node.produce_block().unwrap().unwrap();
        events.try_recv().unwrap();

        // Admission is stateless, so the replay is admitted.
        let replay = node.submit_transaction(&tx).unwrap();
        let block = node.produce_block().unwrap().unwrap();

        assert_eq!(block.height(), 2);
        assert_eq!(block.transactions.len(), 1);
        let event = events.try_recv().unwrap();
        assert_eq!(event.applied_tx_count, 0);
        assert_eq!(event.failed_tx_count, 1);
        assert_eq!(event.failed[0].tx_hash, replay.tx_hash);
        assert!(event.failed[0].reason.contains("nonce"));

        assert_eq!(balance(&node, ALICE), Amount::from(900u64));
        assert_eq!(balance(&node, BOB), Amount::from(100u64));
        assert_eq!(node.mempool_size(), 0);
    }

    // =============================================================================
    // FLOW 3: GOVERNANCE
    // =============================================================================

    #[test]
    fn test_proposal_and_vote_in_one_block() {
        let node = node();

        let proposal =
            DocumentBuilder::governance_proposal(ALICE, "prop-7", "Raise cap", "treasury", 0)
                .timestamp(NOW)
                .chat("chat-42", "transcript-42")
                .jurisdiction(&["EU"])
                .build();
        let vote = DocumentBuilder::governance_vote(ALICE, "prop-7", "for", 1)
            .timestamp(NOW)
            .chat("chat-42", "transcript-43")
            .build();

        node.submit_transaction(&proposal).unwrap();
        node.submit_transaction(&vote).unwrap();
        let block = node.produce_block().unwrap().unwrap();
        assert_eq!(block.transactions.len(), 2);

        let stored = node
            .with_ledger(|l| l.get_proposal("prop-7"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.proposer, ALICE);
        assert_eq!(stored.tally(VoteChoice::For), Amount::from(10u64));
        assert_eq!(stored.tally(VoteChoice::Against), Amount::ZERO);
        assert_eq!(stored.voters.len(), 1);

        let audit = node.with_ledger(|l| l.audit_records(ALICE)).unwrap();
        assert_eq!(audit.len(), 2);
        assert_eq!(nonce(&node, ALICE), 2);
    }

    #[test]
    fn test_governance_without_chat_metadata_is_rejected() {
        let node = node();
        let vote = DocumentBuilder::governance_vote(ALICE, "prop-7", "for", 0)
            .timestamp(NOW)
            .build();

        assert!(matches!(
            node.submit_transaction(&vote),
            Err(SubmissionError::Policy(_))
        ));
    }

    #[test]
    fn test_vote_on_unknown_proposal_fails_in_block() {
        let node = node();
        let vote = DocumentBuilder::governance_vote(ALICE, "missing", "against", 0)
            .timestamp(NOW)
            .chat("chat-1", "t-1")
            .build();

        node.submit_transaction(&vote).unwrap();
        let mut events = node.subscribe();
        node.produce_block().unwrap().unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.failed_tx_count, 1);
        assert_eq!(nonce(&node, ALICE), 0);
    }

    // =============================================================================
    // FLOW 4: MIGRATION
    // =============================================================================

    fn mint(amount: u64, nonce: u64) -> ParsedDocument {
        DocumentBuilder::migration_mint(BRIDGE, BOB, amount, "0xsource-1", PROOF, nonce)
            .timestamp(NOW)
            .header_field("transcript_hash", "bridge-transcript")
            .build()
    }

    #[test]
    fn test_migration_source_mints_once() {
        let node = node();

        node.submit_transaction(&mint(50, 0)).unwrap();
        node.produce_block().unwrap().unwrap();
        assert_eq!(balance(&node, BOB), Amount::from(50u64));

        let record = node
            .with_ledger(|l| l.get_migration("0xsource-1"))
            .unwrap()
            .unwrap();
        assert_eq!(record.dest_address, BOB);
        assert_eq!(record.amount, Amount::from(50u64));

        let mut events = node.subscribe();
        node.submit_transaction(&mint(50, 1)).unwrap();
        node.produce_block().unwrap().unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.failed_tx_count, 1);
        assert_eq!(balance(&node, BOB), Amount::from(50u64));
    }

    // =============================================================================
    // FLOW 5: STORAGE FAULT
    // =============================================================================

    #[test]
    fn test_storage_fault_restores_batch_in_order() {
        let store = FlakyStore::default();
        let fail_writes = store.fail_writes.clone();
        let node = node_over(store);

        let first = node.submit_transaction(&transfer(10, 0)).unwrap();
        let second = node.submit_transaction(&transfer(20, 1)).unwrap();

        fail_writes.store(true, Ordering::SeqCst);
        let err = node.produce_block().unwrap_err();
        assert!(matches!(err, ConsensusError::Batch { height: 1, .. }));
        assert!(err.is_recoverable());
        assert_eq!(node.status().height, 0);
        assert_eq!(node.mempool_size(), 2);
        assert_eq!(balance(&node, ALICE), Amount::from(1000u64));

        // Arrives after the fault, so it must stay behind the restored batch.
        let third = node.submit_transaction(&transfer(30, 2)).unwrap();

        fail_writes.store(false, Ordering::SeqCst);
        let block = node.produce_block().unwrap().unwrap();
        let hashes: Vec<_> = block.transactions.iter().map(|tx| tx.hash()).collect();
        assert_eq!(hashes, vec![first.tx_hash, second.tx_hash, third.tx_hash]);

        assert_eq!(block.height(), 1);
        assert_eq!(balance(&node, ALICE), Amount::from(940u64));
        assert_eq!(node.metrics().batches_restored, 1);
        assert!(node.verify_chain().is_ok());
    }

    // =============================================================================
    // FLOW 6: CHAIN AUDIT
    // =============================================================================

    fn three_block_chain() -> SoloConsensus<InMemoryKvStore> {
        let node = node();
        for round in 0..3 {
            node.submit_transaction(&transfer(1, 2 * round)).unwrap();
            node.submit_transaction(&transfer(2, 2 * round + 1)).unwrap();
            node.produce_block().unwrap().unwrap();
        }
        node
    }

    #[test]
    fn test_untouched_chain_verifies() {
        let node = three_block_chain();
        let blocks = node.blocks();
        assert_eq!(blocks.len(), 4);
        assert!(verify_chain(&blocks).is_ok());

        for pair in blocks.windows(2) {
            assert_eq!(Some(pair[1].header.parent_hash), pair[0].hash());
            assert!(pair[1].timestamp() > pair[0].timestamp());
        }
    }

    #[test]
    fn test_dropped_transaction_detected() {
        let mut blocks = three_block_chain().blocks();
        blocks[2].transactions.pop();

        let fault = verify_chain(&blocks).unwrap_err();
        assert_eq!(fault.height, 2);
        assert!(fault
            .errors
            .iter()
            .any(|e| matches!(e, ConsensusError::InvalidTxRoot { .. })));
    }

    #[test]
    fn test_rewritten_state_root_detected() {
        let mut blocks = three_block_chain().blocks();
        blocks[1].header.state_root = [0xEE; 32];

        let fault = verify_chain(&blocks).unwrap_err();
        assert_eq!(fault.height, 1);
        assert!(fault.errors.iter().all(|e| e.is_verification_failure()));
    }

    #[test]
    fn test_reordered_blocks_detected() {
        let mut blocks = three_block_chain().blocks();
        blocks.swap(1, 2);

        let fault = verify_chain(&blocks).unwrap_err();
        assert_eq!(fault.height, 2);
    }
}
