//! # Assembled Node
//!
//! Builds the node the way the binary does, from a TOML config, and lets
//! the production timer seal blocks. Time is paused so every tick is
//! deterministic.

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tokio::time::timeout;

    use aln_01_chainlexeme::DocumentBuilder;
    use aln_03_state_ledger::InMemoryKvStore;
    use aln_05_solo_consensus::ConsensusError;
    use node_runtime::{build_node, run_until, NodeConfig};
    use shared_types::{Amount, NATIVE_ASSET};

    const CONFIG: &str = r#"
        [consensus]
        block_time_ms = 200
        node_id = "e2e_node"

        [[genesis.allocations]]
        address = "aln1alice"
        balance = 1000
        voting_power = 3
    "#;

    fn config() -> NodeConfig {
        let config = NodeConfig::from_toml_str(CONFIG).unwrap();
        config.validate().unwrap();
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_seals_submitted_transfer() {
        let node = build_node(&config(), InMemoryKvStore::new()).unwrap();
        let mut events = node.subscribe();
        node.start().unwrap();

        let tx = DocumentBuilder::transfer("aln1alice", "aln1bob", 100u64, 0).build();
        let receipt = node.submit_transaction(&tx).unwrap();

        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no block within 5s")
            .unwrap();
        assert_eq!(event.height, 1);
        assert_eq!(event.applied_tx_count, 1);

        let block = node.get_block(1).unwrap();
        assert_eq!(block.header.proposer, "e2e_node");
        assert_eq!(block.transactions[0].hash(), receipt.tx_hash);
        assert_eq!(
            node.with_ledger(|l| l.get_balance("aln1bob", NATIVE_ASSET))
                .unwrap(),
            Amount::from(100u64)
        );

        node.stop();
        assert!(!node.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_ticks_produce_nothing() {
        let node = build_node(&config(), InMemoryKvStore::new()).unwrap();
        let mut events = node.subscribe();
        node.start().unwrap();

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(events.try_recv().is_err());
        assert_eq!(node.status().height, 0);
        node.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let node = build_node(&config(), InMemoryKvStore::new()).unwrap();
        node.start().unwrap();
        assert_eq!(node.start(), Err(ConsensusError::AlreadyRunning));
        node.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_shutdown_leaves_verifiable_chain() {
        let node = build_node(&config(), InMemoryKvStore::new()).unwrap();
        for nonce in 0..3 {
            let tx = DocumentBuilder::transfer("aln1alice", "aln1carol", 10u64, nonce).build();
            node.submit_transaction(&tx).unwrap();
        }

        let status = run_until(node.clone(), tokio::time::sleep(Duration::from_millis(700)))
            .await
            .unwrap();

        assert_eq!(status.height, 1);
        assert!(!status.is_running);
        assert_eq!(node.get_block(1).unwrap().transactions.len(), 3);
        assert_eq!(
            node.with_ledger(|l| l.get_balance("aln1alice", NATIVE_ASSET))
                .unwrap(),
            Amount::from(970u64)
        );
        assert!(node.verify_chain().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_genesis_account_voting_power_counts() {
        let node = build_node(&config(), InMemoryKvStore::new()).unwrap();
        node.start().unwrap();

        let proposal =
            DocumentBuilder::governance_proposal("aln1alice", "p-1", "Title", "general", 0)
                .chat("ctx-1", "t-1")
                .build();
        let vote = DocumentBuilder::governance_vote("aln1alice", "p-1", "against", 1)
            .chat("ctx-1", "t-2")
            .build();
        node.submit_transaction(&proposal).unwrap();
        node.submit_transaction(&vote).unwrap();

        let mut events = node.subscribe();
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no block within 5s")
            .unwrap();
        assert_eq!(event.applied_tx_count, 2);

        let proposal = node
            .with_ledger(|l| l.get_proposal("p-1"))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.votes_against, Amount::from(3u64));
        node.stop();
    }
}
