//! # Node Assembly
//!
//! Builds a [`SoloConsensus`] over a chosen store and drives it until a
//! shutdown future resolves.

use crate::config::NodeConfig;
use aln_03_state_ledger::{KeyValueStore, KvStoreError, Ledger, LedgerError};
use aln_05_solo_consensus::{
    ChatMetadataPolicy, ConsensusError, NewBlockEvent, NodeStatus, SoloConsensus,
};
use shared_types::hash_to_hex;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("storage error: {0}")]
    Storage(#[from] KvStoreError),

    #[error("genesis allocation failed: {0}")]
    Genesis(#[from] LedgerError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}

/// Seed genesis allocations and seal the genesis block.
///
/// The returned node has the chat metadata policy installed and is not
/// yet producing blocks.
pub fn build_node<S: KeyValueStore + 'static>(
    config: &NodeConfig,
    store: S,
) -> Result<Arc<SoloConsensus<S>>, NodeError> {
    let ledger = Ledger::with_config(store, config.ledger.clone());
    let node = SoloConsensus::new(config.consensus.clone(), ledger)
        .with_policy(Arc::new(ChatMetadataPolicy::default()));

    node.with_ledger(|ledger| config.genesis.apply(ledger))?;
    let genesis = node.initialize()?;

    info!(
        node_id = %config.consensus.node_id,
        genesis_hash = %hash_to_hex(&genesis),
        "[aln-node] Node assembled"
    );
    Ok(Arc::new(node))
}

/// Start production, log every block until `shutdown` resolves, then stop.
///
/// Returns the final status.
pub async fn run_until<S, F>(
    node: Arc<SoloConsensus<S>>,
    shutdown: F,
) -> Result<NodeStatus, NodeError>
where
    S: KeyValueStore + 'static,
    F: Future<Output = ()>,
{
    let mut events = node.subscribe();
    node.start()?;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("[aln-node] Shutdown requested");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "[aln-node] Event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    node.stop();
    let status = node.status();
    info!(
        height = status.height,
        mempool_size = status.mempool_size,
        "[aln-node] Node stopped"
    );
    Ok(status)
}

fn log_event(event: &NewBlockEvent) {
    info!(
        height = event.height,
        hash = %hash_to_hex(&event.hash),
        tx_count = event.tx_count,
        applied = event.applied_tx_count,
        failed = event.failed_tx_count,
        "[aln-node] Block sealed"
    );
    for failure in &event.failed {
        warn!(
            height = event.height,
            index = failure.index,
            reason = %failure.reason,
            "[aln-node] Transaction failed in block"
        );
    }
}
