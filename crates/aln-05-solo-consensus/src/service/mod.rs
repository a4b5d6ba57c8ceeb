//! Solo consensus service.
//!
//! One authority admits transactions into a FIFO pool and seals them into
//! blocks on a fixed tick. Production is serialized, so ticks never
//! overlap, and a batch that hits a storage fault goes back to the front
//! of the pool for the next tick.

use crate::config::ConsensusConfig;
use crate::domain::chain::ChainState;
use crate::domain::errors::{ConsensusError, Result, SubmissionError, SubmitWarning};
use crate::domain::mempool::{Mempool, MempoolEntry};
use crate::events::NewBlockEvent;
use crate::metrics::{MetricsSnapshot, ProductionMetrics};
use crate::ports::{PolicyDecision, PolicyValidator, SystemTimeSource, TimeSource};
use aln_01_chainlexeme::{parse, validate, Chainlexeme, ParsedDocument};
use aln_02_safety::{verify_conservation, verify_limits};
use aln_03_state_ledger::{KeyValueStore, Ledger};
use aln_04_block_model::{verify_chain, Block, BlockHeader, ChainFault};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use shared_types::{hash_to_hex, Hash, Timestamp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};


/// Returned for every admitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub tx_hash: Hash,
    pub mempool_size: usize,
    pub warnings: Vec<SubmitWarning>,
}

/// Snapshot of the scheduler for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub height: u64,
    pub latest_block_hash: Option<Hash>,
    pub latest_block_time: Option<Timestamp>,
    pub mempool_size: usize,
    pub is_running: bool,
}

/// Single-authority block producer over a ledger backed by `S`.
pub struct SoloConsensus<S: KeyValueStore> {
    config: ConsensusConfig,
    ledger: Mutex<Ledger<S>>,
    mempool: Mutex<Mempool>,
    chain: RwLock<ChainState>,
    /// Held for the whole of a production tick.
    production: Mutex<()>,
    events: broadcast::Sender<NewBlockEvent>,
    policy: Option<Arc<dyn PolicyValidator>>,
    time_source: Arc<dyn TimeSource>,
    metrics: ProductionMetrics,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<S: KeyValueStore + 'static> SoloConsensus<S> {
    pub fn new(config: ConsensusConfig, ledger: Ledger<S>) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));

        info!(
            node_id = %config.node_id,
            block_time_ms = config.block_time_ms,
            max_tx_per_block = config.max_tx_per_block,
            "[aln-05] Initializing solo consensus"
        );

        Self {
            config,
            ledger: Mutex::new(ledger),
            mempool: Mutex::new(Mempool::new()),
            chain: RwLock::new(ChainState::new()),
            production: Mutex::new(()),
            events,
            policy: None,
            time_source: Arc::new(SystemTimeSource),
            metrics: ProductionMetrics::default(),
            running: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyValidator>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Run `f` with exclusive access to the ledger.
    ///
    /// Used for genesis allocations and read queries. Blocks production
    /// while held.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&mut Ledger<S>) -> R) -> R {
        let mut ledger = self.ledger.lock();
        f(&mut ledger)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create and store the genesis block over the ledger's current state.
    ///
    /// Returns the genesis hash. Calling it again returns the existing
    /// genesis without touching the ledger.
    pub fn initialize(&self) -> Result<Hash> {
        let _production = self.production.lock();

        if let Some(genesis) = self.chain.read().get(0) {
            debug!("[aln-05] Genesis already present");
            return genesis
                .hash()
                .ok_or(ConsensusError::MissingHash { height: 0 });
        }

        let state_root = self
            .ledger
            .lock()
            .compute_state_root()
            .map_err(|e| ConsensusError::Ledger(e.to_string()))?;

        let genesis = Block::genesis(
            self.config.node_id.clone(),
            state_root,
            self.time_source.now(),
        );
        let hash = genesis
            .hash()
            .ok_or(ConsensusError::MissingHash { height: 0 })?;

        info!(
            genesis_hash = %hash_to_hex(&hash),
            state_root = %hash_to_hex(&state_root),
            "[aln-05] Genesis block created"
        );

        self.chain.write().push(genesis);
        Ok(hash)
    }

    /// Spawn the production loop on the current tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if !self.chain.read().is_initialized() {
            return Err(ConsensusError::NotInitialized);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ConsensusError::NoRuntime)?;

        let mut task = self.task.lock();
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ConsensusError::AlreadyRunning);
        }

        let weak = Arc::downgrade(self);
        let period = self.config.block_time();
        *task = Some(runtime.spawn(production_loop(weak, period)));

        info!(
            block_time_ms = self.config.block_time_ms,
            "[aln-05] Block production started"
        );
        Ok(())
    }

    /// Abort the production loop. A tick already in progress finishes
    /// first, since production holds no await point.
    pub fn stop(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            handle.abort();
        }
        if self.running.swap(false, Ordering::SeqCst) {
            info!("[aln-05] Block production stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Admission
    // =========================================================================

    /// Validate a parsed document and add it to the pool.
    ///
    /// Checks run in order and stop at the first failure: structure,
    /// conversion, conservation, limits, then the policy validator.
    pub fn submit_transaction(
        &self,
        doc: &ParsedDocument,
    ) -> std::result::Result<SubmitReceipt, SubmissionError> {
        match self.admit(doc) {
            Ok(receipt) => {
                self.metrics.record_admitted(receipt.mempool_size);
                debug!(
                    tx_hash = %hash_to_hex(&receipt.tx_hash),
                    mempool_size = receipt.mempool_size,
                    warnings = receipt.warnings.len(),
                    "[aln-05] Transaction admitted"
                );
                Ok(receipt)
            }
            Err(e) => {
                self.metrics.record_rejected(e.kind());
                warn!(reason = %e, "[aln-05] Transaction rejected");
                Err(e)
            }
        }
    }

    /// Parse chainlexeme text, then [`submit_transaction`](Self::submit_transaction).
    pub fn submit_text(&self, text: &str) -> std::result::Result<SubmitReceipt, SubmissionError> {
        self.submit_transaction(&parse(text))
    }

    fn admit(&self, doc: &ParsedDocument) -> std::result::Result<SubmitReceipt, SubmissionError> {
        let report = validate(doc);
        if !report.is_valid() {
            return Err(SubmissionError::Structural(report.errors));
        }
        let mut warnings: Vec<SubmitWarning> = report
            .warnings
            .into_iter()
            .map(SubmitWarning::Document)
            .collect();

        let tx = Chainlexeme::from_document(doc)?;
        let now = self.time_source.now();

        for safety in [verify_conservation(&tx), verify_limits(&tx, now)] {
            let safety_warnings = safety.into_result()?;
            warnings.extend(safety_warnings.into_iter().map(SubmitWarning::Safety));
        }

        if let Some(policy) = &self.policy {
            if let PolicyDecision::Reject(reason) = policy.validate_transaction(&tx) {
                return Err(SubmissionError::Policy(reason));
            }
        }

        let entry = MempoolEntry::new(tx, now);
        let tx_hash = entry.hash;
        let mempool_size = self.mempool.lock().push(entry);

        Ok(SubmitReceipt {
            tx_hash,
            mempool_size,
            warnings,
        })
    }

    // =========================================================================
    // Production
    // =========================================================================

    /// Run one production tick.
    ///
    /// Returns `Ok(None)` when the pool is empty. On a storage fault the
    /// drained batch is restored to the front of the pool and
    /// [`ConsensusError::Batch`] is returned; nothing is appended.
    pub fn produce_block(&self) -> Result<Option<Block>> {
        let _production = self.production.lock();
        #[cfg(feature = "metrics")]
        let _timer = aln_telemetry::HistogramTimer::new(&aln_telemetry::BLOCK_PRODUCTION_DURATION);

        let (parent_height, parent_hash, parent_timestamp) = {
            let chain = self.chain.read();
            let tip = chain.tip().ok_or(ConsensusError::NotInitialized)?;
            let hash = tip.hash().ok_or(ConsensusError::MissingHash {
                height: tip.height(),
            })?;
            (tip.height(), hash, tip.timestamp())
        };

        let batch = self.mempool.lock().drain(self.config.max_tx_per_block);
        if batch.is_empty() {
            return Ok(None);
        }

        let height = parent_height + 1;
        let timestamp = self
            .time_source
            .now()
            .max(parent_timestamp.saturating_add(1));
        let header = BlockHeader::new(height, timestamp, parent_hash, self.config.node_id.clone());
        let transactions: Vec<Chainlexeme> =
            batch.iter().map(|e| e.chainlexeme.clone()).collect();

        debug!(height, tx_count = transactions.len(), "[aln-05] Producing block");

        let applied = self.ledger.lock().apply_block(&transactions);
        let outcome = match applied {
            Ok(outcome) => outcome,
            Err(e) => {
                let restored = batch.len();
                self.mempool.lock().restore_front(batch);
                self.metrics.record_batch_restored();
                error!(
                    height,
                    restored,
                    error = %e,
                    "[aln-05] Batch failed, transactions restored to mempool"
                );
                return Err(ConsensusError::Batch {
                    height,
                    reason: e.to_string(),
                });
            }
        };

        let mut block = Block::new(header, transactions);
        let hash = block.finalize(outcome.state_root)?;
        self.chain.write().push(block.clone());

        let event = NewBlockEvent {
            height,
            hash,
            timestamp,
            tx_count: block.transactions.len(),
            applied_tx_count: outcome.applied,
            failed_tx_count: outcome.failed.len(),
            failed: outcome.failed,
        };

        let mempool_size = self.mempool.lock().len();
        self.metrics
            .record_block(height, event.applied_tx_count, event.failed_tx_count, mempool_size);

        log_block_produced(&event);

        if self.events.send(event).is_err() {
            debug!(height, "[aln-05] No subscribers for new block event");
        }

        Ok(Some(block))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn status(&self) -> NodeStatus {
        let chain = self.chain.read();
        let tip = chain.tip();
        NodeStatus {
            node_id: self.config.node_id.clone(),
            height: chain.height(),
            latest_block_hash: tip.and_then(Block::hash),
            latest_block_time: tip.map(Block::timestamp),
            mempool_size: self.mempool_size(),
            is_running: self.is_running(),
        }
    }

    pub fn get_block(&self, height: u64) -> Option<Block> {
        self.chain.read().get(height).cloned()
    }

    /// Every block from genesis to the tip.
    pub fn blocks(&self) -> Vec<Block> {
        self.chain.read().blocks().to_vec()
    }

    /// Re-verify the whole chain from genesis.
    pub fn verify_chain(&self) -> std::result::Result<(), ChainFault> {
        verify_chain(self.chain.read().blocks())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NewBlockEvent> {
        self.events.subscribe()
    }

    pub fn mempool_size(&self) -> usize {
        self.mempool.lock().len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<S: KeyValueStore> Drop for SoloConsensus<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

async fn production_loop<S: KeyValueStore + 'static>(
    consensus: Weak<SoloConsensus<S>>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(node) = consensus.upgrade() else {
            break;
        };
        match node.produce_block() {
            Ok(_) => {}
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "[aln-05] Production tick failed, retrying next tick");
            }
            Err(e) => {
                error!(error = %e, "[aln-05] Production tick failed");
            }
        }
    }
}

#[cfg(feature = "metrics")]
fn log_block_produced(event: &NewBlockEvent) {
    aln_telemetry::log_block_event!(
        info,
        "aln-05",
        "[aln-05] Block produced",
        event.height,
        hash_to_hex(&event.hash),
        tx_count = event.tx_count,
        applied = event.applied_tx_count,
        failed = event.failed_tx_count
    );
}

#[cfg(not(feature = "metrics"))]
fn log_block_produced(event: &NewBlockEvent) {
    info!(
        block_height = event.height,
        block_hash = %hash_to_hex(&event.hash),
        tx_count = event.tx_count,
        applied = event.applied_tx_count,
        failed = event.failed_tx_count,
        "[aln-05] Block produced"
    );
}
