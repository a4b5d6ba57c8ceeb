//! Prometheus metrics for the ALN node.
//!
//! All metrics follow the naming convention: `aln_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., blocks_produced_total)
//! - **Gauge**: Value that can go up or down (e.g., mempool_transactions_pending)
//! - **Histogram**: Distribution of values (e.g., block_production_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BLOCK PRODUCTION METRICS (aln-05)
    // =========================================================================

    /// Total blocks produced
    pub static ref BLOCKS_PRODUCED: IntCounter = IntCounter::new(
        "aln_blocks_produced_total",
        "Total number of blocks produced"
    ).expect("metric creation failed");

    /// Current chain height
    pub static ref CHAIN_HEIGHT: IntGauge = IntGauge::new(
        "aln_chain_height",
        "Height of the latest block"
    ).expect("metric creation failed");

    /// Batches put back into the pool after a storage fault
    pub static ref BATCHES_RESTORED: IntCounter = IntCounter::new(
        "aln_batches_restored_total",
        "Batches restored to the mempool after a storage fault"
    ).expect("metric creation failed");

    /// Block production duration histogram
    pub static ref BLOCK_PRODUCTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "aln_block_production_duration_seconds",
            "Time spent draining, applying and sealing a batch"
        ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5])
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSACTION METRICS (aln-05, aln-03)
    // =========================================================================

    /// Submissions by outcome
    pub static ref TRANSACTIONS_SUBMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("aln_transactions_submitted_total", "Transaction submissions by outcome"),
        &["outcome"]  // outcome: admitted/structural/safety/policy
    ).expect("metric creation failed");

    /// Transactions applied to the ledger
    pub static ref TRANSACTIONS_APPLIED: IntCounter = IntCounter::new(
        "aln_transactions_applied_total",
        "Transactions applied to the ledger"
    ).expect("metric creation failed");

    /// Transactions dropped at apply time
    pub static ref TRANSACTIONS_FAILED: IntCounter = IntCounter::new(
        "aln_transactions_failed_total",
        "Transactions that failed when applied and were dropped"
    ).expect("metric creation failed");

    /// Current mempool size (transaction count)
    pub static ref MEMPOOL_SIZE: IntGauge = IntGauge::new(
        "aln_mempool_transactions_pending",
        "Number of pending transactions in the mempool"
    ).expect("metric creation failed");
}

/// Handle returned by [`register_metrics`].
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Register all metrics with the global registry.
///
/// Metrics that are already registered are skipped, so calling this more
/// than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Block production
        Box::new(BLOCKS_PRODUCED.clone()),
        Box::new(CHAIN_HEIGHT.clone()),
        Box::new(BATCHES_RESTORED.clone()),
        Box::new(BLOCK_PRODUCTION_DURATION.clone()),
        // Transactions
        Box::new(TRANSACTIONS_SUBMITTED.clone()),
        Box::new(TRANSACTIONS_APPLIED.clone()),
        Box::new(TRANSACTIONS_FAILED.clone()),
        Box::new(MEMPOOL_SIZE.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a sealed block.
pub fn record_block_produced(height: u64, applied: usize, failed: usize) {
    BLOCKS_PRODUCED.inc();
    CHAIN_HEIGHT.set(i64::try_from(height).unwrap_or(i64::MAX));
    TRANSACTIONS_APPLIED.inc_by(applied as u64);
    TRANSACTIONS_FAILED.inc_by(failed as u64);
}

/// Record a submission outcome label.
pub fn record_submission(outcome: &str) {
    TRANSACTIONS_SUBMITTED.with_label_values(&[outcome]).inc();
}

pub fn record_batch_restored() {
    BATCHES_RESTORED.inc();
}

pub fn set_mempool_size(size: usize) {
    MEMPOOL_SIZE.set(i64::try_from(size).unwrap_or(i64::MAX));
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
