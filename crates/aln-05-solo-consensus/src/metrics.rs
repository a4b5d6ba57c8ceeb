//! # Production Metrics
//!
//! In-process counters kept by the scheduler. With the `metrics` feature
//! every update is mirrored to the Prometheus collectors in
//! `aln-telemetry`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ProductionMetrics {
    blocks_produced: AtomicU64,
    transactions_admitted: AtomicU64,
    transactions_rejected: AtomicU64,
    transactions_applied: AtomicU64,
    transactions_failed: AtomicU64,
    batches_restored: AtomicU64,
}

/// Point-in-time copy of [`ProductionMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub blocks_produced: u64,
    pub transactions_admitted: u64,
    pub transactions_rejected: u64,
    pub transactions_applied: u64,
    pub transactions_failed: u64,
    pub batches_restored: u64,
}

impl ProductionMetrics {
    pub fn record_admitted(&self, mempool_size: usize) {
        self.transactions_admitted.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        {
            aln_telemetry::record_submission("admitted");
            aln_telemetry::set_mempool_size(mempool_size);
        }
        #[cfg(not(feature = "metrics"))]
        let _ = mempool_size;
    }

    /// `kind` labels the rejecting stage.
    pub fn record_rejected(&self, kind: &str) {
        self.transactions_rejected.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        aln_telemetry::record_submission(kind);
        #[cfg(not(feature = "metrics"))]
        let _ = kind;
    }

    pub fn record_block(&self, height: u64, applied: usize, failed: usize, mempool_size: usize) {
        self.blocks_produced.fetch_add(1, Ordering::Relaxed);
        self.transactions_applied
            .fetch_add(applied as u64, Ordering::Relaxed);
        self.transactions_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        {
            aln_telemetry::record_block_produced(height, applied, failed);
            aln_telemetry::set_mempool_size(mempool_size);
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (height, mempool_size);
    }

    pub fn record_batch_restored(&self) {
        self.batches_restored.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        aln_telemetry::record_batch_restored();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_produced: self.blocks_produced.load(Ordering::Relaxed),
            transactions_admitted: self.transactions_admitted.load(Ordering::Relaxed),
            transactions_rejected: self.transactions_rejected.load(Ordering::Relaxed),
            transactions_applied: self.transactions_applied.load(Ordering::Relaxed),
            transactions_failed: self.transactions_failed.load(Ordering::Relaxed),
            batches_restored: self.batches_restored.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = ProductionMetrics::default();
        metrics.record_admitted(1);
        metrics.record_admitted(2);
        metrics.record_rejected("safety");
        metrics.record_block(1, 1, 1, 0);
        metrics.record_batch_restored();

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                blocks_produced: 1,
                transactions_admitted: 2,
                transactions_rejected: 1,
                transactions_applied: 1,
                transactions_failed: 1,
                batches_restored: 1,
            }
        );
    }
}
