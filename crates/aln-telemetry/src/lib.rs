//! # ALN Telemetry
//!
//! Logging and metrics for the ALN solo node.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter and a JSON or
//!   pretty formatter
//! - **Metrics**: Prometheus counters, gauges and histograms, rendered
//!   as text by [`encode_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aln_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ALN_SERVICE_NAME` | `aln-node` | Service name in logs |
//! | `ALN_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `ALN_JSON_LOGS` | `false` | JSON log output |
//! | `ALN_METRICS_ENABLED` | `true` | Register Prometheus metrics |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_batch_restored, record_block_produced, record_submission,
    register_metrics, set_mempool_size, HistogramTimer, MetricsHandle, BATCHES_RESTORED,
    BLOCKS_PRODUCED, BLOCK_PRODUCTION_DURATION, CHAIN_HEIGHT, MEMPOOL_SIZE,
    TRANSACTIONS_APPLIED, TRANSACTIONS_FAILED, TRANSACTIONS_SUBMITTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging, and metrics when enabled.
///
/// Returns a guard that should be held for the lifetime of the
/// application.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    init_logging(config)?;

    Ok(TelemetryGuard { metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    metrics: Option<MetricsHandle>,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics.as_ref()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
