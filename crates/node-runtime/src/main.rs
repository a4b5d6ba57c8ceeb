//! # ALN Solo Node
//!
//! Runs a single-authority chain: transactions admitted to the pool are
//! sealed into a block every `block_time_ms`.
//!
//! ## Usage
//!
//! ```text
//! node-runtime [config.toml]
//! ALN_CONFIG=/etc/aln/node.toml node-runtime
//! ```
//!
//! See [`node_runtime::config`] for the file format.

use anyhow::{Context, Result};
use aln_03_state_ledger::{InMemoryKvStore, KeyValueStore};
use aln_telemetry::init_telemetry;
use node_runtime::{build_node, run_until, NodeConfig, StorageBackend};
use tracing::{error, info};

async fn serve<S: KeyValueStore + 'static>(config: &NodeConfig, store: S) -> Result<()> {
    let node = build_node(config, store).context("Failed to assemble node")?;

    info!("Node is running. Press Ctrl+C to stop.");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    let status = run_until(node, shutdown).await?;
    info!(
        height = status.height,
        pending = status.mempool_size,
        "Shutdown complete"
    );
    Ok(())
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &NodeConfig) -> Result<aln_03_state_ledger::RocksDbKvStore> {
    let path = &config.storage.path;
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create data dir {}", path.display()))?;
    aln_03_state_ledger::RocksDbKvStore::open_default(path).context("Failed to open RocksDB")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("Failed to load configuration")?;
    let _telemetry = init_telemetry(&config.telemetry)?;

    info!("===========================================");
    info!("  ALN Solo Node v{}", env!("CARGO_PKG_VERSION"));
    info!("  Node ID: {}", config.consensus.node_id);
    info!("  Block time: {}ms", config.consensus.block_time_ms);
    info!("  Storage: {:?}", config.storage.backend);
    info!("===========================================");

    match config.storage.backend {
        StorageBackend::Memory => serve(&config, InMemoryKvStore::new()).await,
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => serve(&config, open_rocksdb(&config)?).await,
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => Err(node_runtime::ConfigError::BackendUnavailable.into()),
    }
}
