//! # Node Runtime Library
//!
//! Configuration, genesis seeding and the run loop behind the
//! `node-runtime` binary, exposed for testing.
//!
//! ## Startup Sequence
//!
//! 1. Load [`NodeConfig`] (TOML file, then environment overrides)
//! 2. Initialize telemetry
//! 3. Open the configured store and wrap it in a ledger
//! 4. Apply genesis allocations and seal block 0
//! 5. Start block production and log events until Ctrl+C

pub mod config;
pub mod genesis;
pub mod node;

pub use config::{config_path, ConfigError, NodeConfig, StorageBackend, StorageConfig, CONFIG_ENV};
pub use genesis::{GenesisAllocation, GenesisConfig};
pub use node::{build_node, run_until, NodeError};
