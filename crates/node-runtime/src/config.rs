//! # Node Configuration
//!
//! One TOML document configures the whole node:
//!
//! ```toml
//! [consensus]
//! block_time_ms = 5000
//! max_tx_per_block = 1000
//! node_id = "solo_node_001"
//!
//! [ledger]
//! cache_capacity = 10000
//!
//! [storage]
//! backend = "memory"      # or "rocksdb"
//! path = "./data/ledger"
//!
//! [telemetry]
//! log_level = "info"
//!
//! [[genesis.allocations]]
//! address = "aln1alice"
//! balance = "1000"
//! voting_power = 10
//! ```
//!
//! Every section is optional. `ALN_BLOCK_TIME_MS`, `ALN_MAX_TX_PER_BLOCK`
//! and `ALN_NODE_ID` override the file.

use crate::genesis::GenesisConfig;
use aln_03_state_ledger::LedgerConfig;
use aln_05_solo_consensus::{ConsensusConfig, ConsensusConfigError};
use aln_telemetry::TelemetryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ALN_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub consensus: ConsensusConfig,
    pub ledger: LedgerConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub genesis: GenesisConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Rocksdb,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database directory. Ignored by the memory backend.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/ledger"),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    InvalidOverride { var: &'static str, value: String },

    #[error(transparent)]
    Consensus(#[from] ConsensusConfigError),

    #[error("genesis allocation for {0} is not an ALN address")]
    InvalidAllocationAddress(String),

    #[error("duplicate genesis allocation for {0}")]
    DuplicateAllocation(String),

    #[error("storage backend `rocksdb` requires the `rocksdb` feature")]
    BackendUnavailable,
}

impl NodeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from `ALN_CONFIG` or the first CLI argument, falling back to
    /// defaults, then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let path = config_path(lookup, std::env::args().nth(1));

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let mut config = config.with_overrides(lookup)?;
        config.telemetry = config.telemetry.with_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply consensus overrides from `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("ALN_BLOCK_TIME_MS") {
            self.consensus.block_time_ms = parse_override("ALN_BLOCK_TIME_MS", value)?;
        }
        if let Some(value) = lookup("ALN_MAX_TX_PER_BLOCK") {
            self.consensus.max_tx_per_block = parse_override("ALN_MAX_TX_PER_BLOCK", value)?;
        }
        if let Some(value) = lookup("ALN_NODE_ID") {
            self.consensus.node_id = value;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consensus.validate()?;
        self.genesis.validate()?;

        if self.storage.backend == StorageBackend::Rocksdb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::BackendUnavailable);
        }
        Ok(())
    }
}

/// `ALN_CONFIG` wins over the CLI argument.
pub fn config_path(
    lookup: impl Fn(&str) -> Option<String>,
    first_arg: Option<String>,
) -> Option<PathBuf> {
    lookup(CONFIG_ENV)
        .or(first_arg)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn parse_override<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}
