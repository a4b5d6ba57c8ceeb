//! Configuration types for block production

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Runtime configuration for the solo scheduler
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Interval between production ticks
    pub block_time_ms: u64,

    /// Most transactions drained into one block
    pub max_tx_per_block: usize,

    /// Proposer identity written into every header
    pub node_id: String,

    /// Buffered new-block events per subscriber
    pub event_channel_capacity: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            block_time_ms: 5_000,
            max_tx_per_block: 1_000,
            node_id: "solo_node_001".to_string(),
            event_channel_capacity: 256,
        }
    }
}

impl ConsensusConfig {
    pub fn block_time(&self) -> Duration {
        Duration::from_millis(self.block_time_ms)
    }

    pub fn validate(&self) -> Result<(), ConsensusConfigError> {
        if self.block_time_ms == 0 {
            return Err(ConsensusConfigError::ZeroBlockTime);
        }
        if self.max_tx_per_block == 0 {
            return Err(ConsensusConfigError::ZeroMaxTransactions);
        }
        if self.node_id.trim().is_empty() {
            return Err(ConsensusConfigError::EmptyNodeId);
        }
        if self.event_channel_capacity == 0 {
            return Err(ConsensusConfigError::ZeroChannelCapacity);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusConfigError {
    #[error("block_time_ms must be greater than zero")]
    ZeroBlockTime,

    #[error("max_tx_per_block must be greater than zero")]
    ZeroMaxTransactions,

    #[error("node_id must not be empty")]
    EmptyNodeId,

    #[error("event_channel_capacity must be greater than zero")]
    ZeroChannelCapacity,
}
