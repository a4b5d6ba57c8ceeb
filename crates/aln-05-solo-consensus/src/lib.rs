//! # Solo Consensus
//!
//! **Crate:** aln-05
//!
//! ## Purpose
//!
//! A single authority admits chainlexeme transactions into a FIFO pool
//! and seals them into blocks on a fixed cadence. There is no voting and
//! no fork choice: the scheduler's chain is the chain.
//!
//! ## Admission Pipeline
//!
//! | Stage | Rejection |
//! |-------|-----------|
//! | structural validation | [`SubmissionError::Structural`] |
//! | conservation pre-check | [`SubmissionError::Safety`] |
//! | resource limits | [`SubmissionError::Safety`] |
//! | [`PolicyValidator`] (optional) | [`SubmissionError::Policy`] |
//!
//! ## Production Tick
//!
//! ```text
//! drain <= max_tx_per_block (FIFO)
//!   -> header chained to tip, timestamp = max(now, tip + 1)
//!   -> Ledger::apply_block
//!        Err  -> batch restored to the pool front, ConsensusError::Batch
//!        Ok   -> finalize, append, broadcast NewBlockEvent
//! ```
//!
//! Transactions that fail when applied are dropped, not re-queued. The
//! event lists them.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{ChatMetadataPolicy, JURISDICTIONS};
pub use config::{ConsensusConfig, ConsensusConfigError};
pub use domain::chain::ChainState;
pub use domain::errors::{ConsensusError, Result, SubmissionError, SubmitWarning};
pub use domain::mempool::{Mempool, MempoolEntry};
pub use events::NewBlockEvent;
pub use metrics::{MetricsSnapshot, ProductionMetrics};
pub use ports::{PolicyDecision, PolicyValidator, SystemTimeSource, TimeSource};
pub use service::{NodeStatus, SoloConsensus, SubmitReceipt};
