//! Published events.

use aln_03_state_ledger::FailedTransaction;
use serde::Serialize;
use shared_types::{Hash, Timestamp};

/// Broadcast after every block is appended.
///
/// Transactions that failed when applied are not re-queued. Their hashes
/// and reasons travel here so subscribers can report them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewBlockEvent {
    pub height: u64,
    pub hash: Hash,
    pub timestamp: Timestamp,
    pub tx_count: usize,
    pub applied_tx_count: usize,
    pub failed_tx_count: usize,
    pub failed: Vec<FailedTransaction>,
}
