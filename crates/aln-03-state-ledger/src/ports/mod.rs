//! Port definitions for the ledger.

pub mod outbound;

pub use outbound::{BatchOperation, KeyValueStore, KvStoreError, ScanResult};
