//! # Outbound Ports (Driven Ports)
//!
//! The persistence collaborator the ledger depends on.

use thiserror::Error;

/// Key/value pairs returned by scans, ordered by key.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value storage.
///
/// Implementations: `InMemoryKvStore` for tests and development,
/// `RocksDbKvStore` for production behind the `rocksdb` feature.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvStoreError>;

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KvStoreError>;

    fn delete(&mut self, key: &[u8]) -> Result<(), KvStoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, KvStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Execute an atomic batch write.
    ///
    /// Either every operation in the batch is applied, or none is.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KvStoreError>;

    /// All entries whose key starts with `prefix`, ordered by key.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KvStoreError>;

    /// Every entry in the store, ordered by key.
    fn iter_all(&self) -> Result<ScanResult, KvStoreError> {
        self.prefix_scan(&[])
    }
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }

    pub fn key(&self) -> &[u8] {
        match self {
            BatchOperation::Put { key, .. } | BatchOperation::Delete { key } => key,
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvStoreError {
    #[error("KV store I/O error: {message}")]
    IoError { message: String },

    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}
