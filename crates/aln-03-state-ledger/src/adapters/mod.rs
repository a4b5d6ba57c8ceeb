//! Storage adapters implementing [`KeyValueStore`](crate::ports::KeyValueStore).

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;

pub use memory::InMemoryKvStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbConfig, RocksDbKvStore};
