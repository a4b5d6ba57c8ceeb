//! Read-through account cache.
//!
//! Holds committed accounts only. Pending writes shadow it during a block,
//! and the ledger clears it after every commit.

use super::entities::Account;
use lru::LruCache;
use std::num::NonZeroUsize;

pub struct AccountCache {
    cache: LruCache<String, Account>,
    hits: u64,
    misses: u64,
}

impl AccountCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, address: &str) -> Option<Account> {
        match self.cache.get(address) {
            Some(account) => {
                self.hits += 1;
                Some(account.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, account: Account) {
        self.cache.put(account.address.clone(), account);
    }

    pub fn invalidate(&mut self, address: &str) {
        self.cache.pop(address);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            capacity: self.cache.cap().get(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}
