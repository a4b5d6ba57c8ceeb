use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Accounts held by the read-through cache.
    pub cache_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10_000,
        }
    }
}
