//! # Genesis Allocations
//!
//! Seeds the ledger with configured balances and voting power before the
//! genesis block is sealed, so the genesis state root commits to them.

use crate::config::ConfigError;
use aln_03_state_ledger::{Account, KeyValueStore, Ledger, LedgerError};
use serde::Deserialize;
use shared_types::{is_aln_address, Amount};
use std::collections::HashSet;
use tracing::{debug, info};

/// One funded account at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisAllocation {
    pub address: String,
    pub balance: Amount,
    #[serde(default)]
    pub voting_power: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub allocations: Vec<GenesisAllocation>,
}

impl GenesisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for allocation in &self.allocations {
            if !is_aln_address(&allocation.address) {
                return Err(ConfigError::InvalidAllocationAddress(
                    allocation.address.clone(),
                ));
            }
            if !seen.insert(allocation.address.as_str()) {
                return Err(ConfigError::DuplicateAllocation(allocation.address.clone()));
            }
        }
        Ok(())
    }

    /// Write every allocation whose account does not exist yet.
    ///
    /// Accounts already in the store are left alone so a node restarted
    /// over a persistent backend keeps its balances. Returns the number of
    /// accounts created.
    pub fn apply<S: KeyValueStore>(&self, ledger: &mut Ledger<S>) -> Result<usize, LedgerError> {
        let mut created = 0;

        for allocation in &self.allocations {
            if ledger.get_account(&allocation.address)?.is_some() {
                debug!(
                    address = %allocation.address,
                    "[aln-node] Genesis account already present, skipping"
                );
                continue;
            }

            let account = Account::new(allocation.address.as_str())
                .with_balance(allocation.balance)
                .with_voting_power(allocation.voting_power);
            ledger.set_account(&allocation.address, &account)?;
            created += 1;
        }

        info!(
            configured = self.allocations.len(),
            created,
            "[aln-node] Genesis allocations applied"
        );
        Ok(created)
    }
}
