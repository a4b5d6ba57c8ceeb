//! Key namespaces.

pub const ACCOUNT_PREFIX: &str = "acc:";
pub const PROPOSAL_PREFIX: &str = "prop:";
pub const MIGRATION_PREFIX: &str = "mig:";
pub const AUDIT_PREFIX: &str = "audit:";

pub fn account_key(address: &str) -> String {
    format!("{}{}", ACCOUNT_PREFIX, address)
}

pub fn proposal_key(proposal_id: &str) -> String {
    format!("{}{}", PROPOSAL_PREFIX, proposal_id)
}

pub fn migration_key(source_tx_hash: &str) -> String {
    format!("{}{}", MIGRATION_PREFIX, source_tx_hash)
}

pub fn audit_key(from: &str, timestamp: u64, nonce: u64, op_code: &str) -> String {
    format!("{}{}:{}:{}:{}", AUDIT_PREFIX, from, timestamp, nonce, op_code)
}
