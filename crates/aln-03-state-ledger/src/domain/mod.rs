pub mod cache;
pub mod config;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod ledger;
pub mod state_root;
