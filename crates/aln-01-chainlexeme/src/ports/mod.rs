//! Ports for collaborators outside the core.

pub mod signer;
