//! # Shared Types Crate
//!
//! Primitive building blocks used across the ALN node crates.
//!
//! ## Contents
//!
//! - [`Hash`] and the hex helpers used to render it
//! - [`Amount`]: a non-negative 256-bit integer serialized as a decimal string
//! - [`hashing`]: SHA-256 and the pairwise Merkle fold shared by the state
//!   root and the transaction root
//! - [`TimeSource`]: the wall clock as an injectable port

pub mod entities;
pub mod errors;
pub mod hashing;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use hashing::{merkle_root, sha256, sha256_concat};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
