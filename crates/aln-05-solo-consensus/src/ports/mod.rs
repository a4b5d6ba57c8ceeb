//! Ports: the seams the scheduler calls out through.

pub mod policy;

pub use policy::{PolicyDecision, PolicyValidator};
pub use shared_types::{SystemTimeSource, TimeSource};
