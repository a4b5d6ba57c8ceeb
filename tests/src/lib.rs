//! # ALN Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks for parse, admit and apply
//! └── src/integration/  # End-to-end flows across all crates
//!     ├── flows.rs      # Deterministic admit → produce → verify scenarios
//!     └── e2e_node.rs   # Assembled node with the timer loop running
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p aln-tests
//! cargo bench -p aln-tests
//! ```

pub mod integration;
