//! # Chainlexeme Document Model
//!
//! **Crate:** aln-01
//!
//! ## Purpose
//!
//! Turns raw chainlexeme text into a three-section record, reports its
//! structural defects, and writes it back out. A document that passes
//! validation becomes a typed, immutable [`Chainlexeme`].
//!
//! ## Document Format
//!
//! ```text
//! [header]
//! op_code: transfer
//! from: aln1alice
//! to: aln1bob
//! nonce: 0
//!
//! [data]
//! amount: 100
//!
//! [footer]
//! signature: ed25519:0x...
//! timestamp: 1700000000
//! gas_limit: 21000
//! gas_price: 100
//! ```
//!
//! ## Value Coercion
//!
//! | Raw text | Value |
//! |----------|-------|
//! | `"..."` / `'...'` | `String` |
//! | `true` / `false` | `Bool` |
//! | `123` | `Integer` (exact digits) |
//! | `1.5` | `Decimal` |
//! | `[a, b]` | `List` |
//! | anything else | `String` |
//!
//! ## Module Structure
//!
//! ```text
//! domain/value.rs       - Value and coercion
//! domain/parser.rs      - parse(text) -> ParsedDocument
//! domain/validator.rs   - validate(doc) -> ValidationReport
//! domain/serializer.rs  - serialize(doc) -> text
//! domain/chainlexeme.rs - OpCode, Chainlexeme, hashing and digests
//! domain/builder.rs     - DocumentBuilder
//! ports/signer.rs       - Signer trait
//! ```

pub mod domain;
pub mod ports;

pub use domain::builder::{DocumentBuilder, GOVERNANCE_ADDRESS};
pub use domain::chainlexeme::{Chainlexeme, Footer, Header, OpCode};
pub use domain::document::{ParsedDocument, Section};
pub use domain::errors::{DocumentError, DocumentWarning, StructuralError};
pub use domain::parser::parse;
pub use domain::serializer::serialize;
pub use domain::validator::{validate, ValidationReport, MIN_GAS_LIMIT};
pub use domain::value::Value;
pub use ports::signer::{is_ed25519_signature_format, Signer, SignerError};
