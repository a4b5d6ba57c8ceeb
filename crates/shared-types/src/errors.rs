//! Errors for primitive conversions.

use thiserror::Error;

/// Failures converting text into primitive values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    /// The text is not a plain base-10 integer.
    #[error("invalid decimal amount: {0}")]
    InvalidDecimal(String),

    /// The decimal value does not fit in 256 bits.
    #[error("amount exceeds 2^256-1: {0}")]
    AmountOverflow(String),

    /// Hex text is malformed or has the wrong length.
    #[error("invalid hash hex: {0}")]
    InvalidHashHex(String),
}
