//! # Core Primitive Entities
//!
//! Hashes, addresses and amounts as they appear in chainlexemes, ledger
//! records and block headers.

use crate::errors::PrimitiveError;
use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// The all-zero hash: genesis parent, empty roots, unset validator set.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Every ledger address starts with this prefix.
pub const ADDRESS_PREFIX: &str = "aln1";

/// Asset id stored in the account's primary `balance` field.
pub const NATIVE_ASSET: &str = "ALN";

/// Returns true when `address` carries the ALN address prefix.
#[inline]
pub fn is_aln_address(address: &str) -> bool {
    address.starts_with(ADDRESS_PREFIX)
}

/// Lowercase hex rendering of a hash (64 characters, no prefix).
#[inline]
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64-character hex string (optional `0x`) into a hash.
pub fn hash_from_hex(text: &str) -> Result<Hash, PrimitiveError> {
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(stripped).map_err(|_| PrimitiveError::InvalidHashHex(text.into()))?;
    bytes
        .try_into()
        .map_err(|_| PrimitiveError::InvalidHashHex(text.into()))
}

/// A non-negative integer amount bounded by 2^256-1.
///
/// Serialized as a base-10 string so that values past the range of JSON
/// numbers survive storage and hashing unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::zero());
    pub const MAX: Amount = Amount(U256::MAX);

    /// Parse a plain base-10 integer. Signs, separators and fractions are rejected.
    pub fn from_dec_str(text: &str) -> Result<Self, PrimitiveError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitiveError::InvalidDecimal(text.to_string()));
        }
        U256::from_dec_str(text)
            .map(Amount)
            .map_err(|_| PrimitiveError::AmountOverflow(text.to_string()))
    }

    /// `10^exp`, saturating at [`Amount::MAX`].
    pub fn exp10(exp: usize) -> Self {
        let mut value = U256::one();
        for _ in 0..exp {
            value = value.saturating_mul(U256::from(10u8));
        }
        Amount(value)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Amount)
    }

    #[inline]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Amount)
    }

    #[inline]
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        self.0.checked_mul(other.0).map(Amount)
    }

    #[inline]
    pub fn into_inner(self) -> U256 {
        self.0
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Amount(U256::from(v))
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Amount(U256::from(v))
    }
}

impl From<U256> for Amount {
    fn from(v: U256) -> Self {
        Amount(v)
    }
}

impl FromStr for Amount {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::from_dec_str(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // U256's Display is base-10.
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal string or an unsigned integer")
            }

            fn visit_str<E>(self, value: &str) -> Result<Amount, E>
            where
                E: de::Error,
            {
                Amount::from_dec_str(value).map_err(de::Error::custom)
            }

            fn visit_u64<E>(self, value: u64) -> Result<Amount, E>
            where
                E: de::Error,
            {
                Ok(Amount::from(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Amount, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(Amount::from)
                    .map_err(|_| de::Error::custom("amount must not be negative"))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
