//! # Signer Port
//!
//! Key custody lives outside the node. A signer receives the digest from
//! [`Chainlexeme::signing_digest`](crate::Chainlexeme::signing_digest) and
//! returns `ed25519:0x<hex>`.

use shared_types::Hash;
use thiserror::Error;

pub const SIGNATURE_PREFIX: &str = "ed25519:";

/// Produces signatures over transaction digests.
pub trait Signer: Send + Sync {
    fn sign(&self, digest: &Hash) -> Result<String, SignerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    #[error("signature `{0}` is not of the form ed25519:0x<hex>")]
    MalformedSignature(String),
}

/// True for `ed25519:0x` followed by a non-empty, even-length hex string.
pub fn is_ed25519_signature_format(signature: &str) -> bool {
    let Some(body) = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .and_then(|rest| rest.strip_prefix("0x"))
    else {
        return false;
    };
    !body.is_empty() && hex::decode(body).is_ok()
}
