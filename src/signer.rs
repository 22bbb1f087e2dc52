//! Message signing boundary.
//!
//! The protocol can tag outgoing bodies with an asymmetric signature; the
//! crate only defines the seam. Applications inject an implementation (the
//! key generation and signature algorithm are theirs), the session announces
//! the public-key material during the handshake and attaches signatures
//! under the reserved `__crypto__` field.

use serde::Serialize;

use crate::error::Result;

/// Reserved body field carrying the signature.
pub const CRYPTO_FIELD: &str = "__crypto__";

/// Public-key material advertised in the handshake `sys.rsa` field.
#[derive(Debug, Clone, Serialize)]
pub struct PublicKeyParams {
    /// Modulus, hex encoded.
    pub n: String,
    /// Public exponent.
    pub e: u64,
}

/// Application-supplied signer for outgoing message bodies.
pub trait Signer: Send + Sync {
    /// Public-key material to announce during the handshake.
    fn public_key(&self) -> PublicKeyParams;

    /// Sign a serialized JSON payload, returning the signature string.
    fn sign(&self, payload: &str) -> Result<String>;
}
