//! MsgPack body codec using `rmp-serde`.
//!
//! **CRITICAL**: Always use `to_vec_named`, NEVER `to_vec`!
//! Gateway peers in other languages expect struct-as-map format; positional
//! arrays will not deserialize on their side.
//!
//! Register this (or any other [`BodyCodec`]) per route to replace the
//! default JSON text pipeline with schema-encoded binary bodies:
//!
//! ```
//! use std::sync::Arc;
//! use gatewire_client::codec::{CodecRegistry, MsgPackCodec};
//!
//! let mut registry = CodecRegistry::new();
//! registry.register("area.move", Arc::new(MsgPackCodec));
//! ```

use serde_json::Value;

use super::registry::BodyCodec;
use crate::error::Result;

/// MessagePack codec for structured message bodies.
///
/// Uses `rmp_serde::to_vec_named` so structs cross the wire as maps (with
/// field names) rather than positional arrays.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        // CRITICAL: to_vec_named, NOT to_vec!
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl BodyCodec for MsgPackCodec {
    fn encode(&self, body: &Value) -> Result<Vec<u8>> {
        MsgPackCodec::encode(body)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        MsgPackCodec::decode(bytes)
    }
}
