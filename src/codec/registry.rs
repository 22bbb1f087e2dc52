//! Per-route structured codec registry.
//!
//! Some routes carry schema-encoded binary bodies instead of JSON text. The
//! registry maps route strings to an encode/decode pair; the session
//! consults it before falling back to the generic JSON + text pipeline. It
//! is resolved once at construction and never mutated afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// An encode/decode pair for one route's message bodies.
pub trait BodyCodec: Send + Sync {
    /// Encode a structured body to wire bytes.
    fn encode(&self, body: &Value) -> Result<Vec<u8>>;

    /// Decode wire bytes back to a structured body.
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// Route-keyed lookup of structured body codecs.
#[derive(Default, Clone)]
pub struct CodecRegistry {
    by_route: HashMap<String, Arc<dyn BodyCodec>>,
}

impl CodecRegistry {
    /// Create an empty registry (all routes use the JSON fallback).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec for a route.
    pub fn register(&mut self, route: impl Into<String>, codec: Arc<dyn BodyCodec>) {
        self.by_route.insert(route.into(), codec);
    }

    /// The encoder half for a route, if one is registered.
    pub fn encoder_for(&self, route: &str) -> Option<&Arc<dyn BodyCodec>> {
        self.by_route.get(route)
    }

    /// The decoder half for a route, if one is registered.
    pub fn decoder_for(&self, route: &str) -> Option<&Arc<dyn BodyCodec>> {
        self.by_route.get(route)
    }

    /// Whether any codec is registered.
    pub fn is_empty(&self) -> bool {
        self.by_route.is_empty()
    }
}
