//! Codec module - message body encoding/decoding.
//!
//! - [`TextCodec`] - the wire text scheme used for routes and JSON bodies
//! - [`BodyCodec`]/[`CodecRegistry`] - per-route structured codec lookup,
//!   consulted before the JSON fallback
//! - [`MsgPackCodec`] - built-in MessagePack body codec (to_vec_named for
//!   cross-language struct-as-map compatibility)

mod msgpack;
mod registry;
mod text;

pub use msgpack::MsgPackCodec;
pub use registry::{BodyCodec, CodecRegistry};
pub use text::TextCodec;
