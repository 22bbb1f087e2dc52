//! Error types for gatewire-client.

use thiserror::Error;

/// Main error type for all gatewire operations.
#[derive(Debug, Error)]
pub enum GatewireError {
    /// I/O error during transport operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (handshake, kick, default body pipeline).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error (structured body codec).
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Uncompressed route exceeds the 255-byte wire limit.
    #[error("route exceeds 255 encoded bytes: {0}")]
    RouteTooLong(usize),

    /// Message flag byte carries a kind outside the four defined values.
    #[error("unsupported message kind: {0}")]
    UnsupportedKind(u8),

    /// Package kind byte outside the five defined values.
    #[error("unknown package kind: {0}")]
    UnknownPacketKind(u8),

    /// Package frame cut short: header or body bytes missing from the buffer.
    #[error("truncated package frame: need {needed} bytes, {remaining} remaining")]
    TruncatedFrame { needed: usize, remaining: usize },

    /// Protocol error (invalid frame, unexpected package, etc.).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport-level failure reported by the connector.
    #[error("transport error: {0}")]
    Transport(String),

    /// Message signing failed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Session closed before the operation could complete.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type alias using GatewireError.
pub type Result<T> = std::result::Result<T, GatewireError>;
