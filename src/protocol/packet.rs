//! Package framing - the outer protocol envelope.
//!
//! Implements the 4-byte header format:
//! ```text
//! ┌──────┬─────────────┬──────────────────┐
//! │ kind │ body length │       body       │
//! │ 1 B  │ 3 B, BE     │  length bytes    │
//! └──────┴─────────────┴──────────────────┘
//! ```
//!
//! A single transport delivery may pack several packages back to back;
//! [`Packet::decode`] consumes the whole buffer and returns them in order.

use bytes::Bytes;

use crate::error::{GatewireError, Result};

/// Package header size in bytes (fixed, exactly 4).
pub const PKG_HEAD_BYTES: usize = 4;

/// Maximum body length expressible in the 3-byte length field.
pub const PKG_BODY_MAX: usize = 0xFF_FF_FF;

/// Package kind - the control/data envelope discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    /// Client-initiated negotiation, and the server's reply.
    Handshake = 1,
    /// Client acknowledgment completing the handshake.
    HandshakeAck = 2,
    /// Liveness probe, empty body.
    Heartbeat = 3,
    /// Carries an inner [`Message`](super::Message) frame.
    Data = 4,
    /// Server-initiated eviction, body holds the reason.
    Kick = 5,
}

impl PacketKind {
    /// Parse a kind byte.
    ///
    /// Returns `UnknownPacketKind` for bytes outside the five defined values.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(PacketKind::Handshake),
            2 => Ok(PacketKind::HandshakeAck),
            3 => Ok(PacketKind::Heartbeat),
            4 => Ok(PacketKind::Data),
            5 => Ok(PacketKind::Kick),
            other => Err(GatewireError::UnknownPacketKind(other)),
        }
    }

    /// The wire byte for this kind.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A decoded package frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Envelope discriminator.
    pub kind: PacketKind,
    /// Raw body bytes, possibly empty (Heartbeat/HandshakeAck carry none).
    pub body: Bytes,
}

impl Packet {
    /// Create a packet from kind and body.
    pub fn new(kind: PacketKind, body: Bytes) -> Self {
        Self { kind, body }
    }

    /// Create a body-less packet (Heartbeat, HandshakeAck).
    pub fn empty(kind: PacketKind) -> Self {
        Self {
            kind,
            body: Bytes::new(),
        }
    }

    /// Encode this packet to wire bytes.
    ///
    /// The buffer is sized up front: 4 header bytes plus the body.
    pub fn encode(&self) -> Vec<u8> {
        let length = self.body.len();
        debug_assert!(length <= PKG_BODY_MAX);

        let mut buf = Vec::with_capacity(PKG_HEAD_BYTES + length);
        buf.push(self.kind.as_byte());
        buf.push(((length >> 16) & 0xff) as u8);
        buf.push(((length >> 8) & 0xff) as u8);
        buf.push((length & 0xff) as u8);
        buf.extend_from_slice(&self.body);
        buf
    }

    /// Decode every packet packed into `buffer`, in arrival order.
    ///
    /// Transport message boundaries are not frame boundaries: one delivery
    /// may bundle any number of packages, including zero. The buffer must be
    /// consumed exactly; a short header or short body fails with
    /// `TruncatedFrame` so the caller can tear the connection down instead of
    /// silently losing frames.
    pub fn decode(buffer: &[u8]) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut offset = 0;

        while offset < buffer.len() {
            let remaining = buffer.len() - offset;
            if remaining < PKG_HEAD_BYTES {
                return Err(GatewireError::TruncatedFrame {
                    needed: PKG_HEAD_BYTES,
                    remaining,
                });
            }

            let kind = PacketKind::from_byte(buffer[offset])?;
            let length = ((buffer[offset + 1] as usize) << 16)
                | ((buffer[offset + 2] as usize) << 8)
                | (buffer[offset + 3] as usize);
            offset += PKG_HEAD_BYTES;

            if buffer.len() - offset < length {
                return Err(GatewireError::TruncatedFrame {
                    needed: length,
                    remaining: buffer.len() - offset,
                });
            }

            let body = Bytes::copy_from_slice(&buffer[offset..offset + length]);
            offset += length;
            packets.push(Packet { kind, body });
        }

        Ok(packets)
    }
}
