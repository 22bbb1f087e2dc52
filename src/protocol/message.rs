//! Message framing - the inner frame carried inside Data packages.
//!
//! Layout:
//! ```text
//! ┌──────┬─────────────┬───────────┬──────┐
//! │ flag │ id (varint) │   route   │ body │
//! │ 1 B  │ 0-5 B       │ 0/2/1+n B │  …   │
//! └──────┴─────────────┴───────────┴──────┘
//! ```
//!
//! - Flag byte: `(kind << 1) | compressed_route_bit`.
//! - Id: base-128 varint, least significant group first, continuation bit
//!   0x80; present only for Request/Response.
//! - Route: present only for Request/Notify/Push. Compressed form is a
//!   2-byte big-endian dictionary code; uncompressed form is a length byte
//!   followed by text-codec bytes (255 max).
//! - Body: everything after the route, raw.

use bytes::Bytes;

use crate::codec::TextCodec;
use crate::error::{GatewireError, Result};

/// Flag byte size.
pub const MSG_FLAG_BYTES: usize = 1;

/// Compressed route code size.
pub const MSG_ROUTE_CODE_BYTES: usize = 2;

/// Uncompressed route length-prefix size.
pub const MSG_ROUTE_LEN_BYTES: usize = 1;

/// Maximum encoded length of an uncompressed route.
pub const MSG_ROUTE_MAX_BYTES: usize = 255;

/// Flag-byte bit layout.
pub mod flags {
    /// Low bit: route is a dictionary code.
    pub const COMPRESS_ROUTE_MASK: u8 = 0x1;
    /// Three kind bits above the compression bit.
    pub const KIND_MASK: u8 = 0x7;

    /// Pack a flag byte from kind bits and the compression flag.
    #[inline]
    pub fn pack(kind: u8, compressed: bool) -> u8 {
        (kind << 1) | compressed as u8
    }

    /// Extract the kind bits from a flag byte.
    #[inline]
    pub fn kind_bits(flag: u8) -> u8 {
        (flag >> 1) & KIND_MASK
    }

    /// Extract the compression flag from a flag byte.
    #[inline]
    pub fn is_compressed(flag: u8) -> bool {
        flag & COMPRESS_ROUTE_MASK != 0
    }
}

/// Message kind - request/notify/response/push framing discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    /// Client call expecting a correlated Response.
    Request = 0,
    /// Client call with no response (id 0 on the wire).
    Notify = 1,
    /// Server reply correlated to a Request; carries no route.
    Response = 2,
    /// Uncorrelated server-originated event.
    Push = 3,
}

impl MessageKind {
    /// Parse the 3-bit kind field.
    ///
    /// Values 4-7 are undefined and fail with `UnsupportedKind`.
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(MessageKind::Request),
            1 => Ok(MessageKind::Notify),
            2 => Ok(MessageKind::Response),
            3 => Ok(MessageKind::Push),
            other => Err(GatewireError::UnsupportedKind(other)),
        }
    }

    /// Whether frames of this kind carry a varint id.
    #[inline]
    pub fn has_id(self) -> bool {
        matches!(self, MessageKind::Request | MessageKind::Response)
    }

    /// Whether frames of this kind carry a route.
    #[inline]
    pub fn has_route(self) -> bool {
        matches!(
            self,
            MessageKind::Request | MessageKind::Notify | MessageKind::Push
        )
    }
}

/// Route field of a message: a plain string or a dictionary code.
///
/// The code variant is `u16`, so the 0..=65535 wire range is enforced by the
/// type; there is no overflow path at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Uncompressed route string.
    Text(String),
    /// Dictionary-compressed numeric code.
    Code(u16),
}

/// A decoded (or to-be-encoded) message frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Request/response correlation id; 0 for Notify/Push.
    pub id: u32,
    /// Frame discriminator.
    pub kind: MessageKind,
    /// Route, present only for Request/Notify/Push.
    pub route: Option<Route>,
    /// Application payload bytes.
    pub body: Bytes,
}

impl Message {
    /// Build a Request frame. `id` must be non-zero.
    pub fn request(id: u32, route: Route, body: Bytes) -> Self {
        debug_assert!(id != 0);
        Self {
            id,
            kind: MessageKind::Request,
            route: Some(route),
            body,
        }
    }

    /// Build a Notify frame (id 0 on the wire).
    pub fn notify(route: Route, body: Bytes) -> Self {
        Self {
            id: 0,
            kind: MessageKind::Notify,
            route: Some(route),
            body,
        }
    }

    /// Build a Response frame. Responses carry no route.
    pub fn response(id: u32, body: Bytes) -> Self {
        debug_assert!(id != 0);
        Self {
            id,
            kind: MessageKind::Response,
            route: None,
            body,
        }
    }

    /// Build a Push frame (id 0 on the wire).
    pub fn push(route: Route, body: Bytes) -> Self {
        Self {
            id: 0,
            kind: MessageKind::Push,
            route: Some(route),
            body,
        }
    }

    /// Whether the route field is dictionary-compressed.
    #[inline]
    pub fn route_compressed(&self) -> bool {
        matches!(self.route, Some(Route::Code(_)))
    }

    /// Encode this message to wire bytes.
    ///
    /// The buffer is sized exactly up front; no resizing happens during the
    /// write. Fails with `RouteTooLong` if an uncompressed route encodes to
    /// more than 255 bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let route_bytes = match (&self.route, self.kind.has_route()) {
            (Some(Route::Text(route)), true) => Some(TextCodec::encode(route)),
            (Some(Route::Code(_)), true) => None,
            (None, true) => {
                return Err(GatewireError::Protocol(format!(
                    "{:?} message without a route",
                    self.kind
                )))
            }
            (_, false) => None,
        };

        if let Some(encoded) = &route_bytes {
            if encoded.len() > MSG_ROUTE_MAX_BYTES {
                return Err(GatewireError::RouteTooLong(encoded.len()));
            }
        }

        let id_len = if self.kind.has_id() {
            varint_len(self.id)
        } else {
            0
        };
        let route_len = if self.kind.has_route() {
            match &self.route {
                Some(Route::Code(_)) => MSG_ROUTE_CODE_BYTES,
                _ => MSG_ROUTE_LEN_BYTES + route_bytes.as_ref().map_or(0, |r| r.len()),
            }
        } else {
            0
        };

        let mut buf = Vec::with_capacity(MSG_FLAG_BYTES + id_len + route_len + self.body.len());

        buf.push(flags::pack(self.kind as u8, self.route_compressed()));

        if self.kind.has_id() {
            encode_varint(self.id, &mut buf);
        }

        if self.kind.has_route() {
            match &self.route {
                Some(Route::Code(code)) => buf.extend_from_slice(&code.to_be_bytes()),
                _ => {
                    let encoded = route_bytes.unwrap_or_default();
                    buf.push(encoded.len() as u8);
                    buf.extend_from_slice(&encoded);
                }
            }
        }

        buf.extend_from_slice(&self.body);
        Ok(buf)
    }

    /// Decode a message frame.
    ///
    /// Pure and tolerant: beyond the flag byte (whose kind bits must be one
    /// of the four defined values) no internal consistency is validated, and
    /// a frame cut short mid-field reads missing bytes as zero rather than
    /// failing.
    pub fn decode(bytes: &[u8]) -> Result<Message> {
        let flag = bytes.first().copied().unwrap_or(0);
        let kind = MessageKind::from_bits(flags::kind_bits(flag))?;
        let compressed = flags::is_compressed(flag);
        let mut offset = MSG_FLAG_BYTES;

        let mut id: u32 = 0;
        if kind.has_id() {
            let mut shift = 0u32;
            loop {
                let byte = bytes.get(offset).copied().unwrap_or(0);
                id = id.wrapping_add(((byte & 0x7f) as u32) << shift.min(31));
                offset += 1;
                shift += 7;
                if byte < 0x80 {
                    break;
                }
            }
        }

        let route = if kind.has_route() {
            if compressed {
                let hi = bytes.get(offset).copied().unwrap_or(0);
                let lo = bytes.get(offset + 1).copied().unwrap_or(0);
                offset += MSG_ROUTE_CODE_BYTES;
                Some(Route::Code(u16::from_be_bytes([hi, lo])))
            } else {
                let len = bytes.get(offset).copied().unwrap_or(0) as usize;
                offset += MSG_ROUTE_LEN_BYTES;
                let end = (offset + len).min(bytes.len());
                let route = TextCodec::decode(&bytes[offset.min(bytes.len())..end]);
                offset += len;
                Some(Route::Text(route))
            }
        } else {
            None
        };

        let body = if offset < bytes.len() {
            Bytes::copy_from_slice(&bytes[offset..])
        } else {
            Bytes::new()
        };

        Ok(Message {
            id,
            kind,
            route,
            body,
        })
    }
}

/// Number of varint bytes needed for `id`.
fn varint_len(id: u32) -> usize {
    let mut len = 1;
    let mut rest = id >> 7;
    while rest > 0 {
        len += 1;
        rest >>= 7;
    }
    len
}

/// Append `id` as a base-128 varint, least significant group first.
fn encode_varint(id: u32, buf: &mut Vec<u8>) {
    let mut rest = id;
    loop {
        let mut byte = (rest & 0x7f) as u8;
        rest >>= 7;
        if rest != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if rest == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(message: Message) {
        let encoded = message.encode().unwrap();
        let decoded = Message::decode(&encoded).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_flag_byte_layout() {
        let request = Message::request(1, Route::Code(7), Bytes::new());
        assert_eq!(request.encode().unwrap()[0], 0x01); // kind 0, compressed

        let notify = Message::notify(Route::Text("a".into()), Bytes::new());
        assert_eq!(notify.encode().unwrap()[0], 0x02); // kind 1

        let response = Message::response(1, Bytes::new());
        assert_eq!(response.encode().unwrap()[0], 0x04); // kind 2

        let push = Message::push(Route::Text("a".into()), Bytes::new());
        assert_eq!(push.encode().unwrap()[0], 0x06); // kind 3
    }

    #[test]
    fn test_varint_boundaries() {
        // Single byte up to 127.
        let encoded = Message::response(127, Bytes::new()).encode().unwrap();
        assert_eq!(&encoded[1..], &[0x7F]);

        // 128 rolls into a continuation byte, LSB group first.
        let encoded = Message::response(128, Bytes::new()).encode().unwrap();
        assert_eq!(&encoded[1..], &[0x80, 0x01]);

        // 300 = 0b10_0101100.
        let encoded = Message::response(300, Bytes::new()).encode().unwrap();
        assert_eq!(&encoded[1..], &[0xAC, 0x02]);
    }

    #[test]
    fn test_varint_roundtrip_large_ids() {
        for id in [1u32, 127, 128, 300, 16_383, 16_384, 2_097_151, u32::MAX] {
            roundtrip(Message::response(id, Bytes::from_static(b"x")));
        }
    }

    #[test]
    fn test_request_roundtrip_text_route() {
        roundtrip(Message::request(
            42,
            Route::Text("chat.send".into()),
            Bytes::from_static(b"{\"msg\":\"hi\"}"),
        ));
    }

    #[test]
    fn test_request_roundtrip_compressed_route() {
        roundtrip(Message::request(1, Route::Code(1), Bytes::from_static(b"{}")));
        roundtrip(Message::request(9, Route::Code(u16::MAX), Bytes::new()));
    }

    #[test]
    fn test_compressed_route_wire_bytes() {
        let encoded = Message::notify(Route::Code(0x0102), Bytes::new())
            .encode()
            .unwrap();
        // flag, then 2-byte big-endian code, no id for Notify.
        assert_eq!(encoded, vec![0x03, 0x01, 0x02]);
    }

    #[test]
    fn test_notify_and_push_carry_no_id() {
        let encoded = Message::notify(Route::Text("a.b".into()), Bytes::new())
            .encode()
            .unwrap();
        // flag + len byte + 3 route bytes, nothing else.
        assert_eq!(encoded.len(), 1 + 1 + 3);

        let decoded = Message::decode(&encoded).unwrap();
        assert_eq!(decoded.id, 0);
    }

    #[test]
    fn test_response_carries_no_route() {
        let encoded = Message::response(5, Bytes::from_static(b"ok"))
            .encode()
            .unwrap();
        let decoded = Message::decode(&encoded).unwrap();

        assert_eq!(decoded.route, None);
        assert_eq!(&decoded.body[..], b"ok");
    }

    #[test]
    fn test_empty_route_distinct_from_absent() {
        let encoded = Message::push(Route::Text(String::new()), Bytes::from_static(b"x"))
            .encode()
            .unwrap();
        let decoded = Message::decode(&encoded).unwrap();

        assert_eq!(decoded.route, Some(Route::Text(String::new())));
    }

    #[test]
    fn test_route_length_boundary() {
        let route_255 = "r".repeat(255);
        assert!(Message::push(Route::Text(route_255), Bytes::new())
            .encode()
            .is_ok());

        let route_256 = "r".repeat(256);
        let result = Message::push(Route::Text(route_256), Bytes::new()).encode();
        assert!(matches!(result, Err(GatewireError::RouteTooLong(256))));
    }

    #[test]
    fn test_route_length_counts_encoded_bytes() {
        // 3 wire bytes per char, so 86 chars encode to 258 bytes.
        let route = "中".repeat(86);
        let result = Message::push(Route::Text(route), Bytes::new()).encode();
        assert!(matches!(result, Err(GatewireError::RouteTooLong(258))));
    }

    #[test]
    fn test_decode_unsupported_kind() {
        // Kind bits 4 in the flag byte.
        let result = Message::decode(&[4 << 1]);
        assert!(matches!(result, Err(GatewireError::UnsupportedKind(4))));
    }

    #[test]
    fn test_decode_tolerates_truncated_frame() {
        // Request claiming a 10-byte route, cut after 2 route bytes.
        let decoded = Message::decode(&[0x00, 0x01, 10, b'a', b'b']).unwrap();
        assert_eq!(decoded.kind, MessageKind::Request);
        assert_eq!(decoded.id, 1);
        assert_eq!(decoded.route, Some(Route::Text("ab".into())));
        assert!(decoded.body.is_empty());
    }

    #[test]
    fn test_missing_route_rejected_at_encode() {
        let message = Message {
            id: 0,
            kind: MessageKind::Push,
            route: None,
            body: Bytes::new(),
        };
        assert!(matches!(
            message.encode(),
            Err(GatewireError::Protocol(_))
        ));
    }
}
