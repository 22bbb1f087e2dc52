//! Wire text codec.
//!
//! Strings cross the wire in a compact 1/2/3-byte scheme over UTF-16 code
//! units: units <=0x7F take one byte, <=0x7FF two (`110xxxxx 10xxxxxx`),
//! everything else three (`1110xxxx 10xxxxxx 10xxxxxx`). There is no 4-byte
//! form: code points outside the Basic Multilingual Plane travel as two
//! 3-byte surrogate sequences (CESU-8 shape, not standard UTF-8). Deployed
//! gateway peers expect exactly these bytes, so the limitation is kept.

/// Text codec for route strings and JSON message bodies.
///
/// Marker struct with static methods; decoding never fails - truncated
/// trailing sequences read missing continuation bytes as zero and invalid
/// surrogates decode lossily.
pub struct TextCodec;

impl TextCodec {
    /// Encode a string to wire bytes.
    pub fn encode(text: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(text.len() * 3);

        for unit in text.encode_utf16() {
            if unit <= 0x7f {
                buf.push(unit as u8);
            } else if unit <= 0x7ff {
                buf.push(0xc0 | (unit >> 6) as u8);
                buf.push(0x80 | (unit & 0x3f) as u8);
            } else {
                buf.push(0xe0 | (unit >> 12) as u8);
                buf.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                buf.push(0x80 | (unit & 0x3f) as u8);
            }
        }

        buf
    }

    /// Decode wire bytes back to a string.
    pub fn decode(bytes: &[u8]) -> String {
        let mut units = Vec::with_capacity(bytes.len());
        let mut offset = 0;

        while offset < bytes.len() {
            let lead = bytes[offset];
            if lead < 0x80 {
                units.push(lead as u16);
                offset += 1;
            } else if lead < 0xe0 {
                let b1 = bytes.get(offset + 1).copied().unwrap_or(0);
                units.push((((lead & 0x3f) as u16) << 6) | (b1 & 0x3f) as u16);
                offset += 2;
            } else {
                let b1 = bytes.get(offset + 1).copied().unwrap_or(0);
                let b2 = bytes.get(offset + 2).copied().unwrap_or(0);
                units.push(
                    (((lead & 0x0f) as u16) << 12)
                        | (((b1 & 0x3f) as u16) << 6)
                        | (b2 & 0x3f) as u16,
                );
                offset += 3;
            }
        }

        String::from_utf16_lossy(&units)
    }
}
