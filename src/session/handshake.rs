//! Handshake payload types and response codes.
//!
//! The handshake body is a JSON object carried through the text codec:
//! the client announces its type/version (plus optional public-key material
//! when signing is enabled) and an arbitrary user payload; the server
//! replies with a result code, heartbeat parameters and the route
//! compression dictionary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::TextCodec;
use crate::error::Result;
use crate::signer::PublicKeyParams;

/// Client type announced during the handshake.
pub const CLIENT_TYPE: &str = "rust-websocket";

/// Client protocol version announced during the handshake.
pub const CLIENT_VERSION: &str = "0.0.1";

/// Handshake accepted.
pub const RES_OK: u32 = 200;

/// Generic handshake failure.
pub const RES_FAIL: u32 = 500;

/// Client version rejected by the server.
pub const RES_OLD_CLIENT: u32 = 501;

/// Client -> server handshake payload.
#[derive(Debug, Clone, Serialize)]
pub struct HandshakeRequest {
    /// Protocol-level fields.
    pub sys: ClientSys,
    /// Application payload forwarded to the server untouched.
    pub user: Value,
}

/// The `sys` half of the client handshake.
#[derive(Debug, Clone, Serialize)]
pub struct ClientSys {
    /// Client flavor, e.g. "rust-websocket".
    #[serde(rename = "type")]
    pub client_type: String,
    /// Client protocol version.
    pub version: String,
    /// Public-key material when signing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsa: Option<PublicKeyParams>,
}

impl HandshakeRequest {
    /// Build the handshake payload for this client.
    pub fn new(user: Value, rsa: Option<PublicKeyParams>) -> Self {
        Self {
            sys: ClientSys {
                client_type: CLIENT_TYPE.to_string(),
                version: CLIENT_VERSION.to_string(),
                rsa,
            },
            user,
        }
    }

    /// Serialize to wire bytes (JSON through the text codec).
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(TextCodec::encode(&serde_json::to_string(self)?))
    }
}

/// Server -> client handshake payload.
#[derive(Debug, Clone, Deserialize)]
pub struct HandshakeResponse {
    /// Result code: 200 OK, 500 generic failure, 501 old client.
    pub code: u32,
    /// Protocol parameters, present on success.
    #[serde(default)]
    pub sys: Option<ServerSys>,
    /// Application payload handed to the handshake callback.
    #[serde(default)]
    pub user: Option<Value>,
}

/// The `sys` half of the server handshake.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSys {
    /// Heartbeat interval in seconds; absent or 0 disables the heartbeat
    /// for the lifetime of the connection.
    #[serde(default)]
    pub heartbeat: Option<u64>,
    /// Route compression dictionary.
    #[serde(default)]
    pub dict: Option<HashMap<String, u16>>,
}

impl HandshakeResponse {
    /// Parse a handshake package body.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_str(&TextCodec::decode(bytes))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = HandshakeRequest::new(serde_json::json!({"token": "abc"}), None);
        let bytes = request.encode().unwrap();
        let value: Value = serde_json::from_str(&TextCodec::decode(&bytes)).unwrap();

        assert_eq!(value["sys"]["type"], CLIENT_TYPE);
        assert_eq!(value["sys"]["version"], CLIENT_VERSION);
        assert_eq!(value["user"]["token"], "abc");
        assert!(value["sys"].get("rsa").is_none());
    }

    #[test]
    fn test_request_carries_public_key() {
        let request = HandshakeRequest::new(
            Value::Null,
            Some(PublicKeyParams {
                n: "ab12".to_string(),
                e: 0x10001,
            }),
        );
        let bytes = request.encode().unwrap();
        let value: Value = serde_json::from_str(&TextCodec::decode(&bytes)).unwrap();

        assert_eq!(value["sys"]["rsa"]["n"], "ab12");
        assert_eq!(value["sys"]["rsa"]["e"], 0x10001);
    }

    #[test]
    fn test_response_full() {
        let body = TextCodec::encode(
            r#"{"code":200,"sys":{"heartbeat":5,"dict":{"foo.bar":1}},"user":{"id":9}}"#,
        );
        let response = HandshakeResponse::decode(&body).unwrap();

        assert_eq!(response.code, RES_OK);
        let sys = response.sys.unwrap();
        assert_eq!(sys.heartbeat, Some(5));
        assert_eq!(sys.dict.unwrap()["foo.bar"], 1);
        assert_eq!(response.user.unwrap()["id"], 9);
    }

    #[test]
    fn test_response_minimal() {
        let body = TextCodec::encode(r#"{"code":500}"#);
        let response = HandshakeResponse::decode(&body).unwrap();

        assert_eq!(response.code, RES_FAIL);
        assert!(response.sys.is_none());
        assert!(response.user.is_none());
    }

    #[test]
    fn test_response_garbage_fails() {
        assert!(HandshakeResponse::decode(b"not json").is_err());
    }
}
