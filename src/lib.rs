//! # gatewire-client
//!
//! Rust client SDK for the Gatewire framed WebSocket RPC/push protocol.
//!
//! This crate lets an application talk to a gatewire-style gateway server:
//! send request/notify messages, receive correlated responses and
//! server-pushed events, and stay live through the heartbeat protocol with
//! automatic reconnection.
//!
//! ## Architecture
//!
//! - **Package layer**: `[kind][3-byte length][body]` control/data envelope
//! - **Message layer**: request/notify/response/push frames with varint ids
//!   and dictionary-compressed routes, carried inside Data packages
//! - **Session**: a single actor task driving handshake negotiation,
//!   heartbeat scheduling, request correlation and bounded-backoff reconnect
//!
//! ## Example
//!
//! ```ignore
//! use gatewire_client::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut client, mut events) = Client::builder("127.0.0.1")
//!         .port(3250)
//!         .reconnect(true)
//!         .start();
//!
//!     client.ready().await.unwrap();
//!     let reply = client
//!         .request("connector.entry", serde_json::json!({"token": "abc"}))
//!         .await
//!         .unwrap();
//!     println!("entered: {}", reply);
//! }
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod session;
pub mod signer;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder};
pub use error::{GatewireError, Result};
pub use session::SessionEvent;
