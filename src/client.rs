//! Client builder and session handle.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the gateway
//! connection. [`ClientBuilder::start`] spawns the session task and returns
//! the [`Client`] handle plus the session event stream; the handle's
//! `request`/`notify` calls enqueue work and return immediately.
//!
//! # Example
//!
//! ```ignore
//! use gatewire_client::{Client, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut client, mut events) = Client::builder("127.0.0.1")
//!         .port(3250)
//!         .user(serde_json::json!({"token": "abc"}))
//!         .reconnect(true)
//!         .start();
//!
//!     client.ready().await?;
//!
//!     let reply = client.request("chat.send", serde_json::json!({"msg": "hi"})).await?;
//!     println!("reply: {}", reply);
//!
//!     while let Some(event) = events.recv().await {
//!         if let SessionEvent::Push { route, body } = event {
//!             println!("{}: {}", route, body);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::codec::{BodyCodec, CodecRegistry};
use crate::error::{GatewireError, Result};
use crate::session::{
    Command, HandshakeCallback, Session, SessionConfig, SessionEvent,
    DEFAULT_MAX_RECONNECT_ATTEMPTS,
};
use crate::signer::Signer;
use crate::transport::{Connector, WsConnector};

/// Builder for configuring and starting a gateway client.
pub struct ClientBuilder {
    host: String,
    port: Option<u16>,
    path: Option<String>,
    user: Value,
    handshake_callback: Option<HandshakeCallback>,
    signer: Option<Arc<dyn Signer>>,
    codecs: CodecRegistry,
    reconnect: bool,
    max_reconnect_attempts: u32,
    connector: Arc<dyn Connector>,
}

impl ClientBuilder {
    /// Create a builder for a gateway at `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            path: None,
            user: Value::Object(Default::default()),
            handshake_callback: None,
            signer: None,
            codecs: CodecRegistry::new(),
            reconnect: false,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connector: Arc::new(WsConnector::new()),
        }
    }

    /// Gateway port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// URL path appended after host and port.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Application payload forwarded in the handshake `user` field.
    pub fn user(mut self, user: Value) -> Self {
        self.user = user;
        self
    }

    /// Callback invoked with the server's handshake `user` payload on every
    /// successful handshake (including reconnects).
    pub fn handshake_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        self.handshake_callback = Some(Arc::new(callback));
        self
    }

    /// Enable body signing. The signer's public-key material is announced
    /// during the handshake.
    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Register a structured body codec for a route, replacing the default
    /// JSON pipeline for that route's messages in both directions.
    pub fn codec(mut self, route: impl Into<String>, codec: Arc<dyn BodyCodec>) -> Self {
        self.codecs.register(route, codec);
        self
    }

    /// Enable automatic reconnection on connection loss.
    pub fn reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Cap on consecutive reconnect attempts. Default: 10.
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Replace the transport factory. Tests use this to swap the WebSocket
    /// for an in-memory transport.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Spawn the session task and begin connecting.
    ///
    /// Returns the client handle and the session event stream. Use
    /// [`Client::ready`] to wait for the first successful handshake.
    pub fn start(self) -> (Client, mpsc::UnboundedReceiver<SessionEvent>) {
        let url = crate::transport::build_url(&self.host, self.port, self.path.as_deref());

        let cfg = SessionConfig {
            url,
            user: self.user,
            handshake_callback: self.handshake_callback,
            signer: self.signer,
            codecs: self.codecs,
            reconnect: self.reconnect,
            max_reconnect_attempts: self.max_reconnect_attempts,
            connector: self.connector,
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        tokio::spawn(Session::new(cfg, event_tx, ready_tx).run(command_rx));

        let _ = command_tx.send(Command::Connect);

        (
            Client {
                commands: command_tx,
                ready: Some(ready_rx),
            },
            event_rx,
        )
    }
}

/// Handle to a running gateway session.
///
/// Cheap to use from async code; every call enqueues a command for the
/// session task and returns without blocking. Dropping the handle tears the
/// session down.
pub struct Client {
    commands: mpsc::UnboundedSender<Command>,
    ready: Option<oneshot::Receiver<Result<()>>>,
}

impl Client {
    /// Create a builder for a gateway at `host`.
    pub fn builder(host: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(host)
    }

    /// Wait for the first successful handshake.
    ///
    /// Resolves `Ok` once the session is established; fails with
    /// `ConnectionClosed` if the session dies first. Subsequent calls return
    /// `Ok` immediately.
    pub async fn ready(&mut self) -> Result<()> {
        match self.ready.take() {
            Some(ready) => ready.await.map_err(|_| GatewireError::ConnectionClosed)?,
            None => Ok(()),
        }
    }

    /// Send a request and await the correlated response body.
    pub async fn request(&self, route: impl Into<String>, body: Value) -> Result<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Request {
                route: route.into(),
                body,
                reply: reply_tx,
            })
            .map_err(|_| GatewireError::ConnectionClosed)?;
        reply_rx.await.map_err(|_| GatewireError::ConnectionClosed)?
    }

    /// Send a fire-and-forget notify (id 0 on the wire, no response).
    pub fn notify(&self, route: impl Into<String>, body: Value) -> Result<()> {
        self.commands
            .send(Command::Notify {
                route: route.into(),
                body,
            })
            .map_err(|_| GatewireError::ConnectionClosed)
    }

    /// Tear the connection down. Idempotent; never triggers reconnection.
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Reconnect after an explicit disconnect or once the reconnect policy
    /// gave up. No-op while a connection is live.
    pub fn connect(&self) {
        let _ = self.commands.send(Command::Connect);
    }
}
