//! Session controller - handshake, heartbeat, correlation, reconnection.
//!
//! One spawned task owns all session state:
//!
//! ```text
//! Client ──commands──►┐
//! Transport ──events──┼─► select! loop ─► handlers ─► events / replies
//! Timers ─────fires───┘
//! ```
//!
//! Commands from the client handle, deliveries from the live transport and
//! the three timer classes (heartbeat send, heartbeat timeout check,
//! reconnect) are multiplexed through a single `select!` loop. Every arm
//! runs to completion before the next is taken, so no two handlers for the
//! same session ever run concurrently and the correlation tables need no
//! locks.

mod events;
mod handshake;

pub use events::SessionEvent;
pub use handshake::{
    ClientSys, HandshakeRequest, HandshakeResponse, ServerSys, CLIENT_TYPE, CLIENT_VERSION,
    RES_FAIL, RES_OK, RES_OLD_CLIENT,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use crate::codec::{CodecRegistry, TextCodec};
use crate::error::{GatewireError, Result};
use crate::protocol::{Message, Packet, PacketKind, Route, RouteDictionary};
use crate::signer::{Signer, CRYPTO_FIELD};
use crate::transport::{Connector, TransportEvent, TransportHandle};

/// Late-fire tolerance for the heartbeat timeout check.
const GAP_THRESHOLD: Duration = Duration::from_millis(100);

/// First reconnect delay; doubles after each scheduled attempt.
pub(crate) const BASE_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Default cap on consecutive reconnect attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Sentinel deadline for disabled timer arms; far enough to never fire.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; nothing scheduled except possibly a reconnect.
    Disconnected,
    /// Connector in flight.
    Connecting,
    /// Handshake sent, waiting for the server's reply.
    AwaitingHandshakeAck,
    /// Handshake complete; requests, notifies and heartbeats flow.
    Established,
    /// Teardown in progress.
    Closing,
}

/// Per-session handshake callback, invoked with the server's `user` payload
/// on every successful handshake (including reconnects).
pub type HandshakeCallback = Arc<dyn Fn(Option<Value>) + Send + Sync>;

/// Commands from the client handle to the session task.
pub(crate) enum Command {
    /// Open the transport and start the handshake.
    Connect,
    /// Correlated call; the reply channel receives the decoded response.
    Request {
        route: String,
        body: Value,
        reply: oneshot::Sender<Result<Value>>,
    },
    /// Fire-and-forget call, id 0 on the wire.
    Notify { route: String, body: Value },
    /// Tear the connection down without triggering reconnection.
    Disconnect,
}

/// Everything the session needs, resolved once at construction.
pub(crate) struct SessionConfig {
    pub url: String,
    pub user: Value,
    pub handshake_callback: Option<HandshakeCallback>,
    pub signer: Option<Arc<dyn Signer>>,
    pub codecs: CodecRegistry,
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub connector: Arc<dyn Connector>,
}

/// The session state machine. Owned by its task; never shared.
pub(crate) struct Session {
    cfg: SessionConfig,
    state: ConnectionState,
    /// The single live transport; replaced wholesale on reconnect.
    transport: Option<TransportHandle>,
    /// Last issued request id; the next request gets `last + 1`, wrapping
    /// past zero only on u32 overflow.
    last_request_id: u32,
    /// Reply channels by request id, removed exactly once.
    pending: HashMap<u32, oneshot::Sender<Result<Value>>>,
    /// Routes by request id; responses carry no route, this is the only way
    /// to know which logical call one belongs to.
    pending_routes: HashMap<u32, String>,
    dict: RouteDictionary,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
    /// Liveness deadline, pushed forward by every received package.
    next_heartbeat_deadline: Option<Instant>,
    heartbeat_send_at: Option<Instant>,
    heartbeat_check_at: Option<Instant>,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
    reconnect_at: Option<Instant>,
    reconnecting: bool,
    events: mpsc::UnboundedSender<SessionEvent>,
    /// Resolved once, on the first successful handshake.
    ready: Option<oneshot::Sender<Result<()>>>,
}

impl Session {
    pub(crate) fn new(
        cfg: SessionConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
        ready: oneshot::Sender<Result<()>>,
    ) -> Self {
        Self {
            cfg,
            state: ConnectionState::Disconnected,
            transport: None,
            last_request_id: 0,
            pending: HashMap::new(),
            pending_routes: HashMap::new(),
            dict: RouteDictionary::new(),
            heartbeat_interval: Duration::ZERO,
            heartbeat_timeout: Duration::ZERO,
            next_heartbeat_deadline: None,
            heartbeat_send_at: None,
            heartbeat_check_at: None,
            reconnect_attempts: 0,
            reconnect_delay: BASE_RECONNECT_DELAY,
            reconnect_at: None,
            reconnecting: false,
            events,
            ready: Some(ready),
        }
    }

    /// The session loop. Runs until the client handle is dropped.
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let heartbeat_send_at = self.heartbeat_send_at;
            let heartbeat_check_at = self.heartbeat_check_at;
            let reconnect_at = self.reconnect_at;

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => break,
                },
                event = next_event(self.transport.as_mut()) => match event {
                    Some(event) => self.on_transport_event(event).await,
                    // Transport tasks gone without a close frame.
                    None => self.on_closed(None),
                },
                _ = sleep_until(heartbeat_send_at.unwrap_or_else(far_future)),
                    if heartbeat_send_at.is_some() =>
                {
                    self.on_heartbeat_send().await;
                }
                _ = sleep_until(heartbeat_check_at.unwrap_or_else(far_future)),
                    if heartbeat_check_at.is_some() =>
                {
                    self.on_heartbeat_check();
                }
                _ = sleep_until(reconnect_at.unwrap_or_else(far_future)),
                    if reconnect_at.is_some() =>
                {
                    self.reconnect_at = None;
                    self.connect().await;
                }
            }
        }

        self.teardown();
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Connect => {
                if self.state == ConnectionState::Disconnected {
                    self.reconnect_at = None;
                    self.connect().await;
                } else {
                    tracing::warn!("connect ignored in state {:?}", self.state);
                }
            }
            Command::Request { route, body, reply } => self.on_request(route, body, reply).await,
            Command::Notify { route, body } => self.on_notify(route, body).await,
            Command::Disconnect => self.disconnect(),
        }
    }

    // ── connection lifecycle ────────────────────────────────────────────

    async fn connect(&mut self) {
        self.state = ConnectionState::Connecting;
        tracing::debug!("connecting to {}", self.cfg.url);

        match self.cfg.connector.connect(&self.cfg.url).await {
            Ok(handle) => {
                if self.reconnecting {
                    self.emit(SessionEvent::Reconnect);
                }
                self.transport = Some(handle);
                if let Err(e) = self.send_handshake().await {
                    tracing::error!("handshake send failed: {}", e);
                    self.on_closed(Some(e.to_string()));
                    return;
                }
                self.state = ConnectionState::AwaitingHandshakeAck;
            }
            Err(e) => {
                tracing::error!("connect failed: {}", e);
                self.emit(SessionEvent::IoError(e.to_string()));
                self.on_closed(Some(e.to_string()));
            }
        }
    }

    async fn send_handshake(&mut self) -> Result<()> {
        let rsa = self.cfg.signer.as_ref().map(|s| s.public_key());
        let body = HandshakeRequest::new(self.cfg.user.clone(), rsa).encode()?;
        self.send_packet(Packet::new(PacketKind::Handshake, Bytes::from(body)))
            .await
    }

    /// The transport-close path. Reconnect policy applies here and only
    /// here; explicit disconnects go through [`Session::disconnect`].
    fn on_closed(&mut self, reason: Option<String>) {
        self.cancel_heartbeat();
        self.transport = None;
        self.state = ConnectionState::Disconnected;
        self.emit(SessionEvent::Close(reason));
        self.emit(SessionEvent::Disconnect);

        if self.cfg.reconnect && self.reconnect_attempts < self.cfg.max_reconnect_attempts {
            self.reconnect_attempts += 1;
            self.reconnecting = true;
            tracing::debug!(
                "reconnect attempt {}/{} in {:?}",
                self.reconnect_attempts,
                self.cfg.max_reconnect_attempts,
                self.reconnect_delay
            );
            self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
            self.reconnect_delay *= 2;
        }
    }

    /// Explicit teardown: idempotent, cancels every timer class, never
    /// schedules a reconnect.
    fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected
            && self.transport.is_none()
            && self.reconnect_at.is_none()
        {
            return;
        }

        self.state = ConnectionState::Closing;
        self.cancel_heartbeat();
        self.reconnect_at = None;
        self.reconnecting = false;
        self.transport = None;
        self.state = ConnectionState::Disconnected;
        tracing::debug!("disconnected");
        self.emit(SessionEvent::Disconnect);
    }

    fn teardown(&mut self) {
        self.cancel_heartbeat();
        self.reconnect_at = None;
        self.transport = None;
        self.state = ConnectionState::Disconnected;

        for (_, reply) in self.pending.drain() {
            let _ = reply.send(Err(GatewireError::ConnectionClosed));
        }
        self.pending_routes.clear();
    }

    fn cancel_heartbeat(&mut self) {
        self.heartbeat_send_at = None;
        self.heartbeat_check_at = None;
        self.next_heartbeat_deadline = None;
    }

    // ── transport events ────────────────────────────────────────────────

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Message(bytes) => self.on_transport_message(bytes).await,
            TransportEvent::Error(info) => {
                tracing::error!("transport error: {}", info);
                self.emit(SessionEvent::IoError(info));
            }
            TransportEvent::Closed(reason) => {
                tracing::debug!("transport closed: {:?}", reason);
                self.on_closed(reason);
            }
        }
    }

    async fn on_transport_message(&mut self, bytes: Bytes) {
        // Real traffic counts as liveness, independent of the heartbeat
        // sub-protocol's own scheduling.
        if !self.heartbeat_timeout.is_zero() {
            self.next_heartbeat_deadline = Some(Instant::now() + self.heartbeat_timeout);
        }

        match Packet::decode(&bytes) {
            Ok(packets) => {
                for packet in packets {
                    self.on_packet(packet).await;
                }
            }
            Err(e) => {
                tracing::error!("undecodable transport buffer: {}", e);
                self.emit(SessionEvent::Error(e.to_string()));
                self.on_closed(Some(e.to_string()));
            }
        }
    }

    async fn on_packet(&mut self, packet: Packet) {
        match packet.kind {
            PacketKind::Handshake => self.on_handshake(&packet.body).await,
            PacketKind::HandshakeAck => {
                tracing::warn!("unexpected handshake ack from server");
            }
            PacketKind::Heartbeat => self.on_heartbeat(),
            PacketKind::Data => self.on_data(&packet.body),
            PacketKind::Kick => self.on_kick(&packet.body),
        }
    }

    // ── handshake ───────────────────────────────────────────────────────

    async fn on_handshake(&mut self, body: &[u8]) {
        let response = match HandshakeResponse::decode(body) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("handshake body unreadable: {}", e);
                self.emit(SessionEvent::Error(format!("handshake parse failure: {}", e)));
                return;
            }
        };

        if response.code == RES_OLD_CLIENT {
            self.emit(SessionEvent::Error("client version not fullfill".into()));
            return;
        }
        if response.code != RES_OK {
            self.emit(SessionEvent::Error("handshake fail".into()));
            return;
        }

        let sys = response.sys.unwrap_or_default();
        match sys.heartbeat {
            Some(seconds) if seconds > 0 => {
                self.heartbeat_interval = Duration::from_secs(seconds);
                self.heartbeat_timeout = self.heartbeat_interval * 2;
            }
            _ => {
                self.heartbeat_interval = Duration::ZERO;
                self.heartbeat_timeout = Duration::ZERO;
            }
        }
        if let Some(dict) = &sys.dict {
            self.dict.rebuild(dict);
        }

        if let Some(callback) = &self.cfg.handshake_callback {
            callback(response.user.clone());
        }

        if let Err(e) = self.send_packet(Packet::empty(PacketKind::HandshakeAck)).await {
            tracing::error!("handshake ack send failed: {}", e);
            self.on_closed(Some(e.to_string()));
            return;
        }

        self.state = ConnectionState::Established;
        self.reconnect_attempts = 0;
        self.reconnect_delay = BASE_RECONNECT_DELAY;
        self.reconnecting = false;
        tracing::debug!(
            "session established, heartbeat interval {:?}",
            self.heartbeat_interval
        );

        if let Some(ready) = self.ready.take() {
            let _ = ready.send(Ok(()));
        }
    }

    // ── heartbeat ───────────────────────────────────────────────────────

    fn on_heartbeat(&mut self) {
        if self.heartbeat_interval.is_zero() {
            return;
        }

        self.heartbeat_check_at = None;

        if self.heartbeat_send_at.is_some() {
            // already inside a heartbeat interval
            return;
        }
        self.heartbeat_send_at = Some(Instant::now() + self.heartbeat_interval);
    }

    async fn on_heartbeat_send(&mut self) {
        self.heartbeat_send_at = None;
        if let Err(e) = self.send_packet(Packet::empty(PacketKind::Heartbeat)).await {
            tracing::warn!("heartbeat send failed: {}", e);
            return;
        }

        let now = Instant::now();
        self.next_heartbeat_deadline = Some(now + self.heartbeat_timeout);
        self.heartbeat_check_at = Some(now + self.heartbeat_timeout);
    }

    fn on_heartbeat_check(&mut self) {
        let now = Instant::now();
        let deadline = self.next_heartbeat_deadline.unwrap_or(now);
        let gap = deadline.saturating_duration_since(now);

        if gap > GAP_THRESHOLD {
            // Traffic pushed the deadline forward (or the timer fired late):
            // re-arm with the remaining gap rather than a fresh timeout.
            self.heartbeat_check_at = Some(now + gap);
        } else {
            tracing::error!("server heartbeat timeout");
            self.emit(SessionEvent::HeartbeatTimeout);
            self.heartbeat_check_at = None;
            self.on_closed(Some("heartbeat timeout".into()));
        }
    }

    // ── outgoing messages ───────────────────────────────────────────────

    async fn on_request(
        &mut self,
        route: String,
        body: Value,
        reply: oneshot::Sender<Result<Value>>,
    ) {
        if self.state != ConnectionState::Established {
            let _ = reply.send(Err(GatewireError::ConnectionClosed));
            return;
        }

        let encoded = match self.encode_body(&route, &body) {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = reply.send(Err(e));
                return;
            }
        };

        self.last_request_id = self.last_request_id.wrapping_add(1);
        if self.last_request_id == 0 {
            self.last_request_id = 1;
        }
        let id = self.last_request_id;

        let message = Message::request(id, self.route_field(&route), Bytes::from(encoded));
        match self.send_message(message).await {
            Ok(()) => {
                self.pending.insert(id, reply);
                self.pending_routes.insert(id, route);
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        }
    }

    async fn on_notify(&mut self, route: String, body: Value) {
        if self.state != ConnectionState::Established {
            tracing::warn!("notify {} dropped: not connected", route);
            return;
        }

        let encoded = match self.encode_body(&route, &body) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("notify {} encode failed: {}", route, e);
                return;
            }
        };

        let message = Message::notify(self.route_field(&route), Bytes::from(encoded));
        if let Err(e) = self.send_message(message).await {
            tracing::warn!("notify {} send failed: {}", route, e);
        }
    }

    fn route_field(&self, route: &str) -> Route {
        match self.dict.compress(route) {
            Some(code) => Route::Code(code),
            None => Route::Text(route.to_string()),
        }
    }

    async fn send_message(&mut self, message: Message) -> Result<()> {
        let frame = message.encode()?;
        self.send_packet(Packet::new(PacketKind::Data, Bytes::from(frame)))
            .await
    }

    async fn send_packet(&mut self, packet: Packet) -> Result<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(GatewireError::ConnectionClosed)?;
        transport
            .outgoing
            .send(Bytes::from(packet.encode()))
            .await
            .map_err(|_| GatewireError::ConnectionClosed)
    }

    // ── incoming messages ───────────────────────────────────────────────

    fn on_data(&mut self, body: &[u8]) {
        let message = match Message::decode(body) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("undecodable message frame: {}", e);
                return;
            }
        };

        if message.id == 0 {
            self.on_push(message);
        } else {
            self.on_response(message);
        }
    }

    fn on_push(&mut self, message: Message) {
        let route = match message.route {
            Some(Route::Text(route)) => route,
            Some(Route::Code(code)) => match self.dict.decompress(code) {
                Some(route) => route.to_string(),
                None => {
                    tracing::warn!("push with unknown route code {}, payload dropped", code);
                    return;
                }
            },
            None => {
                tracing::warn!("push without a route, dropped");
                return;
            }
        };

        match self.decode_body(&route, &message.body) {
            Ok(body) => self.emit(SessionEvent::Push { route, body }),
            Err(e) => tracing::warn!("push {} body undecodable: {}", route, e),
        }
    }

    fn on_response(&mut self, message: Message) {
        let Some(reply) = self.pending.remove(&message.id) else {
            tracing::debug!("response for unknown request id {}, dropped", message.id);
            return;
        };
        let route = self.pending_routes.remove(&message.id).unwrap_or_default();
        let _ = reply.send(self.decode_body(&route, &message.body));
    }

    fn on_kick(&mut self, body: &[u8]) {
        let reason = if body.is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&TextCodec::decode(body)) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("kick body unreadable: {}", e);
                    Value::Null
                }
            }
        };
        self.emit(SessionEvent::Kick(reason));
    }

    // ── body pipeline ───────────────────────────────────────────────────

    fn encode_body(&self, route: &str, body: &Value) -> Result<Vec<u8>> {
        let signed;
        let body = match &self.cfg.signer {
            Some(signer) => {
                let json = serde_json::to_string(body)?;
                let signature = signer.sign(&json)?;
                let mut tagged = body.clone();
                if let Some(object) = tagged.as_object_mut() {
                    object.insert(CRYPTO_FIELD.to_string(), Value::String(signature));
                }
                signed = tagged;
                &signed
            }
            None => body,
        };

        if let Some(codec) = self.cfg.codecs.encoder_for(route) {
            return codec.encode(body);
        }
        Ok(TextCodec::encode(&serde_json::to_string(body)?))
    }

    fn decode_body(&self, route: &str, raw: &[u8]) -> Result<Value> {
        if let Some(codec) = self.cfg.codecs.decoder_for(route) {
            return codec.decode(raw);
        }
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&TextCodec::decode(raw))?)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Receive from the live transport, or park forever when there is none.
async fn next_event(transport: Option<&mut TransportHandle>) -> Option<TransportEvent> {
    match transport {
        Some(transport) => transport.events.recv().await,
        None => std::future::pending().await,
    }
}

fn far_future() -> Instant {
    Instant::now() + FAR_FUTURE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(cfg: SessionConfig) -> Session {
        let (events, _) = mpsc::unbounded_channel();
        let (ready, _) = oneshot::channel();
        Session::new(cfg, events, ready)
    }

    fn config() -> SessionConfig {
        struct NeverConnector;
        impl Connector for NeverConnector {
            fn connect(&self, _url: &str) -> crate::transport::BoxFuture<Result<TransportHandle>> {
                Box::pin(std::future::pending())
            }
        }

        SessionConfig {
            url: "ws://localhost".into(),
            user: Value::Null,
            handshake_callback: None,
            signer: None,
            codecs: CodecRegistry::new(),
            reconnect: false,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connector: Arc::new(NeverConnector),
        }
    }

    #[test]
    fn test_route_field_prefers_dictionary_code() {
        let mut session = session(config());
        session
            .dict
            .rebuild(&HashMap::from([("chat.send".to_string(), 2u16)]));

        assert_eq!(session.route_field("chat.send"), Route::Code(2));
        assert_eq!(
            session.route_field("chat.other"),
            Route::Text("chat.other".to_string())
        );
    }

    #[test]
    fn test_encode_body_json_fallback() {
        let session = session(config());
        let encoded = session
            .encode_body("chat.send", &serde_json::json!({"msg": "hi"}))
            .unwrap();

        assert_eq!(encoded, TextCodec::encode(r#"{"msg":"hi"}"#));
    }

    #[test]
    fn test_decode_body_empty_is_null() {
        let session = session(config());
        assert_eq!(session.decode_body("any", &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_encode_body_attaches_signature() {
        struct FixedSigner;
        impl Signer for FixedSigner {
            fn public_key(&self) -> crate::signer::PublicKeyParams {
                crate::signer::PublicKeyParams {
                    n: "00".into(),
                    e: 3,
                }
            }
            fn sign(&self, _payload: &str) -> Result<String> {
                Ok("sig".into())
            }
        }

        let mut cfg = config();
        cfg.signer = Some(Arc::new(FixedSigner));
        let session = session(cfg);

        let encoded = session
            .encode_body("chat.send", &serde_json::json!({"msg": "hi"}))
            .unwrap();
        let decoded: Value = serde_json::from_str(&TextCodec::decode(&encoded)).unwrap();

        assert_eq!(decoded["msg"], "hi");
        assert_eq!(decoded[CRYPTO_FIELD], "sig");
    }

    #[test]
    fn test_heartbeat_receipt_schedules_single_send() {
        let mut s = session(config());
        s.heartbeat_interval = Duration::from_secs(5);
        s.heartbeat_timeout = Duration::from_secs(10);

        s.on_heartbeat();
        let first = s.heartbeat_send_at;
        assert!(first.is_some());

        // A second heartbeat inside the interval neither reschedules the
        // send nor leaves a check pending.
        s.heartbeat_check_at = Some(Instant::now());
        s.on_heartbeat();
        assert_eq!(s.heartbeat_send_at, first);
        assert!(s.heartbeat_check_at.is_none());
    }

    #[test]
    fn test_heartbeat_disabled_ignores_peer_probes() {
        let mut s = session(config());
        s.on_heartbeat();
        assert!(s.heartbeat_send_at.is_none());
        assert!(s.heartbeat_check_at.is_none());
    }

    #[test]
    fn test_disconnect_is_idempotent_and_cancels_timers() {
        let mut s = session(config());
        s.heartbeat_send_at = Some(Instant::now());
        s.heartbeat_check_at = Some(Instant::now());
        s.reconnect_at = Some(Instant::now());
        s.state = ConnectionState::Established;

        s.disconnect();
        assert_eq!(s.state, ConnectionState::Disconnected);
        assert!(s.heartbeat_send_at.is_none());
        assert!(s.heartbeat_check_at.is_none());
        assert!(s.reconnect_at.is_none());

        // Safe to call again.
        s.disconnect();
        assert_eq!(s.state, ConnectionState::Disconnected);
    }

    #[test]
    fn test_close_path_schedules_bounded_backoff() {
        let mut s = session(SessionConfig {
            reconnect: true,
            max_reconnect_attempts: 2,
            ..config()
        });

        s.on_closed(None);
        assert!(s.reconnect_at.is_some());
        assert_eq!(s.reconnect_attempts, 1);
        assert_eq!(s.reconnect_delay, BASE_RECONNECT_DELAY * 2);

        s.reconnect_at = None;
        s.on_closed(None);
        assert_eq!(s.reconnect_attempts, 2);
        assert_eq!(s.reconnect_delay, BASE_RECONNECT_DELAY * 4);

        // Attempt cap reached: terminal.
        s.reconnect_at = None;
        s.on_closed(None);
        assert!(s.reconnect_at.is_none());
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut s = session(config());
        // No pending entry for id 7; must be a silent no-op.
        s.on_response(Message::response(7, Bytes::from_static(b"{}")));
        assert!(s.pending.is_empty());
    }
}
