//! Transport module - the duplex byte-stream boundary.
//!
//! The session never touches sockets directly: a [`Connector`] produces a
//! [`TransportHandle`] (outgoing byte channel + incoming event channel), and
//! everything below that line is the transport's business. The production
//! implementation is [`WsConnector`]; tests swap in an in-memory connector.

mod ws;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

pub(crate) use ws::build_url;
pub use ws::WsConnector;

/// Boxed future returned by [`Connector::connect`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Channel capacity for both directions of a transport.
pub const TRANSPORT_CHANNEL_CAPACITY: usize = 64;

/// Events delivered by a live transport.
///
/// A successful [`Connector::connect`] future is the "open" signal; after
/// `Closed` no further events arrive.
#[derive(Debug)]
pub enum TransportEvent {
    /// A delivered binary payload. May bundle several package frames;
    /// boundaries within one delivery are the codec's business.
    Message(Bytes),
    /// A transport-level error. Non-fatal by itself; the close that usually
    /// follows drives the state change.
    Error(String),
    /// The connection is gone, with an optional reason.
    Closed(Option<String>),
}

/// A live duplex connection.
///
/// Owned exclusively by one session; replaced wholesale on reconnect.
/// Dropping the handle tears the underlying connection down.
pub struct TransportHandle {
    /// Outgoing bytes; the transport guarantees binary-safe delivery of
    /// exactly these bytes.
    pub outgoing: mpsc::Sender<Bytes>,
    /// Incoming transport events.
    pub events: mpsc::Receiver<TransportEvent>,
}

impl TransportHandle {
    /// Build a handle from its two channel halves.
    pub fn new(outgoing: mpsc::Sender<Bytes>, events: mpsc::Receiver<TransportEvent>) -> Self {
        Self { outgoing, events }
    }
}

/// Factory for transports.
///
/// Implementations must resolve the returned future only once the
/// connection is ready to carry bytes (the "open" event of callback-style
/// transports).
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `url`.
    fn connect(&self, url: &str) -> BoxFuture<Result<TransportHandle>>;
}
