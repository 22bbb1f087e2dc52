//! WebSocket transport via tokio-tungstenite.
//!
//! `connect` performs the WS handshake, splits the stream, and spawns a
//! reader and a writer task. The session talks only to the channel pair;
//! when the outgoing sender is dropped the writer task sends a Close frame
//! and both tasks wind down.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::{BoxFuture, Connector, TransportEvent, TransportHandle, TRANSPORT_CHANNEL_CAPACITY};
use crate::error::{GatewireError, Result};

/// Production WebSocket connector.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &str) -> BoxFuture<Result<TransportHandle>> {
        let url = url.to_string();
        Box::pin(async move {
            let (stream, _response) = connect_async(url.as_str())
                .await
                .map_err(|e| GatewireError::Transport(e.to_string()))?;
            let (mut sink, mut source) = stream.split();

            let (out_tx, mut out_rx) = mpsc::channel::<Bytes>(TRANSPORT_CHANNEL_CAPACITY);
            let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(TRANSPORT_CHANNEL_CAPACITY);

            tokio::spawn(async move {
                while let Some(data) = out_rx.recv().await {
                    if let Err(e) = sink.send(WsMessage::Binary(data.to_vec())).await {
                        tracing::warn!("websocket send failed: {}", e);
                        break;
                    }
                }
                // Sender dropped or send failed: close politely.
                let _ = sink.send(WsMessage::Close(None)).await;
            });

            tokio::spawn(async move {
                while let Some(item) = source.next().await {
                    match item {
                        Ok(WsMessage::Binary(data)) => {
                            if event_tx
                                .send(TransportEvent::Message(Bytes::from(data)))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Ok(WsMessage::Text(text)) => {
                            // Some gateways fall back to text frames; the
                            // codec layer only sees bytes either way.
                            if event_tx
                                .send(TransportEvent::Message(Bytes::from(text.into_bytes())))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Ok(WsMessage::Close(frame)) => {
                            let reason = frame.map(|f| f.reason.to_string());
                            let _ = event_tx.send(TransportEvent::Closed(reason)).await;
                            return;
                        }
                        Ok(_) => {} // ping/pong, handled by the stream itself
                        Err(e) => {
                            let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                            let _ = event_tx
                                .send(TransportEvent::Closed(Some(e.to_string())))
                                .await;
                            return;
                        }
                    }
                }
                let _ = event_tx.send(TransportEvent::Closed(None)).await;
            });

            Ok(TransportHandle::new(out_tx, event_rx))
        })
    }
}

/// Build the gateway URL from its configured parts.
pub(crate) fn build_url(host: &str, port: Option<u16>, path: Option<&str>) -> String {
    let mut url = format!("ws://{}", host);
    if let Some(port) = port {
        url.push_str(&format!(":{}", port));
    }
    if let Some(path) = path {
        url.push_str(path);
    }
    url
}
