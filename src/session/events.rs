//! Consumer-facing session events.

use serde_json::Value;

/// Named events emitted by a session.
///
/// Server pushes arrive as [`SessionEvent::Push`] whose `route` is the
/// dynamic event name; everything else is a fixed lifecycle event.
#[derive(Debug)]
pub enum SessionEvent {
    /// A reconnect attempt's transport opened (fires before the handshake).
    Reconnect,
    /// Transport-level error; the close that usually follows drives the
    /// state change.
    IoError(String),
    /// The transport closed, with the reason when one was supplied.
    Close(Option<String>),
    /// The session is disconnected.
    Disconnect,
    /// Protocol-level failure (handshake rejection, undecodable traffic).
    Error(String),
    /// The server went silent past the negotiated heartbeat deadline.
    HeartbeatTimeout,
    /// The server evicted this client; carries the parsed reason.
    Kick(Value),
    /// Uncorrelated server push, named by its route.
    Push {
        /// Dynamic event name (the message route).
        route: String,
        /// Decoded message body.
        body: Value,
    },
}

impl SessionEvent {
    /// The event's name: fixed for lifecycle events, the route for pushes.
    pub fn name(&self) -> &str {
        match self {
            SessionEvent::Reconnect => "reconnect",
            SessionEvent::IoError(_) => "io-error",
            SessionEvent::Close(_) => "close",
            SessionEvent::Disconnect => "disconnect",
            SessionEvent::Error(_) => "error",
            SessionEvent::HeartbeatTimeout => "heartbeat timeout",
            SessionEvent::Kick(_) => "onKick",
            SessionEvent::Push { route, .. } => route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(SessionEvent::Reconnect.name(), "reconnect");
        assert_eq!(SessionEvent::HeartbeatTimeout.name(), "heartbeat timeout");
        assert_eq!(SessionEvent::Kick(Value::Null).name(), "onKick");
        assert_eq!(
            SessionEvent::Push {
                route: "chat.onMessage".into(),
                body: Value::Null
            }
            .name(),
            "chat.onMessage"
        );
    }
}
