//! WebSocket upgrade handler for document relay connections.
//!
//! Handles the HTTP → WebSocket upgrade and hands the established socket to
//! the relay engine:
//! 1. Negotiate the client library's sub-protocol
//! 2. Upgrade to WebSocket (any origin is accepted)
//! 3. Split the socket into a `FrameSink` and an inbound frame stream
//! 4. Run the connection until it closes

use std::sync::Arc;

use axum::{
    extract::ws::{WebSocket, WebSocketUpgrade},
    response::Response,
};
use futures::{future, StreamExt};

use crate::application::{RelayConnectionCommand, RelayConnectionHandler};
use crate::domain::foundation::ConnectionId;

use super::sink::{inbound_frame, WebSocketSink};

/// State required for WebSocket handling.
///
/// Extracted from the application state.
#[derive(Clone)]
pub struct WebSocketState {
    /// Relay engine shared by every connection.
    pub relay: RelayConnectionHandler,
    /// Sub-protocol selected when the client offers it.
    pub subprotocol: Arc<str>,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(relay: RelayConnectionHandler, subprotocol: impl Into<Arc<str>>) -> Self {
        Self {
            relay,
            subprotocol: subprotocol.into(),
        }
    }
}

/// Upgrade a request to a relay connection on `session_name`.
///
/// Upgrade failures are logged and the request is dropped; no session is
/// touched until the upgrade has completed.
pub fn ws_handler(ws: WebSocketUpgrade, session_name: String, state: WebSocketState) -> Response {
    tracing::info!(session = %session_name, "WebSocket connection request");

    ws.protocols([state.subprotocol.to_string()])
        .on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, session_name, state))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection.
async fn handle_socket(socket: WebSocket, session_name: String, state: WebSocketState) {
    let (sender, receiver) = socket.split();
    let connection_id = ConnectionId::new();

    let cmd = RelayConnectionCommand {
        session_name,
        connection_id,
        sink: Arc::new(WebSocketSink::new(sender)),
    };
    let frames = receiver.filter_map(|message| future::ready(inbound_frame(message)));

    match state.relay.handle(cmd, frames).await {
        Ok(result) => {
            tracing::debug!(
                session = %result.session,
                connection_id = %connection_id,
                frames = result.frames_received,
                reason = ?result.close_reason,
                "Connection closed"
            );
        }
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, "Connection aborted: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relay::SessionRegistry;

    #[test]
    fn websocket_state_shares_the_registry() {
        let registry = Arc::new(SessionRegistry::default());
        let state = WebSocketState::new(RelayConnectionHandler::new(registry.clone()), "y-websocket");

        assert!(Arc::ptr_eq(state.relay.registry(), &registry));
        assert_eq!(&*state.subprotocol, "y-websocket");
    }
}
