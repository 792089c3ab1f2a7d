//! RelayConnectionHandler - Drives one client connection through its lifecycle.
//!
//! ```text
//! Connecting ──▶ Joined ──▶ Receiving ──▶ Closing ──▶ Closed
//!  (adapter)     join +      read frame,    leave,
//!                replay      apply, repeat  close sink
//! ```
//!
//! The transport upgrade (`Connecting`) happens in the WebSocket adapter;
//! this handler starts once a sink and an inbound frame stream exist. It is
//! transport-agnostic so the whole lifecycle can run against in-memory
//! streams.

use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::domain::foundation::{ConnectionId, SessionName};
use crate::domain::relay::{ApplyOutcome, ConnectionHandle, RelayError, Session, SessionRegistry};
use crate::ports::{FrameSink, TransportError};

/// One inbound frame, as delivered by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Message bytes to classify and apply.
    Data(Vec<u8>),
    /// The client asked to close the connection.
    Close,
}

/// Command to relay one connection.
pub struct RelayConnectionCommand {
    /// Session name derived from the request path (may be empty).
    pub session_name: String,
    pub connection_id: ConnectionId,
    /// Outbound half of the transport.
    pub sink: Arc<dyn FrameSink>,
}

/// Why the receive loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame.
    ClientClosed,
    /// The inbound stream ended without a close frame.
    EndOfStream,
    /// Reading failed.
    ReadError(TransportError),
    /// The session dropped this member after a failed send.
    Removed,
}

/// Result of a finished connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConnectionResult {
    pub session: SessionName,
    pub connection_id: ConnectionId,
    /// History bytes replayed on join.
    pub replayed_bytes: usize,
    /// Data frames read, including empty and ignored ones.
    pub frames_received: u64,
    pub close_reason: CloseReason,
}

/// Handler for relaying client connections.
#[derive(Clone)]
pub struct RelayConnectionHandler {
    registry: Arc<SessionRegistry>,
}

impl RelayConnectionHandler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Run a connection until its inbound stream ends.
    ///
    /// Membership cleanup happens exactly once on every exit path, including
    /// when the returned future is dropped. A failed history replay ends the
    /// connection before the receive loop starts and is returned as an error.
    pub async fn handle<S>(
        &self,
        cmd: RelayConnectionCommand,
        mut frames: S,
    ) -> Result<RelayConnectionResult, RelayError>
    where
        S: Stream<Item = Result<InboundFrame, TransportError>> + Unpin,
    {
        // 1. Resolve session and join
        let session = self.registry.resolve(&cmd.session_name).await;
        let handle = ConnectionHandle::with_id(cmd.connection_id, session.name().clone(), cmd.sink);
        let id = handle.id();
        let membership = MembershipGuard::new(session.clone(), handle.clone());

        // 2. Replay history (join removes the member again on failure)
        let replayed_bytes = match session.join(handle.clone()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                membership.release().await;
                return Err(e);
            }
        };

        // 3. Receive until the transport goes away
        let mut frames_received = 0u64;
        let close_reason = loop {
            match frames.next().await {
                Some(Ok(InboundFrame::Data(frame))) => {
                    frames_received += 1;
                    if session.apply(id, &frame).await == ApplyOutcome::NotMember {
                        break CloseReason::Removed;
                    }
                }
                Some(Ok(InboundFrame::Close)) => {
                    tracing::debug!(
                        session = %session.name(),
                        connection_id = %id,
                        "Client sent close frame"
                    );
                    break CloseReason::ClientClosed;
                }
                Some(Err(e)) => {
                    tracing::debug!(
                        session = %session.name(),
                        connection_id = %id,
                        "Read error: {}",
                        e
                    );
                    break CloseReason::ReadError(e);
                }
                None => break CloseReason::EndOfStream,
            }
        };

        // 4. Leave and release the transport
        membership.release().await;

        Ok(RelayConnectionResult {
            session: handle.session().clone(),
            connection_id: id,
            replayed_bytes,
            frames_received,
            close_reason,
        })
    }
}

/// Leaves the session and closes the transport exactly once.
///
/// If the connection future is dropped before [`MembershipGuard::release`]
/// ran, the cleanup is spawned onto the current runtime instead.
struct MembershipGuard {
    session: Arc<Session>,
    handle: Option<ConnectionHandle>,
}

impl MembershipGuard {
    fn new(session: Arc<Session>, handle: ConnectionHandle) -> Self {
        Self {
            session,
            handle: Some(handle),
        }
    }

    async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            disconnect(&self.session, &handle).await;
        }
    }
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(connection_id = %handle.id(), "No runtime left to release connection");
            return;
        };
        let session = self.session.clone();
        runtime.spawn(async move {
            disconnect(&session, &handle).await;
        });
    }
}

async fn disconnect(session: &Session, handle: &ConnectionHandle) {
    session.leave(handle.id()).await;
    if let Err(e) = handle.close(session.send_timeout()).await {
        tracing::trace!(connection_id = %handle.id(), "Close after disconnect failed: {}", e);
    }
}
