//! Connection handle - one live client inside one session.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{ConnectionId, SessionName};
use crate::ports::{FrameSink, TransportError};

/// A member of a session.
///
/// Wraps the outbound side of a client transport. The handle refers back to
/// its session by name only; the session owns the handle through its member
/// set, never the other way round. A handle is bound to one session for its
/// whole lifetime.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    session: SessionName,
    sink: Arc<dyn FrameSink>,
}

impl ConnectionHandle {
    /// Create a handle with a fresh connection ID.
    pub fn new(session: SessionName, sink: Arc<dyn FrameSink>) -> Self {
        Self::with_id(ConnectionId::new(), session, sink)
    }

    /// Create a handle with a known connection ID.
    pub fn with_id(id: ConnectionId, session: SessionName, sink: Arc<dyn FrameSink>) -> Self {
        Self { id, session, sink }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Name of the session this connection belongs to.
    pub fn session(&self) -> &SessionName {
        &self.session
    }

    /// Send one frame to this client, bounded by `timeout` when given.
    ///
    /// An elapsed timeout is reported as [`TransportError::Timeout`].
    pub async fn send(&self, frame: &[u8], timeout: Option<Duration>) -> Result<(), TransportError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.sink.send_binary(frame))
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => self.sink.send_binary(frame).await,
        }
    }

    /// Close the underlying transport, bounded by `timeout` when given.
    ///
    /// Closing ends the client's inbound stream, which in turn ends its
    /// receive loop.
    pub async fn close(&self, timeout: Option<Duration>) -> Result<(), TransportError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.sink.close())
                .await
                .map_err(|_| TransportError::Timeout)?,
            None => self.sink.close().await,
        }
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relay::testing::{RecordingSink, StalledSink};

    fn session() -> SessionName {
        SessionName::or_default("doc1", "default")
    }

    #[tokio::test]
    async fn send_forwards_frame_verbatim() {
        let sink = RecordingSink::new();
        let handle = ConnectionHandle::new(session(), sink.clone());

        handle.send(&[0, 1, 2, 3], None).await.unwrap();

        assert_eq!(sink.frames(), vec![vec![0, 1, 2, 3]]);
    }

    #[tokio::test]
    async fn send_to_closed_sink_fails() {
        let sink = RecordingSink::new();
        let handle = ConnectionHandle::new(session(), sink.clone());

        handle.close(None).await.unwrap();

        assert_eq!(handle.send(&[1], None).await, Err(TransportError::Closed));
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn stalled_send_times_out() {
        let handle = ConnectionHandle::new(session(), Arc::new(StalledSink));

        let result = handle.send(&[0], Some(Duration::from_millis(20))).await;

        assert_eq!(result, Err(TransportError::Timeout));
    }

    #[tokio::test]
    async fn close_is_bounded_by_timeout() {
        let handle = ConnectionHandle::new(session(), Arc::new(StalledCloseSink));

        let result = handle.close(Some(Duration::from_millis(20))).await;

        assert_eq!(result, Err(TransportError::Timeout));
    }

    struct StalledCloseSink;

    #[async_trait::async_trait]
    impl FrameSink for StalledCloseSink {
        async fn send_binary(&self, _frame: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), TransportError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[test]
    fn handle_remembers_its_session_and_id() {
        let id = ConnectionId::new();
        let handle = ConnectionHandle::with_id(id, session(), RecordingSink::new());

        assert_eq!(handle.id(), id);
        assert_eq!(handle.session().as_str(), "doc1");
    }
}
