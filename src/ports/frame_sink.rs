//! FrameSink port - Outbound half of a client connection.
//!
//! The relay core never touches sockets directly. Every member of a session
//! is reached through a `FrameSink`, which lets the WebSocket adapter, and
//! in-memory doubles in tests, plug into the same broadcast code.
//!
//! Implementations must be safe to call from several tasks at once: an
//! update fan-out and a presence fan-out may target the same member
//! concurrently, and frames must not interleave on the wire.

use async_trait::async_trait;

/// Errors that can occur while writing to a client transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The transport has already been closed.
    #[error("Connection closed")]
    Closed,

    /// The underlying transport rejected the write.
    #[error("Send failed: {0}")]
    Send(String),

    /// The write did not complete within the configured send timeout.
    #[error("Send timed out")]
    Timeout,

    /// Reading the next inbound frame failed.
    #[error("Receive failed: {0}")]
    Receive(String),
}

/// Port for delivering binary frames to one connected client.
///
/// # Example
///
/// ```ignore
/// async fn greet(sink: Arc<dyn FrameSink>) -> Result<(), TransportError> {
///     sink.send_binary(&[1, 0]).await?;
///     sink.close().await
/// }
/// ```
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Send one binary frame, verbatim.
    async fn send_binary(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Close the transport.
    ///
    /// Closing an already-closed transport is not an error.
    async fn close(&self) -> Result<(), TransportError>;
}
