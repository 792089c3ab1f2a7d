//! WebSocket implementations of the transport ports.
//!
//! - [`WebSocketSink`] adapts the write half of a split socket to [`FrameSink`]
//! - [`inbound_frame`] maps socket messages onto the relay's [`InboundFrame`]

use std::fmt::Display;

use async_trait::async_trait;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::Mutex;

use crate::application::InboundFrame;
use crate::ports::{FrameSink, TransportError};

/// `FrameSink` over any sink of WebSocket messages.
///
/// Writes are serialized through a mutex so that concurrent broadcasts to
/// the same member never interleave.
pub struct WebSocketSink<S> {
    inner: Mutex<S>,
}

impl<S> WebSocketSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }
}

#[async_trait]
impl<S> FrameSink for WebSocketSink<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    async fn send_binary(&self, frame: &[u8]) -> Result<(), TransportError> {
        self.inner
            .lock()
            .await
            .send(Message::Binary(frame.to_vec()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// Map one socket read onto the relay's inbound frame.
///
/// Text frames are relayed as their UTF-8 bytes. Ping and pong frames are
/// answered by the transport itself and yield `None`.
pub fn inbound_frame(
    message: Result<Message, axum::Error>,
) -> Option<Result<InboundFrame, TransportError>> {
    match message {
        Ok(Message::Binary(data)) => Some(Ok(InboundFrame::Data(data))),
        Ok(Message::Text(text)) => Some(Ok(InboundFrame::Data(text.into_bytes()))),
        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
        Ok(Message::Close(frame)) => {
            if let Some(frame) = frame {
                tracing::debug!(code = frame.code, reason = %frame.reason, "Close frame received");
            }
            Some(Ok(InboundFrame::Close))
        }
        Err(e) => {
            tracing::warn!("WebSocket error: {}", e);
            Some(Err(TransportError::Receive(e.to_string())))
        }
    }
}
