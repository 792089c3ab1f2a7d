//! In-memory `FrameSink` doubles shared by the relay unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{FrameSink, TransportError};

/// Records every frame it is given, in order.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    /// All received bytes, concatenated.
    pub fn concatenated(&self) -> Vec<u8> {
        self.frames().concat()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send_binary(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.frames.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Rejects every send.
#[derive(Default)]
pub struct FailingSink {
    closed: AtomicBool,
}

impl FailingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSink for FailingSink {
    async fn send_binary(&self, _frame: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Send("connection reset".into()))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hangs on its first send, then records like [`RecordingSink`].
#[derive(Default)]
pub struct StallOnceSink {
    stalled: AtomicBool,
    recorder: RecordingSink,
}

impl StallOnceSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.recorder.frames()
    }

    pub fn is_closed(&self) -> bool {
        self.recorder.is_closed()
    }
}

#[async_trait]
impl FrameSink for StallOnceSink {
    async fn send_binary(&self, frame: &[u8]) -> Result<(), TransportError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.recorder.send_binary(frame).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.recorder.close().await
    }
}

/// Never completes a send.
pub struct StalledSink;

#[async_trait]
impl FrameSink for StalledSink {
    async fn send_binary(&self, _frame: &[u8]) -> Result<(), TransportError> {
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
