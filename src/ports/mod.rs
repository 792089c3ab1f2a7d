//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay domain and the outside world. Adapters implement these ports.
//!
//! - `FrameSink` - Outbound binary frames to one client transport

mod frame_sink;

pub use frame_sink::{FrameSink, TransportError};
