//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod relay;

pub use relay::{
    CloseReason, InboundFrame, RelayConnectionCommand, RelayConnectionHandler,
    RelayConnectionResult,
};
