//! Relay handlers - connection lifecycle on top of the session registry.

mod relay_connection;

pub use relay_connection::{
    CloseReason, InboundFrame, RelayConnectionCommand, RelayConnectionHandler,
    RelayConnectionResult,
};
