//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay core to the outside world:
//! - `http` - Ingress dispatcher and static file collaborator
//! - `websocket` - WebSocket transport for relay connections

pub mod http;
pub mod websocket;

pub use self::http::{relay_router, AppState, StaticFiles};
pub use websocket::{WebSocketSink, WebSocketState};
