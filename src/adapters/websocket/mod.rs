//! WebSocket adapters for real-time document relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         ws_handler                                   │
//! │   - Negotiates the sub-protocol, upgrades the transport             │
//! │   - Splits the socket: WebSocketSink (out) / inbound_frame (in)     │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ RelayConnectionCommand
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    RelayConnectionHandler                            │
//! │   join + replay  →  receive / apply  →  leave                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      SessionRegistry                                 │
//! │   Session: doc-1       Session: doc-2       Session: default        │
//! │   ├── conn-a           ├── conn-d           └── conn-g              │
//! │   └── conn-b           └── conn-e                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`handler`] - Axum WebSocket upgrade handler
//! - [`sink`] - Transport port implementations over the split socket

pub mod handler;
pub mod sink;

pub use handler::{ws_handler, WebSocketState};
pub use sink::{inbound_frame, WebSocketSink};
