//! CRDT Relay - Real-time relay for collaborative document editing
//!
//! Clients editing the same document join a named session and exchange
//! opaque update and presence messages through this server. Updates are
//! accumulated and replayed to late joiners; presence is broadcast live
//! only. Merging happens entirely inside the client-side CRDT library.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
