//! Relay domain - sessions, membership, and the broadcast rules.
//!
//! # Components
//!
//! - [`message`] - one-byte tag classification of inbound frames
//! - [`connection`] - a member's handle on its client transport
//! - [`session`] - member set + history under one reader/writer lock
//! - [`registry`] - lazy, race-free name → session resolution

pub mod connection;
pub mod errors;
pub mod message;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::ConnectionHandle;
pub use errors::RelayError;
pub use message::MessageKind;
pub use registry::{SessionRegistry, DEFAULT_SESSION_NAME};
pub use session::{ApplyOutcome, FanOut, Session};
