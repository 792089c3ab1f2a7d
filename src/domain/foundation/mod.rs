//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers and value objects that form the vocabulary of
//! the relay domain.

mod ids;
mod session_name;

pub use ids::ConnectionId;
pub use session_name::SessionName;
