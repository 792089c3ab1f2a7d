//! Relay-specific error types.

use crate::domain::foundation::{ConnectionId, SessionName};
use crate::ports::TransportError;

/// Errors surfaced by the relay core.
///
/// None of these are fatal to a session: they only ever end the connection
/// they were raised for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// The accumulated history could not be delivered to a new member.
    #[error("Failed to replay history of session {session} to {connection_id}: {source}")]
    ReplayFailed {
        session: SessionName,
        connection_id: ConnectionId,
        #[source]
        source: TransportError,
    },
}

impl RelayError {
    pub fn replay_failed(
        session: SessionName,
        connection_id: ConnectionId,
        source: TransportError,
    ) -> Self {
        RelayError::ReplayFailed {
            session,
            connection_id,
            source,
        }
    }
}
