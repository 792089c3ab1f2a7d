//! Relay configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Session and transport settings for the relay core
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Session used when the request path names none
    #[serde(default = "default_session")]
    pub default_session: String,

    /// WebSocket sub-protocol offered by the client library
    #[serde(default = "default_subprotocol")]
    pub subprotocol: String,

    /// Upper bound for one send to one member, in seconds (0 = unbounded)
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

impl RelayConfig {
    /// Per-member send timeout, `None` when disabled
    pub fn send_timeout(&self) -> Option<Duration> {
        (self.send_timeout_secs > 0).then(|| Duration::from_secs(self.send_timeout_secs))
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_session.is_empty() {
            return Err(ValidationError::MissingRequired("relay.default_session"));
        }
        if self.subprotocol.trim().is_empty() {
            return Err(ValidationError::MissingRequired("relay.subprotocol"));
        }
        if self.send_timeout_secs > 3600 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_session: default_session(),
            subprotocol: default_subprotocol(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

fn default_session() -> String {
    "default".to_string()
}

fn default_subprotocol() -> String {
    "y-websocket".to_string()
}

fn default_send_timeout() -> u64 {
    10
}
