//! Session name value object.
//!
//! A session is addressed by the request path of the upgrade request, with
//! its leading slash removed by the ingress router. An empty name falls back
//! to the configured default, so `/` and `/default` reach the same room.

use std::borrow::Borrow;
use std::fmt;

/// Normalized routing key of a session.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionName(String);

impl SessionName {
    /// Builds a name from a raw value, substituting `default` when `raw` is empty.
    pub fn or_default(raw: &str, default: &str) -> Self {
        if raw.is_empty() {
            Self(default.to_string())
        } else {
            Self(raw.to_string())
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for SessionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
