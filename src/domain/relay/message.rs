//! Inbound message classification.
//!
//! Every frame a client sends starts with a one-byte type tag. The relay
//! reads that byte and nothing else; the remainder is an opaque payload
//! produced by the client-side CRDT library and is forwarded verbatim.
//!
//! | Tag | Kind             | Effect                                  |
//! |-----|------------------|-----------------------------------------|
//! | 0   | `Update`         | append to history, then broadcast       |
//! | 1   | `Awareness`      | broadcast only                          |
//! | 2   | `Auth`           | reserved, accepted and ignored          |
//! | 3   | `QueryAwareness` | reserved, accepted and ignored          |
//! | *   | `Unknown`        | dropped, connection stays open          |

use std::fmt;

/// Kind of an inbound message, derived from its leading tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Persistent document change; retained and replayed to late joiners.
    Update,
    /// Ephemeral presence (cursor, selection); never retained.
    Awareness,
    /// Reserved for authentication.
    Auth,
    /// Reserved for presence queries.
    QueryAwareness,
    /// Any tag the relay does not recognize.
    Unknown(u8),
}

impl MessageKind {
    pub const UPDATE_TAG: u8 = 0;
    pub const AWARENESS_TAG: u8 = 1;
    pub const AUTH_TAG: u8 = 2;
    pub const QUERY_AWARENESS_TAG: u8 = 3;

    /// Maps a tag byte to its message kind.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            Self::UPDATE_TAG => MessageKind::Update,
            Self::AWARENESS_TAG => MessageKind::Awareness,
            Self::AUTH_TAG => MessageKind::Auth,
            Self::QUERY_AWARENESS_TAG => MessageKind::QueryAwareness,
            other => MessageKind::Unknown(other),
        }
    }

    /// Classifies a frame by its first byte.
    ///
    /// Returns `None` for a zero-length frame, which has no tag to read.
    pub fn classify(frame: &[u8]) -> Option<Self> {
        frame.first().copied().map(Self::from_tag)
    }

    /// The tag byte this kind is encoded as.
    pub fn tag(&self) -> u8 {
        match self {
            MessageKind::Update => Self::UPDATE_TAG,
            MessageKind::Awareness => Self::AWARENESS_TAG,
            MessageKind::Auth => Self::AUTH_TAG,
            MessageKind::QueryAwareness => Self::QUERY_AWARENESS_TAG,
            MessageKind::Unknown(tag) => *tag,
        }
    }

    /// Whether messages of this kind are appended to session history.
    pub fn is_persistent(&self) -> bool {
        matches!(self, MessageKind::Update)
    }

    /// Whether messages of this kind are rebroadcast to other members.
    pub fn is_relayed(&self) -> bool {
        matches!(self, MessageKind::Update | MessageKind::Awareness)
    }

    /// Whether this kind is one of the reserved, no-op tags.
    pub fn is_reserved(&self) -> bool {
        matches!(self, MessageKind::Auth | MessageKind::QueryAwareness)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Update => write!(f, "update"),
            MessageKind::Awareness => write!(f, "awareness"),
            MessageKind::Auth => write!(f, "auth"),
            MessageKind::QueryAwareness => write!(f, "query-awareness"),
            MessageKind::Unknown(tag) => write!(f, "unknown({})", tag),
        }
    }
}
