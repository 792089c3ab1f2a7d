//! Session - a named room of connections sharing one document stream.
//!
//! A session holds two pieces of shared mutable state behind a single
//! reader/writer lock:
//!
//! - the member set, keyed by [`ConnectionId`]
//! - the accumulated history, the byte-wise concatenation of every update
//!   message received so far
//!
//! # Locking
//!
//! ```text
//!                 write lock                read lock
//!            ┌──────────────────┐     ┌──────────────────┐
//!   join     │ insert member    │ ──▶ │ send snapshot    │   (downgraded)
//!   update   │ append + fan-out │     │                  │
//!   leave    │ remove member    │     │                  │
//!   awareness│                  │     │ fan-out          │
//!            └──────────────────┘     └──────────────────┘
//! ```
//!
//! Updates append and broadcast under the write lock, so a joiner's snapshot
//! either contains an update or the update reaches it live, never both.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::foundation::{ConnectionId, SessionName};

use super::connection::ConnectionHandle;
use super::errors::RelayError;
use super::message::MessageKind;

/// Delivery report for one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanOut {
    /// Members the frame was written to.
    pub delivered: usize,
    /// Members removed because the write failed.
    pub pruned: usize,
}

/// What the session did with an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Update or awareness message, broadcast to the other members.
    Relayed { kind: MessageKind, fan_out: FanOut },
    /// Reserved tag, accepted and ignored.
    Reserved(MessageKind),
    /// Unrecognized tag, dropped.
    Unknown(u8),
    /// Zero-length frame, dropped.
    Empty,
    /// The sender is no longer a member; nothing was applied.
    NotMember,
}

#[derive(Default)]
struct SessionState {
    members: HashMap<ConnectionId, ConnectionHandle>,
    history: Vec<u8>,
}

/// A named, independently synchronized room.
pub struct Session {
    name: SessionName,
    state: RwLock<SessionState>,
    send_timeout: Option<Duration>,
}

impl Session {
    /// Create an empty session with unbounded sends.
    pub fn new(name: SessionName) -> Self {
        Self::with_send_timeout(name, None)
    }

    /// Create an empty session whose per-member sends are bounded by `send_timeout`.
    pub fn with_send_timeout(name: SessionName, send_timeout: Option<Duration>) -> Self {
        Self {
            name,
            state: RwLock::new(SessionState::default()),
            send_timeout,
        }
    }

    pub fn name(&self) -> &SessionName {
        &self.name
    }

    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout
    }

    /// Add a member and replay the accumulated history to it.
    ///
    /// The history is sent as a single frame, and only when non-empty. The
    /// snapshot is taken and delivered while the lock is still held, so the
    /// new member sees exactly "snapshot, then every later update". Awareness
    /// fan-out only needs the read lock and may reach the member before its
    /// snapshot.
    ///
    /// Returns the number of history bytes replayed. If the replay cannot be
    /// delivered the member is removed again and an error is returned.
    pub async fn join(&self, handle: ConnectionHandle) -> Result<usize, RelayError> {
        let id = handle.id();
        let mut state = self.state.write().await;
        state.members.insert(id, handle.clone());
        tracing::info!(
            session = %self.name,
            connection_id = %id,
            members = state.members.len(),
            "Client joined session"
        );

        // Updates need the write lock, so none can land between the
        // snapshot and its delivery.
        let state = state.downgrade();
        if state.history.is_empty() {
            return Ok(0);
        }

        let replayed = state.history.len();
        let sent = handle.send(&state.history, self.send_timeout).await;
        drop(state);

        match sent {
            Ok(()) => {
                tracing::debug!(
                    session = %self.name,
                    connection_id = %id,
                    bytes = replayed,
                    "Replayed session history"
                );
                Ok(replayed)
            }
            Err(source) => {
                tracing::warn!(
                    session = %self.name,
                    connection_id = %id,
                    "Error sending state to new client: {}",
                    source
                );
                self.leave(id).await;
                Err(RelayError::replay_failed(self.name.clone(), id, source))
            }
        }
    }

    /// Remove a member.
    ///
    /// Idempotent: returns `false` if the connection was not a member.
    pub async fn leave(&self, id: ConnectionId) -> bool {
        let mut state = self.state.write().await;
        let removed = state.members.remove(&id).is_some();
        if removed {
            tracing::info!(
                session = %self.name,
                connection_id = %id,
                members = state.members.len(),
                "Client left session"
            );
        }
        removed
    }

    /// Copy of the history buffer as it is right now.
    pub async fn snapshot_history(&self) -> Vec<u8> {
        self.state.read().await.history.clone()
    }

    /// Classify an inbound frame and apply it.
    ///
    /// Only the first byte is inspected; relayed frames are forwarded verbatim.
    /// Frames from a connection that is no longer a member are refused.
    pub async fn apply(&self, sender: ConnectionId, frame: &[u8]) -> ApplyOutcome {
        let Some(kind) = MessageKind::classify(frame) else {
            tracing::trace!(session = %self.name, connection_id = %sender, "Ignoring empty frame");
            return ApplyOutcome::Empty;
        };

        if kind.is_relayed() {
            tracing::debug!(
                session = %self.name,
                connection_id = %sender,
                kind = %kind,
                len = frame.len(),
                "Received {} message",
                if kind.is_persistent() { "sync" } else { "awareness" }
            );
            let fan_out = if kind.is_persistent() {
                self.append_and_broadcast(sender, frame).await
            } else {
                self.broadcast(sender, frame).await
            };
            return match fan_out {
                Some(fan_out) => ApplyOutcome::Relayed { kind, fan_out },
                None => self.refuse(sender),
            };
        }

        if !self.is_member(sender).await {
            return self.refuse(sender);
        }

        if kind.is_reserved() {
            tracing::debug!(
                session = %self.name,
                connection_id = %sender,
                kind = %kind,
                "Ignoring reserved message"
            );
            ApplyOutcome::Reserved(kind)
        } else {
            tracing::warn!(
                session = %self.name,
                connection_id = %sender,
                "Unknown message type: {}",
                kind.tag()
            );
            ApplyOutcome::Unknown(kind.tag())
        }
    }

    /// Append a frame to history and send it to every member but `sender`,
    /// as one step under the write lock.
    ///
    /// Returns `None`, leaving history untouched, when `sender` is not a member.
    pub async fn append_and_broadcast(&self, sender: ConnectionId, frame: &[u8]) -> Option<FanOut> {
        let (delivered, pruned) = {
            let mut state = self.state.write().await;
            if !state.members.contains_key(&sender) {
                return None;
            }
            state.history.extend_from_slice(frame);

            let (delivered, failed) = self.deliver(&state.members, sender, frame).await;
            (delivered, self.prune(&mut state.members, &failed))
        };

        let fan_out = FanOut {
            delivered,
            pruned: pruned.len(),
        };
        self.disconnect(pruned).await;
        Some(fan_out)
    }

    /// Send a frame to every member but `sender` without recording it.
    ///
    /// Fan-out runs under the read lock; members whose send failed are
    /// pruned afterwards under the write lock. Returns `None` when `sender`
    /// is not a member.
    pub async fn broadcast(&self, sender: ConnectionId, frame: &[u8]) -> Option<FanOut> {
        let (delivered, failed) = {
            let state = self.state.read().await;
            if !state.members.contains_key(&sender) {
                return None;
            }
            self.deliver(&state.members, sender, frame).await
        };

        let pruned = if failed.is_empty() {
            Vec::new()
        } else {
            let mut state = self.state.write().await;
            self.prune(&mut state.members, &failed)
        };

        let fan_out = FanOut {
            delivered,
            pruned: pruned.len(),
        };
        self.disconnect(pruned).await;
        Some(fan_out)
    }

    /// Number of current members.
    pub async fn member_count(&self) -> usize {
        self.state.read().await.members.len()
    }

    /// Whether `id` is currently a member.
    pub async fn is_member(&self, id: ConnectionId) -> bool {
        self.state.read().await.members.contains_key(&id)
    }

    /// Size of the history buffer in bytes.
    pub async fn history_len(&self) -> usize {
        self.state.read().await.history.len()
    }

    /// Sequential fan-out. A failed send never stops delivery to the rest.
    async fn deliver(
        &self,
        members: &HashMap<ConnectionId, ConnectionHandle>,
        sender: ConnectionId,
        frame: &[u8],
    ) -> (usize, Vec<ConnectionId>) {
        let mut delivered = 0;
        let mut failed = Vec::new();

        for (id, member) in members.iter().filter(|(id, _)| **id != sender) {
            match member.send(frame, self.send_timeout).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        session = %self.name,
                        connection_id = %id,
                        "Error broadcasting to client: {}",
                        e
                    );
                    failed.push(*id);
                }
            }
        }

        (delivered, failed)
    }

    fn prune(
        &self,
        members: &mut HashMap<ConnectionId, ConnectionHandle>,
        failed: &[ConnectionId],
    ) -> Vec<ConnectionHandle> {
        let pruned: Vec<_> = failed.iter().filter_map(|id| members.remove(id)).collect();
        if !pruned.is_empty() {
            tracing::info!(
                session = %self.name,
                pruned = pruned.len(),
                members = members.len(),
                "Pruned unreachable clients"
            );
        }
        pruned
    }

    /// Close pruned members so their receive loops end. Runs without the lock.
    async fn disconnect(&self, pruned: Vec<ConnectionHandle>) {
        for member in pruned {
            if let Err(e) = member.close(self.send_timeout).await {
                tracing::debug!(
                    session = %self.name,
                    connection_id = %member.id(),
                    "Closing pruned client failed: {}",
                    e
                );
            }
        }
    }

    fn refuse(&self, sender: ConnectionId) -> ApplyOutcome {
        tracing::debug!(
            session = %self.name,
            connection_id = %sender,
            "Dropping message from removed client"
        );
        ApplyOutcome::NotMember
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}
