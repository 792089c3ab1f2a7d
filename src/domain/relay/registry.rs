//! Session registry - name → session lookup with lazy creation.
//!
//! The registry owns every session for the lifetime of the process. Sessions
//! are never evicted, even when their last member leaves, so a document's
//! history survives periods with nobody connected.
//!
//! The name map has its own lock, independent of each session's lock:
//! traffic inside one session never contends with creating another.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::foundation::SessionName;

use super::session::Session;

/// Name used when a client addresses the empty session name.
pub const DEFAULT_SESSION_NAME: &str = "default";

/// Process-wide mapping from session name to [`Session`].
///
/// Constructed once at startup and handed to the request router; tests
/// build their own isolated instances.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionName, Arc<Session>>>,
    default_session: String,
    send_timeout: Option<Duration>,
}

impl SessionRegistry {
    /// Create an empty registry.
    ///
    /// # Arguments
    ///
    /// * `default_session` - Name substituted for an empty session name
    /// * `send_timeout` - Per-member send bound applied to every session
    pub fn new(default_session: impl Into<String>, send_timeout: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_session: default_session.into(),
            send_timeout,
        }
    }

    /// Normalize a raw session name, applying the default for `""`.
    pub fn session_name(&self, raw: &str) -> SessionName {
        SessionName::or_default(raw, &self.default_session)
    }

    /// Get the session called `name`, creating it on first reference.
    ///
    /// Concurrent callers racing on the same new name all receive the same
    /// `Arc<Session>`.
    pub async fn resolve(&self, name: &str) -> Arc<Session> {
        let name = self.session_name(name);

        if let Some(session) = self.sessions.read().await.get(&name) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(name)
            .or_insert_with_key(|name| {
                tracing::info!(session = %name, "Created new session");
                Arc::new(Session::with_send_timeout(name.clone(), self.send_timeout))
            })
            .clone()
    }

    /// Look up a session without creating it.
    pub async fn get(&self, name: &str) -> Option<Arc<Session>> {
        let name = self.session_name(name);
        self.sessions.read().await.get(&name).cloned()
    }

    /// Number of sessions created so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Names of all sessions (for monitoring/debugging), sorted.
    pub async fn session_names(&self) -> Vec<SessionName> {
        let mut names: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_NAME, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relay::testing::RecordingSink;
    use crate::domain::relay::ConnectionHandle;

    #[tokio::test]
    async fn resolve_creates_session_on_first_reference() {
        let registry = SessionRegistry::default();
        assert_eq!(registry.session_count().await, 0);

        let session = registry.resolve("doc1").await;

        assert_eq!(session.name().as_str(), "doc1");
        assert_eq!(registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn resolve_returns_same_session_for_same_name() {
        let registry = SessionRegistry::default();

        let first = registry.resolve("doc1").await;
        let second = registry.resolve("doc1").await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.session_count().await, 1);
    }

    #[tokio::test]
    async fn empty_name_resolves_to_default_session() {
        let registry = SessionRegistry::new("lobby", None);

        let empty = registry.resolve("").await;
        let named = registry.resolve("lobby").await;

        assert_eq!(empty.name().as_str(), "lobby");
        assert!(Arc::ptr_eq(&empty, &named));
    }

    #[tokio::test]
    async fn get_does_not_create() {
        let registry = SessionRegistry::default();

        assert!(registry.get("doc1").await.is_none());
        assert_eq!(registry.session_count().await, 0);

        registry.resolve("doc1").await;
        assert!(registry.get("doc1").await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_resolution_creates_exactly_one_session() {
        let registry = Arc::new(SessionRegistry::default());

        let mut handles = Vec::new();
        for _ in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { registry.resolve("race").await }));
        }

        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap());
        }

        assert_eq!(registry.session_count().await, 1);
        for session in &sessions {
            assert!(Arc::ptr_eq(session, &sessions[0]));
        }
    }

    #[tokio::test]
    async fn sessions_are_kept_after_last_member_leaves() {
        let registry = SessionRegistry::default();
        let session = registry.resolve("doc1").await;
        let handle = ConnectionHandle::new(session.name().clone(), RecordingSink::new());
        let id = handle.id();
        session.join(handle).await.unwrap();
        session.apply(id, &[0, 1]).await;
        session.leave(id).await;

        let again = registry.resolve("doc1").await;

        assert!(Arc::ptr_eq(&session, &again));
        assert_eq!(again.snapshot_history().await, vec![0, 1]);
    }

    #[tokio::test]
    async fn leaving_one_session_does_not_affect_another() {
        let registry = SessionRegistry::default();
        let a = registry.resolve("a").await;
        let b = registry.resolve("b").await;

        let a_member = ConnectionHandle::new(a.name().clone(), RecordingSink::new());
        let a_id = a_member.id();
        a.join(a_member).await.unwrap();

        let b_sender = ConnectionHandle::new(b.name().clone(), RecordingSink::new());
        let b_sender_id = b_sender.id();
        b.join(b_sender).await.unwrap();
        let b_sink = RecordingSink::new();
        b.join(ConnectionHandle::new(b.name().clone(), b_sink.clone()))
            .await
            .unwrap();
        b.apply(b_sender_id, &[0, 5]).await;

        a.leave(a_id).await;
        b.apply(b_sender_id, &[0, 6]).await;

        assert_eq!(a.member_count().await, 0);
        assert_eq!(b.member_count().await, 2);
        assert_eq!(b.snapshot_history().await, vec![0, 5, 0, 6]);
        assert_eq!(b_sink.frames(), vec![vec![0, 5], vec![0, 6]]);
        assert_eq!(a.history_len().await, 0);
    }

    #[tokio::test]
    async fn session_names_are_sorted() {
        let registry = SessionRegistry::default();
        registry.resolve("zeta").await;
        registry.resolve("alpha").await;
        registry.resolve("").await;

        let names: Vec<String> = registry
            .session_names()
            .await
            .into_iter()
            .map(|n| n.to_string())
            .collect();

        assert_eq!(names, vec!["alpha", "default", "zeta"]);
    }

    #[tokio::test]
    async fn sessions_inherit_send_timeout() {
        let registry = SessionRegistry::new("default", Some(Duration::from_secs(3)));
        let session = registry.resolve("doc").await;

        assert!(format!("{:?}", session).contains("3s"));
    }
}
