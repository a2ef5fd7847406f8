//! Resource subscription tracking (C5): which sessions are watching which
//! URIs, so a resource update fans out to exactly the sessions that asked
//! for it.
//!
//! Kept deliberately decoupled from [`crate::server::session::SessionStore`]:
//! this manager only answers "who is subscribed", the protocol loop is
//! responsible for enqueuing the resulting notification onto each
//! session's message queue.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

/// Bidirectional subscription index. Cheap to share via `Arc`; both maps
/// are kept in lockstep under their own lock (contention is expected to
/// be negligible — this is a single `insert`/`remove` per method call).
#[derive(Default)]
pub struct SubscriptionManager {
    by_session: RwLock<HashMap<String, HashSet<String>>>,
    by_uri: RwLock<HashMap<String, HashSet<String>>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `session_id` to `uri`. Idempotent: subscribing twice has
    /// no additional effect and is not an error.
    pub async fn subscribe(&self, session_id: &str, uri: &str) {
        self.by_session
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .insert(uri.to_string());
        self.by_uri
            .write()
            .await
            .entry(uri.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    /// Unsubscribe `session_id` from `uri`. Idempotent: unsubscribing from
    /// a URI never subscribed to has no effect and is not an error.
    pub async fn unsubscribe(&self, session_id: &str, uri: &str) {
        if let Some(uris) = self.by_session.write().await.get_mut(session_id) {
            uris.remove(uri);
        }
        if let Some(sessions) = self.by_uri.write().await.get_mut(uri) {
            sessions.remove(session_id);
        }
    }

    /// All URIs `session_id` currently watches.
    pub async fn subscriptions_for(&self, session_id: &str) -> HashSet<String> {
        self.by_session.read().await.get(session_id).cloned().unwrap_or_default()
    }

    /// The session ids that should be notified of an update to `uri`.
    pub async fn notify_resource_updated(&self, uri: &str) -> Vec<String> {
        self.by_uri
            .read()
            .await
            .get(uri)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every subscription belonging to `session_id`, e.g. on session
    /// destruction. Leaves `by_uri` consistent by scrubbing the session
    /// out of each URI's subscriber set.
    pub async fn remove_session(&self, session_id: &str) {
        let uris = self.by_session.write().await.remove(session_id).unwrap_or_default();
        let mut by_uri = self.by_uri.write().await;
        for uri in uris {
            if let Some(sessions) = by_uri.get_mut(&uri) {
                sessions.remove(session_id);
                if sessions.is_empty() {
                    by_uri.remove(&uri);
                }
            }
        }
    }
}
