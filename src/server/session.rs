//! Per-session state (C4): the key/value record the protocol loop mutates
//! on every message, plus the pluggable store that holds it.
//!
//! TTL-based, pluggable-backend shape common to session-storage crates,
//! narrowed to exactly the key set the dispatcher needs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::core::error::{McpError, McpResult};
use crate::protocol::types::{ClientInfo, LoggingLevel};
use crate::server::cache::CacheBackend;

/// Default inactivity threshold before the reaper drops a session.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// A single client session's mutable state. Every field here corresponds
/// to a required key in the session table; nothing else belongs on this
/// struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub initialized: bool,
    pub client_info: Option<ClientInfo>,
    pub protocol_version: Option<String>,
    pub log_level: LoggingLevel,
    pub subscriptions: HashSet<String>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String) -> Self {
        Self {
            id,
            initialized: false,
            client_info: None,
            protocol_version: None,
            log_level: LoggingLevel::Info,
            subscriptions: HashSet::new(),
            last_activity: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.last_activity);
        age.to_std().map(|a| a > ttl).unwrap_or(false)
    }
}

/// Pluggable session persistence. Implementations must tolerate backend
/// unavailability by degrading to best-effort and logging at `warn`
/// rather than propagating — per-session state is recoverable (the
/// client will re-`initialize`), so a cache hiccup should never fail a
/// live request.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id, if it exists and is not expired.
    async fn get(&self, id: &str) -> McpResult<Option<Session>>;

    /// Create a new session with the given id, replacing any existing one.
    async fn create(&self, id: String) -> McpResult<Session>;

    /// Persist `session`'s current state. Called by the protocol loop at
    /// the end of every message dispatch.
    async fn save(&self, session: &Session) -> McpResult<()>;

    /// Remove a session entirely (on disconnect or reaper sweep).
    async fn remove(&self, id: &str) -> McpResult<()>;

    /// All session ids currently tracked, for the reaper to scan.
    async fn ids(&self) -> McpResult<Vec<String>>;
}

/// Default backend: an in-process map behind a single `RwLock`. Adequate
/// for stdio (one session) and single-process HTTP deployments.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: &str) -> McpResult<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn create(&self, id: String) -> McpResult<Session> {
        let session = Session::new(id.clone());
        self.sessions.write().await.insert(id, session.clone());
        Ok(session)
    }

    async fn save(&self, session: &Session) -> McpResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> McpResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn ids(&self) -> McpResult<Vec<String>> {
        Ok(self.sessions.read().await.keys().cloned().collect())
    }
}

/// Cache-backed store for multi-process HTTP deployments: session state
/// round-trips through a `CacheBackend`, with an in-memory index of known
/// ids so the reaper can scan without a cache-wide listing operation.
pub struct CachedSessionStore {
    cache: Arc<dyn CacheBackend>,
    known_ids: RwLock<HashSet<String>>,
}

impl CachedSessionStore {
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache, known_ids: RwLock::new(HashSet::new()) }
    }

    fn key(id: &str) -> String {
        format!("mcp:session:{id}")
    }
}

#[async_trait]
impl SessionStore for CachedSessionStore {
    async fn get(&self, id: &str) -> McpResult<Option<Session>> {
        match self.cache.get(&Self::key(id)).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    warn!(session = %id, error = %e, "discarding malformed cached session");
                    Ok(None)
                }
            },
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(session = %id, error = %e, "session cache read failed, treating as miss");
                Ok(None)
            }
        }
    }

    async fn create(&self, id: String) -> McpResult<Session> {
        let session = Session::new(id.clone());
        self.save(&session).await?;
        self.known_ids.write().await.insert(id);
        Ok(session)
    }

    async fn save(&self, session: &Session) -> McpResult<()> {
        let serialized = serde_json::to_string(session).map_err(McpError::from)?;
        if let Err(e) = self.cache.set(&Self::key(&session.id), serialized).await {
            warn!(session = %session.id, error = %e, "session cache write failed");
        }
        self.known_ids.write().await.insert(session.id.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> McpResult<()> {
        if let Err(e) = self.cache.delete(&Self::key(id)).await {
            warn!(session = %id, error = %e, "session cache delete failed");
        }
        self.known_ids.write().await.remove(id);
        Ok(())
    }

    async fn ids(&self) -> McpResult<Vec<String>> {
        Ok(self.known_ids.read().await.iter().cloned().collect())
    }
}

/// Per-session mutation lock, one per live session rather than a single
/// global lock, so concurrent POSTs for different sessions never block
/// each other while still serializing writes to the same session's
/// `last_activity`/`subscriptions`/`log_level`.
#[derive(Default)]
pub struct SessionLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(id) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        locks.entry(id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    pub async fn remove(&self, id: &str) {
        self.locks.write().await.remove(id);
    }
}

/// Background sweep: drop any session whose `last_activity` is older
/// than `ttl`, reporting each expired id to `on_expire` before removing
/// it from `store`. `on_expire` is synchronous so it can't itself await
/// the subscription-manager cleanup an expiry also needs — callers that
/// care (see `Protocol::spawn_reaper`) collect the ids here and drive
/// that cleanup afterward.
pub async fn reap_expired<F>(store: &dyn SessionStore, ttl: Duration, mut on_expire: F) -> McpResult<()>
where
    F: FnMut(&str),
{
    for id in store.ids().await? {
        if let Some(session) = store.get(&id).await? {
            if session.is_expired(ttl) {
                on_expire(&id);
                store.remove(&id).await?;
            }
        }
    }
    Ok(())
}
