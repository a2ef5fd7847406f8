//! Protocol loop (C7): the single place that receives a decoded inbound
//! message for a session, drives the [`Dispatcher`], and arranges delivery
//! of whatever response results.
//!
//! `transport::traits::ServerTransport` assumes exactly one connection
//! per server instance and has no notion of a session id. These
//! transports are multi-session (stdio has exactly one fixed session,
//! HTTP+SSE has many), so outbound delivery is abstracted behind
//! [`MessageSink`] instead, keyed by session id, and transports implement
//! it rather than the other way around.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::core::error::McpError;
use crate::protocol::batch::{BatchRequest, BatchResponse};
use crate::protocol::codec::{decode, DecodedMessage};
use crate::protocol::types::{error_codes, JsonRpcError, JsonRpcResponse, RequestId, JSONRPC_VERSION};
use crate::server::dispatcher::Dispatcher;
use crate::server::session::{Session, SessionLocks, SessionStore};
use crate::server::subscription::SubscriptionManager;

/// Where the protocol loop delivers outbound frames, addressed by session.
/// Stdio writes straight to stdout for its one session; HTTP+SSE enqueues
/// onto the session's message queue for the SSE loop to drain.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, session_id: &str, message: Value);
}

/// Drives dispatch for every transport. One instance is shared across all
/// sessions; transports hold an `Arc<Protocol>` and feed it raw JSON.
pub struct Protocol {
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<dyn SessionStore>,
    subscriptions: Arc<SubscriptionManager>,
    locks: SessionLocks,
}

impl Protocol {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        sessions: Arc<dyn SessionStore>,
        subscriptions: Arc<SubscriptionManager>,
    ) -> Self {
        Self { dispatcher, sessions, subscriptions, locks: SessionLocks::new() }
    }

    /// Handle one raw inbound JSON value for `session_id`. Implements the
    /// six-step sequence: fetch or create the session, branch on message
    /// shape, dispatch, persist the session, then deliver any response.
    ///
    /// The whole sequence runs under `session_id`'s lock so two concurrent
    /// POSTs for the same session (the HTTP transport's normal concurrency
    /// model) serialize rather than racing a fetch-mutate-save cycle and
    /// silently dropping one side's `subscriptions`/`log_level`/
    /// `last_activity` update.
    pub async fn handle_message(&self, raw: Value, session_id: &str, sink: &dyn MessageSink) {
        let lock = self.locks.lock_for(session_id).await;
        let _guard = lock.lock().await;

        let mut session = match self.fetch_or_create(session_id).await {
            Some(session) => session,
            None => return,
        };
        session.touch();

        match decode(raw) {
            Ok(DecodedMessage::Batch(batch)) => {
                self.handle_batch(&mut session, batch, session_id, sink).await
            }
            Ok(DecodedMessage::Request(req)) => {
                let id = req.id.clone();
                let outcome = self.dispatcher.dispatch_request(&mut session, &req.method, req.params).await;
                self.deliver(sink, session_id, id, outcome).await;
            }
            Ok(DecodedMessage::Notification(notif)) => {
                if let Err(e) =
                    self.dispatcher.dispatch_notification(&mut session, &notif.method, notif.params).await
                {
                    warn!(method = %notif.method, error = %e, "notification handling failed");
                }
            }
            // A Response/Error arriving from the client answers a
            // server-initiated request (sampling, roots, elicitation).
            // No such outstanding-request table exists yet to route these
            // to, so they are logged and dropped rather than misrouted.
            Ok(DecodedMessage::Response(_)) | Ok(DecodedMessage::Error(_)) => {
                warn!(session = %session_id, "dropping unsolicited response/error from client");
            }
            Err(e) => {
                self.deliver(sink, session_id, Value::Null, Err(e)).await;
            }
        }

        if let Err(e) = self.sessions.save(&session).await {
            warn!(session = %session_id, error = %e, "failed to persist session");
        }
    }

    /// Notify every session subscribed to `uri`, enqueuing the frame onto
    /// each session's queue via `sink`. Called by hosts when a resource's
    /// backing data changes.
    pub async fn notify_resource_updated(&self, uri: &str, sink: &dyn MessageSink) {
        let notification = crate::protocol::types::JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: crate::protocol::methods::RESOURCES_UPDATED.to_string(),
            params: Some(serde_json::json!({ "uri": uri })),
        };
        let Ok(frame) = serde_json::to_value(&notification) else {
            error!(uri = %uri, "failed to serialize resource update notification");
            return;
        };
        for session_id in self.subscriptions.notify_resource_updated(uri).await {
            sink.send(&session_id, frame.clone()).await;
        }
    }

    /// Drop a session's subscriptions and per-session lock entry. Called by
    /// a transport on disconnect and by the reaper on expiry.
    pub async fn forget_session(&self, session_id: &str) {
        let lock = self.locks.lock_for(session_id).await;
        {
            let _guard = lock.lock().await;
            self.subscriptions.remove_session(session_id).await;
            if let Err(e) = self.sessions.remove(session_id).await {
                warn!(session = %session_id, error = %e, "failed to remove session state");
            }
        }
        self.locks.remove(session_id).await;
    }

    /// Spawn the inactivity reaper: every `ttl`, sweep sessions whose
    /// `last_activity` has fallen behind and drop them via
    /// [`Self::forget_session`]. Runs until the returned handle is aborted,
    /// which transports do when they shut down.
    pub fn spawn_reaper(self: Arc<Self>, ttl: std::time::Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ttl);
            loop {
                ticker.tick().await;
                self.reap_once(ttl).await;
            }
        })
    }

    async fn reap_once(&self, ttl: std::time::Duration) {
        let mut expired = Vec::new();
        if let Err(e) = crate::server::session::reap_expired(self.sessions.as_ref(), ttl, |id| {
            expired.push(id.to_string())
        })
        .await
        {
            warn!(error = %e, "session reaper sweep failed");
            return;
        }
        for session_id in expired {
            info!(event = "client_disconnected", session = %session_id, reason = "inactivity timeout", "reaping expired session");
            self.forget_session(&session_id).await;
        }
    }

    async fn fetch_or_create(&self, session_id: &str) -> Option<Session> {
        match self.sessions.get(session_id).await {
            Ok(Some(session)) => Some(session),
            Ok(None) => match self.sessions.create(session_id.to_string()).await {
                Ok(session) => Some(session),
                Err(e) => {
                    error!(session = %session_id, error = %e, "failed to create session");
                    None
                }
            },
            Err(e) => {
                error!(session = %session_id, error = %e, "failed to fetch session");
                None
            }
        }
    }

    async fn handle_batch(
        &self,
        session: &mut Session,
        batch: BatchRequest,
        session_id: &str,
        sink: &dyn MessageSink,
    ) {
        let (requests, notifications) = batch.split();

        for notif in notifications {
            if let Err(e) =
                self.dispatcher.dispatch_notification(session, &notif.method, notif.params).await
            {
                warn!(method = %notif.method, error = %e, "notification handling failed");
            }
        }

        if requests.is_empty() {
            return;
        }

        let mut response = BatchResponse::new();
        for req in requests {
            let id = req.id.clone();
            match self.dispatcher.dispatch_request(session, &req.method, req.params).await {
                Ok(result) => {
                    let ok = JsonRpcResponse::success(id, result)
                        .expect("serializing an already-built Value is infallible");
                    response = response.add_response(ok);
                }
                Err(e) => {
                    response = response.add_error(Self::to_json_rpc_error(id, &e));
                }
            }
        }

        if response.is_empty() {
            return;
        }
        if let Ok(value) = serde_json::to_value(&response) {
            sink.send(session_id, value).await;
        }
    }

    async fn deliver(
        &self,
        sink: &dyn MessageSink,
        session_id: &str,
        id: RequestId,
        outcome: Result<Value, McpError>,
    ) {
        let frame = match outcome {
            Ok(result) => serde_json::to_value(
                JsonRpcResponse::success(id, result).expect("serializing an already-built Value is infallible"),
            ),
            Err(e) => serde_json::to_value(Self::to_json_rpc_error(id, &e)),
        };
        match frame {
            Ok(frame) => sink.send(session_id, frame).await,
            Err(e) => error!(session = %session_id, error = %e, "failed to serialize response"),
        }
    }

    fn to_json_rpc_error(id: RequestId, error: &McpError) -> JsonRpcError {
        let data = match error {
            McpError::ValidationFailed(issues) => {
                Some(serde_json::json!({ "validation_errors": issues }))
            }
            _ => None,
        };
        JsonRpcError::error(id, error.json_rpc_code(), error.to_string(), data)
    }
}

/// Map a raw JSON-decode failure (invalid bytes, not just invalid shape)
/// onto the wire's `PARSE_ERROR` response, for transports to call before
/// `handle_message` ever sees a `Value`.
pub fn parse_error_response() -> JsonRpcError {
    JsonRpcError::error(Value::Null, error_codes::PARSE_ERROR, "Parse error".to_string(), None)
}
