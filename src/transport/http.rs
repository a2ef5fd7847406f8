//! HTTP+SSE transport (C10).
//!
//! One GET endpoint opens a per-session Server-Sent-Events stream; one POST
//! endpoint ingests JSON-RPC envelopes addressed to a session by query
//! parameter. Outbound frames are queued per session and drained by the SSE
//! loop, so a frame produced while no stream is attached simply waits.
//!
//! Same router shape as the rest of the crate's axum usage
//! (`Router::new().route(...).layer(cors)`), same `axum::serve` entry
//! point, same reliance on `tower_http::cors::CorsLayer`. The single-
//! connection `ServerTransport` trait and its global `broadcast` channel for
//! notifications don't fit a multi-session model, so this transport talks to
//! [`Protocol`] directly instead of implementing that trait.

use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response, Sse, sse::{Event, KeepAlive}},
    routing::{get, post},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Notify, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::McpResult;
use crate::server::protocol::{MessageSink, Protocol};

/// A single outbound frame waiting to reach its session's SSE stream, tagged
/// with the monotonically increasing id the SSE framing requires.
struct QueuedFrame {
    id: u64,
    message: Value,
}

/// Per-session outbound queue. Frames enqueued while no SSE stream is
/// attached stay here until a stream connects (or the session's TTL expires
/// and the session store reaps it).
struct SessionQueue {
    frames: StdMutex<VecDeque<QueuedFrame>>,
    notify: Notify,
    next_id: AtomicU64,
}

impl SessionQueue {
    fn new() -> Self {
        Self { frames: StdMutex::new(VecDeque::new()), notify: Notify::new(), next_id: AtomicU64::new(1) }
    }

    fn push(&self, message: Value) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().unwrap().push_back(QueuedFrame { id, message });
        self.notify.notify_one();
    }

    /// Wait until a frame is available and pop it. Races between `push`'s
    /// `notify_one` and this call's `notified()` are safe: `Notify` stores a
    /// permit when nothing is waiting yet, so a push landing between the
    /// queue check and the wait is never missed.
    async fn wait_for_next(&self) -> QueuedFrame {
        loop {
            if let Some(frame) = self.frames.lock().unwrap().pop_front() {
                return frame;
            }
            self.notify.notified().await;
        }
    }
}

type SessionMap = Arc<RwLock<HashMap<String, Arc<SessionQueue>>>>;

/// A single link in the middleware chain: receives the request and a `next`
/// continuation, may short-circuit with its own response, mutate the
/// request, or forward unchanged.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, req: Request, next: Next) -> Response;
}

/// Default middleware: logs method, path, and response status at `info`.
pub struct RequestLogging;

#[async_trait]
impl Middleware for RequestLogging {
    async fn handle(&self, req: Request, next: Next) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let response = next.run(req).await;
        info!(%method, %path, status = response.status().as_u16(), "http request");
        response
    }
}

#[derive(Clone)]
struct HttpState {
    protocol: Arc<Protocol>,
    sessions: SessionMap,
    prefix: Arc<String>,
    keepalive: Duration,
}

impl HttpState {
    async fn get_or_create_queue(&self, session_id: &str) -> Arc<SessionQueue> {
        if let Some(queue) = self.sessions.read().await.get(session_id) {
            return queue.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_insert_with(|| Arc::new(SessionQueue::new())).clone()
    }
}

#[async_trait]
impl MessageSink for HttpState {
    async fn send(&self, session_id: &str, message: Value) {
        let queue = self.get_or_create_queue(session_id).await;
        queue.push(message);
    }
}

/// Cleans up session state (the outbound queue, the Protocol's subscriptions
/// and session record) when an SSE stream ends for any reason: client
/// disconnect, server shutdown, or the stream being dropped.
struct DisconnectGuard {
    protocol: Arc<Protocol>,
    sessions: SessionMap,
    session_id: String,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let protocol = self.protocol.clone();
        let sessions = self.sessions.clone();
        let session_id = self.session_id.clone();
        tokio::spawn(async move {
            sessions.write().await.remove(&session_id);
            protocol.forget_session(&session_id).await;
            info!(event = "client_disconnected", session = %session_id);
        });
    }
}

/// HTTP+SSE transport driving [`Protocol`] for many concurrent sessions.
pub struct HttpTransport {
    protocol: Arc<Protocol>,
    sessions: SessionMap,
    prefix: String,
    keepalive: Duration,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl HttpTransport {
    pub fn new(protocol: Arc<Protocol>, keepalive: Duration) -> Self {
        Self {
            protocol,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            prefix: String::new(),
            keepalive,
            middlewares: vec![Arc::new(RequestLogging)],
        }
    }

    /// Mount both endpoints under `/{prefix}/...` instead of the root.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Append a middleware to the chain. Runs in the order added, outermost
    /// first.
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    fn route(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            format!("/{path}")
        } else {
            format!("/{}/{path}", self.prefix)
        }
    }

    pub fn router(&self) -> Router {
        let state = HttpState {
            protocol: self.protocol.clone(),
            sessions: self.sessions.clone(),
            prefix: Arc::new(self.prefix.clone()),
            keepalive: self.keepalive,
        };

        let mut router = Router::new()
            .route(&self.route("sse"), get(sse_handler))
            .route(&self.route("message"), post(message_handler))
            .route("/health", get(health_handler))
            .with_state(state);

        for mw in self.middlewares.iter().rev() {
            let mw = mw.clone();
            router = router.layer(middleware::from_fn(move |req: Request, next: Next| {
                let mw = mw.clone();
                async move { mw.handle(req, next).await }
            }));
        }

        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
        router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
    }

    /// Bind and serve until a SIGINT/SIGTERM arrives.
    pub async fn serve(&self, bind_addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|e| crate::core::error::McpError::transport(format!("failed to bind to {bind_addr}: {e}")))?;
        info!(addr = %bind_addr, "HTTP+SSE transport listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::core::error::McpError::transport(format!("HTTP server error: {e}")))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received, draining HTTP+SSE transport");
}

#[derive(Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn sse_handler(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let queue = state.get_or_create_queue(&session_id).await;
    info!(event = "client_connected", session = %session_id);

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok()).unwrap_or("localhost");
    let prefix = state.prefix.trim_matches('/');
    let endpoint_url = if prefix.is_empty() {
        format!("{scheme}://{host}/message?sessionId={session_id}")
    } else {
        format!("{scheme}://{host}/{prefix}/message?sessionId={session_id}")
    };

    let endpoint_event = stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint_url)) });

    let guard = DisconnectGuard {
        protocol: state.protocol.clone(),
        sessions: state.sessions.clone(),
        session_id: session_id.clone(),
    };

    let frame_stream = stream::unfold((queue, guard), |(queue, guard)| async move {
        let frame = queue.wait_for_next().await;
        let data = serde_json::to_string(&frame.message).unwrap_or_else(|e| {
            warn!(error = %e, "failed to serialize outbound SSE frame");
            "{}".to_string()
        });
        let event = Event::default().event("message").id(frame.id.to_string()).data(data);
        Some((Ok(event), (queue, guard)))
    });

    Sse::new(endpoint_event.chain(frame_stream)).keep_alive(KeepAlive::new().interval(state.keepalive).text(""))
}

async fn message_handler(
    State(state): State<HttpState>,
    Query(query): Query<MessageQuery>,
    body: Result<Json<Value>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(value) = match body {
        Ok(json) => json,
        Err(rejection) => return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response(),
    };
    state.protocol.handle_message(value, &query.session_id, &state).await;
    StatusCode::ACCEPTED.into_response()
}

async fn health_handler() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "transport": "http+sse",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
