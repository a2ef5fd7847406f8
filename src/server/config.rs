//! Runtime configuration and host wiring (C13): the concrete type behind
//! spec.md's "Configuration object", assembled once at build time and
//! shared read-only by the dispatcher, protocol loop, and transports.

use std::sync::Arc;
use std::time::Duration;

use crate::protocol::types::{ServerCapabilities, ServerInfo};
use crate::server::cache::{CacheBackend, NullCache};
use crate::server::host::Container;

/// Default page size for list methods when the client supplies no cursor
/// and the host sets no override.
pub const DEFAULT_PAGINATION_LIMIT: usize = 50;

/// Default SSE keepalive cadence.
pub const DEFAULT_SSE_KEEPALIVE: Duration = Duration::from_secs(20);

/// Everything the protocol loop, dispatcher, and transports need to know
/// about how this server instance was configured. Built once via
/// [`ServerBuilder`] and shared behind an `Arc`.
pub struct RuntimeConfig {
    pub server_info: ServerInfo,
    pub capabilities: ServerCapabilities,
    pub instructions: Option<String>,
    pub pagination_limit: usize,
    pub session_ttl: Duration,
    pub sse_keepalive: Duration,
    pub cache: Arc<dyn CacheBackend>,
    pub container: Option<Arc<dyn Container>>,
}

/// Fluent assembly of a [`RuntimeConfig`], mirroring the crate's existing
/// `ToolBuilder`/`ResourceBuilder` style.
pub struct ServerBuilder {
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    pagination_limit: usize,
    session_ttl: Duration,
    sse_keepalive: Duration,
    cache: Option<Arc<dyn CacheBackend>>,
    container: Option<Arc<dyn Container>>,
}

impl ServerBuilder {
    pub fn new<S: Into<String>>(name: S, version: S) -> Self {
        Self {
            server_info: ServerInfo::new(name, version),
            capabilities: ServerCapabilities::default(),
            instructions: None,
            pagination_limit: DEFAULT_PAGINATION_LIMIT,
            session_ttl: crate::server::session::DEFAULT_SESSION_TTL,
            sse_keepalive: DEFAULT_SSE_KEEPALIVE,
            cache: None,
            container: None,
        }
    }

    pub fn capabilities(mut self, capabilities: ServerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn instructions<S: Into<String>>(mut self, instructions: S) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn pagination_limit(mut self, limit: usize) -> Self {
        self.pagination_limit = limit;
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn sse_keepalive(mut self, interval: Duration) -> Self {
        self.sse_keepalive = interval;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn build(self) -> RuntimeConfig {
        RuntimeConfig {
            server_info: self.server_info,
            capabilities: self.capabilities,
            instructions: self.instructions,
            pagination_limit: self.pagination_limit,
            session_ttl: self.session_ttl,
            sse_keepalive: self.sse_keepalive,
            cache: self.cache.unwrap_or_else(|| Arc::new(NullCache)),
            container: self.container,
        }
    }
}
