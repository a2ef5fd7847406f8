//! Top-level assembly: wires [`Registry`], [`SessionStore`], [`SubscriptionManager`],
//! [`Dispatcher`], and [`Protocol`] into one host-embeddable handle.
//!
//! Earlier server implementations in this space tend to hold their element
//! maps and transport directly on one struct; here those responsibilities
//! live in their own modules (C3-C7) and `McpServer` is reduced to what a
//! host actually needs: a place to register elements before serving, and a
//! [`Protocol`] handle to hand to a transport.

use std::sync::Arc;

use crate::core::error::McpResult;
use crate::core::prompt::PromptHandler;
use crate::core::resource::{ResourceHandler, ResourceTemplate};
use crate::core::tool::ToolHandler;
use crate::core::{PromptInfo, ResourceInfo, ToolInfo};
use crate::server::config::RuntimeConfig;
use crate::server::dispatcher::Dispatcher;
use crate::server::host::HandlerRef;
use crate::server::protocol::Protocol;
use crate::server::registry::Registry;
use crate::server::session::{InMemorySessionStore, SessionStore};
use crate::server::subscription::SubscriptionManager;

/// A fully wired MCP server: element registry plus the dispatch/protocol
/// stack, ready to be driven by a transport (`StdioTransport`,
/// `HttpTransport`).
pub struct McpServer {
    pub registry: Arc<Registry>,
    pub config: Arc<RuntimeConfig>,
    pub protocol: Arc<Protocol>,
}

impl McpServer {
    /// Assemble a server from a [`RuntimeConfig`] (see [`crate::server::config::ServerBuilder`]).
    /// Sessions are kept in memory; hosts needing persistence across restarts
    /// should wrap [`RuntimeConfig::cache`] accordingly and call
    /// [`Registry::load`] before serving.
    pub fn new(config: RuntimeConfig) -> Self {
        let config = Arc::new(config);
        let mut registry = Registry::new(config.cache.clone(), Arc::new(crate::server::formatter::DefaultFormatter));
        if let Some(container) = config.container.clone() {
            registry = registry.with_container(container);
        }
        let registry = Arc::new(registry);
        let subscriptions = Arc::new(SubscriptionManager::new());
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), subscriptions.clone(), config.clone()));
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let protocol = Arc::new(Protocol::new(dispatcher, sessions, subscriptions));
        Self { registry, config, protocol }
    }

    /// Register a manually-defined tool.
    pub async fn add_tool<H: ToolHandler + 'static>(
        &self,
        name: impl Into<String>,
        description: Option<String>,
        input_schema: serde_json::Value,
        handler: H,
    ) -> McpResult<()> {
        self.registry.register_tool(name.into(), description, input_schema, handler).await
    }

    /// Register a tool resolved through the host's [`crate::server::host::Container`] at call time.
    pub async fn add_discovered_tool(&self, metadata: ToolInfo, handler_ref: HandlerRef) -> McpResult<()> {
        self.registry.register_discovered_tool(metadata, handler_ref).await
    }

    /// Register a manually-defined resource.
    pub async fn add_resource<H: ResourceHandler + 'static>(&self, info: ResourceInfo, handler: H) -> McpResult<()> {
        self.registry.register_resource(info, handler).await
    }

    pub async fn add_discovered_resource(&self, info: ResourceInfo, handler_ref: HandlerRef) -> McpResult<()> {
        self.registry.register_discovered_resource(info, handler_ref).await
    }

    /// Register a resource template.
    pub async fn add_resource_template<H: ResourceHandler + 'static>(
        &self,
        template: ResourceTemplate,
        handler: H,
    ) -> McpResult<()> {
        self.registry.register_resource_template(template, handler).await
    }

    /// Register a manually-defined prompt.
    pub async fn add_prompt<H: PromptHandler + 'static>(&self, info: PromptInfo, handler: H) -> McpResult<()> {
        self.registry.register_prompt(info, handler).await
    }

    pub async fn add_discovered_prompt(&self, info: PromptInfo, handler_ref: HandlerRef) -> McpResult<()> {
        self.registry.register_discovered_prompt(info, handler_ref).await
    }

    /// Load the discovered-element manifest from the configured cache.
    /// Manual registrations already in place take precedence, matching the
    /// registry's own conflict rule.
    pub async fn load_discovered(&self) -> McpResult<()> {
        self.registry.load().await
    }

    /// Run the stdio transport (C9) to completion. Requires the `stdio` feature.
    ///
    /// Spawns the inactivity reaper alongside the transport loop, wired to
    /// [`RuntimeConfig::session_ttl`], and aborts it once the transport
    /// returns.
    #[cfg(feature = "stdio")]
    pub async fn serve_stdio(&self) -> McpResult<()> {
        let reaper = self.protocol.clone().spawn_reaper(self.config.session_ttl);
        let result = crate::transport::stdio::StdioTransport::new(self.protocol.clone()).run().await;
        reaper.abort();
        result
    }

    /// Run the HTTP+SSE transport (C10) to completion. Requires the `http` feature.
    ///
    /// Spawns the inactivity reaper alongside the transport loop, wired to
    /// [`RuntimeConfig::session_ttl`], and aborts it once the transport
    /// returns.
    #[cfg(feature = "http")]
    pub async fn serve_http(&self, bind_addr: &str) -> McpResult<()> {
        let reaper = self.protocol.clone().spawn_reaper(self.config.session_ttl);
        let result = crate::transport::http::HttpTransport::new(self.protocol.clone(), self.config.sse_keepalive)
            .serve(bind_addr)
            .await;
        reaper.abort();
        result
    }
}
