//! Host-side dependency resolution.
//!
//! The registry never executes business logic directly for elements it
//! discovers from a manifest: it holds an opaque [`HandlerRef`] and defers
//! to a host-provided [`Container`] to resolve and invoke it. Manually
//! registered elements skip this indirection entirely — they carry an
//! inline `Box<dyn ToolHandler>` (etc.) built at registration time, the
//! "inline callable" form the handler reference can take.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::McpResult;
use crate::core::prompt::PromptHandler;
use crate::core::resource::ResourceHandler;
use crate::core::tool::ToolHandler;
use crate::protocol::types::{GetPromptResult, ResourceContents};
use crate::server::formatter::ResultFormatter;

/// Opaque descriptor naming a host-side handler, resolved at call time by
/// a [`Container`] rather than baked into the registry as a closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum HandlerRef {
    /// A method on a named class/struct, resolved by the host.
    ClassMethod { class: String, method: String },
    /// A single invokable identifier (e.g. a registered function name).
    Invokable(String),
}

impl std::fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerRef::ClassMethod { class, method } => write!(f, "{class}::{method}"),
            HandlerRef::Invokable(name) => write!(f, "{name}"),
        }
    }
}

/// Host-side resolver invoked for elements registered via [`HandlerRef`]
/// instead of an inline handler. The host looks up its own dependency
/// graph for `handler_ref` and executes it, returning a generic value the
/// [`ResultFormatter`] normalizes into the right wire shape.
#[async_trait]
pub trait Container: Send + Sync {
    /// Invoke the tool named by `handler_ref` with the given arguments.
    async fn invoke_tool(
        &self,
        handler_ref: &HandlerRef,
        arguments: HashMap<String, Value>,
    ) -> McpResult<Value>;

    /// Invoke the resource handler named by `handler_ref`.
    async fn invoke_resource(
        &self,
        handler_ref: &HandlerRef,
        uri: &str,
        params: &HashMap<String, String>,
    ) -> McpResult<Value>;

    /// Invoke the prompt handler named by `handler_ref`.
    async fn invoke_prompt(
        &self,
        handler_ref: &HandlerRef,
        arguments: HashMap<String, Value>,
    ) -> McpResult<Value>;
}

/// Adapts a [`Container`]-resolved tool to the inline [`ToolHandler`] shape
/// `core::tool::Tool` expects, so discovered and manual tools share one
/// execution path once registered.
pub struct ContainerBackedToolHandler {
    pub container: Arc<dyn Container>,
    pub handler_ref: HandlerRef,
    pub formatter: Arc<dyn ResultFormatter>,
}

#[async_trait]
impl ToolHandler for ContainerBackedToolHandler {
    async fn call(
        &self,
        arguments: HashMap<String, Value>,
    ) -> McpResult<crate::protocol::types::CallToolResult> {
        let value = self.container.invoke_tool(&self.handler_ref, arguments).await?;
        let content = self.formatter.format_tool_result(value)?;
        Ok(crate::protocol::types::CallToolResult {
            content,
            is_error: None,
            structured_content: None,
            meta: None,
        })
    }
}

/// Adapts a [`Container`]-resolved resource to [`ResourceHandler`].
pub struct ContainerBackedResourceHandler {
    pub container: Arc<dyn Container>,
    pub handler_ref: HandlerRef,
    pub formatter: Arc<dyn ResultFormatter>,
    pub mime_type: Option<String>,
}

#[async_trait]
impl ResourceHandler for ContainerBackedResourceHandler {
    async fn read(
        &self,
        uri: &str,
        params: &HashMap<String, String>,
    ) -> McpResult<Vec<ResourceContents>> {
        let value = self
            .container
            .invoke_resource(&self.handler_ref, uri, params)
            .await?;
        self.formatter
            .format_resource_contents(value, uri, self.mime_type.as_deref())
    }

    async fn list(&self) -> McpResult<Vec<crate::protocol::types::ResourceInfo>> {
        Ok(vec![])
    }
}

/// Adapts a [`Container`]-resolved prompt to [`PromptHandler`].
pub struct ContainerBackedPromptHandler {
    pub container: Arc<dyn Container>,
    pub handler_ref: HandlerRef,
    pub formatter: Arc<dyn ResultFormatter>,
}

#[async_trait]
impl PromptHandler for ContainerBackedPromptHandler {
    async fn get(&self, arguments: HashMap<String, Value>) -> McpResult<GetPromptResult> {
        let value = self
            .container
            .invoke_prompt(&self.handler_ref, arguments)
            .await?;
        let messages = self.formatter.format_prompt_messages(value)?;
        Ok(GetPromptResult { description: None, messages, meta: None })
    }
}
