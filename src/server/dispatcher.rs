//! Method dispatch (C6): binds every MCP method name to its handling
//! logic, enforcing the initialization gate and capability gates before
//! touching the registry.
//!
//! Method names map to a static table rather than a hand-rolled `match`
//! with ad hoc checks scattered across call sites, walked by
//! [`Dispatcher::dispatch_request`]/[`dispatch_notification`].

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use tracing::warn;

use crate::core::error::{McpError, McpResult};
use crate::protocol::messages::{
    CallToolParams, CompleteParams, CompleteResult, CompletionData, CompletionReference,
    GetPromptParams, InitializeParams, InitializeResult, ListParams, ListPromptsResult,
    ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, PingResult,
    ReadResourceParams, ReadResourceResult, SetLoggingLevelParams, SetLoggingLevelResult,
    SubscribeResourceParams, SubscribeResourceResult, UnsubscribeResourceParams,
    UnsubscribeResourceResult,
};
use crate::protocol::methods;
use crate::protocol::types::{ContentBlock, GetPromptResult, LATEST_PROTOCOL_VERSION};
use crate::server::config::RuntimeConfig;
use crate::server::registry::Registry;
use crate::server::session::Session;
use crate::server::subscription::SubscriptionManager;

/// Methods that require `session.initialized` before they will run.
fn requires_initialization(method: &str) -> bool {
    !matches!(method, methods::INITIALIZE | methods::INITIALIZED | methods::PING)
}

/// The capability a method needs present on [`RuntimeConfig::capabilities`],
/// if any. `None` means no capability gate applies.
fn required_capability(method: &str) -> Option<&'static str> {
    match method {
        methods::TOOLS_LIST | methods::TOOLS_CALL => Some("tools"),
        methods::RESOURCES_LIST
        | methods::RESOURCES_TEMPLATES_LIST
        | methods::RESOURCES_READ
        | methods::RESOURCES_SUBSCRIBE
        | methods::RESOURCES_UNSUBSCRIBE => Some("resources"),
        methods::PROMPTS_LIST | methods::PROMPTS_GET => Some("prompts"),
        methods::LOGGING_SET_LEVEL => Some("logging"),
        methods::COMPLETION_COMPLETE => Some("completions"),
        _ => None,
    }
}

/// Method-router over the registry, subscription manager, and per-session
/// state. One instance is shared by every transport.
pub struct Dispatcher {
    registry: Arc<Registry>,
    subscriptions: Arc<SubscriptionManager>,
    config: Arc<RuntimeConfig>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        subscriptions: Arc<SubscriptionManager>,
        config: Arc<RuntimeConfig>,
    ) -> Self {
        Self { registry, subscriptions, config }
    }

    fn capability_present(&self, capability: &str) -> bool {
        let caps = &self.config.capabilities;
        match capability {
            "tools" => caps.tools.is_some(),
            "resources" => caps.resources.is_some(),
            "prompts" => caps.prompts.is_some(),
            "logging" => caps.logging.is_some(),
            "completions" => caps.completions.is_some(),
            _ => false,
        }
    }

    fn subscribe_capability_present(&self) -> bool {
        self.config
            .capabilities
            .resources
            .as_ref()
            .map(|r| r.subscribe == Some(true))
            .unwrap_or(false)
    }

    fn check_gates(&self, session: &Session, method: &str) -> McpResult<()> {
        if requires_initialization(method) && !session.initialized {
            return Err(McpError::Protocol(format!("session not initialized: {method}")));
        }
        if let Some(capability) = required_capability(method) {
            if !self.capability_present(capability) {
                return Err(McpError::MethodNotFound(method.to_string()));
            }
        }
        if matches!(method, methods::RESOURCES_SUBSCRIBE | methods::RESOURCES_UNSUBSCRIBE)
            && !self.subscribe_capability_present()
        {
            return Err(McpError::MethodNotFound(method.to_string()));
        }
        Ok(())
    }

    /// Dispatch a request method, returning the JSON `result` payload.
    pub async fn dispatch_request(
        &self,
        session: &mut Session,
        method: &str,
        params: Option<Value>,
    ) -> McpResult<Value> {
        self.check_gates(session, method)?;

        let result = match method {
            methods::INITIALIZE => self.handle_initialize(session, params)?,
            methods::PING => serde_json::to_value(PingResult { meta: None }).map_err(McpError::from)?,
            methods::TOOLS_LIST => self.handle_tools_list(params).await?,
            methods::TOOLS_CALL => self.handle_tools_call(params).await?,
            methods::RESOURCES_LIST => self.handle_resources_list(params).await?,
            methods::RESOURCES_TEMPLATES_LIST => self.handle_resources_templates_list(params).await?,
            methods::RESOURCES_READ => self.handle_resources_read(params).await?,
            methods::RESOURCES_SUBSCRIBE => self.handle_resources_subscribe(session, params).await?,
            methods::RESOURCES_UNSUBSCRIBE => self.handle_resources_unsubscribe(session, params).await?,
            methods::PROMPTS_LIST => self.handle_prompts_list(params).await?,
            methods::PROMPTS_GET => self.handle_prompts_get(params).await?,
            methods::LOGGING_SET_LEVEL => self.handle_logging_set_level(session, params)?,
            methods::COMPLETION_COMPLETE => self.handle_completion(params)?,
            other => return Err(McpError::MethodNotFound(other.to_string())),
        };

        Ok(result)
    }

    /// Dispatch a notification. Notifications never produce a response.
    pub async fn dispatch_notification(
        &self,
        session: &mut Session,
        method: &str,
        _params: Option<Value>,
    ) -> McpResult<()> {
        match method {
            methods::INITIALIZED => {
                session.initialized = true;
                Ok(())
            }
            methods::CANCELLED => Ok(()),
            other => {
                warn!(method = %other, "ignoring unrecognized notification");
                Ok(())
            }
        }
    }

    fn handle_initialize(&self, session: &mut Session, params: Option<Value>) -> McpResult<Value> {
        let params: InitializeParams = parse_params(params)?;
        session.client_info = Some(params.client_info);
        session.protocol_version = Some(params.protocol_version.clone());
        if !matches!(params.protocol_version.as_str(), "2024-11-05" | "2025-03-26") {
            warn!(
                requested = %params.protocol_version,
                "client requested an unrecognized protocol version, answering with the latest supported"
            );
        }
        let result = InitializeResult {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: self.config.capabilities.clone(),
            server_info: self.config.server_info.clone(),
            instructions: self.config.instructions.clone(),
            meta: None,
        };
        serde_json::to_value(result).map_err(McpError::from)
    }

    async fn handle_tools_list(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ListParams = parse_params(params)?;
        let all = self.registry.list_tools().await;
        let (page, next_cursor) = paginate(&all, params.cursor.as_deref(), self.config.pagination_limit);
        serde_json::to_value(ListToolsResult { tools: page, next_cursor, meta: None }).map_err(McpError::from)
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let params: CallToolParams = parse_params(params)?;
        let tool = self
            .registry
            .get_tool(&params.name)
            .await
            .ok_or_else(|| McpError::ToolNotFound(params.name.clone()))?;

        let mut arguments = params.arguments.unwrap_or_default();
        tool.validate_parameters(&mut arguments)?;

        let result = match tool.call_unchecked(arguments).await {
            Ok(result) => result,
            Err(e) => crate::protocol::types::CallToolResult {
                content: vec![ContentBlock::Text { text: e.to_string(), annotations: None, meta: None }],
                is_error: Some(true),
                structured_content: None,
                meta: None,
            },
        };
        serde_json::to_value(result).map_err(McpError::from)
    }

    async fn handle_resources_list(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ListParams = parse_params(params)?;
        let all = self.registry.list_resources().await;
        let (page, next_cursor) = paginate(&all, params.cursor.as_deref(), self.config.pagination_limit);
        serde_json::to_value(ListResourcesResult { resources: page, next_cursor, meta: None })
            .map_err(McpError::from)
    }

    async fn handle_resources_templates_list(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ListParams = parse_params(params)?;
        let all = self.registry.list_resource_templates().await;
        let (page, next_cursor) = paginate(&all, params.cursor.as_deref(), self.config.pagination_limit);
        serde_json::to_value(ListResourceTemplatesResult {
            resource_templates: page,
            next_cursor,
            meta: None,
        })
        .map_err(McpError::from)
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ReadResourceParams = parse_params(params)?;
        let (resource, bindings) = self
            .registry
            .get_resource(&params.uri, true)
            .await
            .ok_or_else(|| McpError::ResourceNotFound(params.uri.clone()))?;
        let contents = resource.read(&params.uri, &bindings).await?;
        serde_json::to_value(ReadResourceResult { contents, meta: None }).map_err(McpError::from)
    }

    async fn handle_resources_subscribe(&self, session: &mut Session, params: Option<Value>) -> McpResult<Value> {
        let params: SubscribeResourceParams = parse_params(params)?;
        self.subscriptions.subscribe(&session.id, &params.uri).await;
        session.subscriptions.insert(params.uri);
        serde_json::to_value(SubscribeResourceResult { meta: None }).map_err(McpError::from)
    }

    async fn handle_resources_unsubscribe(&self, session: &mut Session, params: Option<Value>) -> McpResult<Value> {
        let params: UnsubscribeResourceParams = parse_params(params)?;
        self.subscriptions.unsubscribe(&session.id, &params.uri).await;
        session.subscriptions.remove(&params.uri);
        serde_json::to_value(UnsubscribeResourceResult { meta: None }).map_err(McpError::from)
    }

    async fn handle_prompts_list(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ListParams = parse_params(params)?;
        let all = self.registry.list_prompts().await;
        let (page, next_cursor) = paginate(&all, params.cursor.as_deref(), self.config.pagination_limit);
        serde_json::to_value(ListPromptsResult { prompts: page, next_cursor, meta: None }).map_err(McpError::from)
    }

    async fn handle_prompts_get(&self, params: Option<Value>) -> McpResult<Value> {
        let params: GetPromptParams = parse_params(params)?;
        let prompt = self
            .registry
            .get_prompt(&params.name)
            .await
            .ok_or_else(|| McpError::PromptNotFound(params.name.clone()))?;

        let arguments: HashMap<String, Value> = params
            .arguments
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let result: GetPromptResult = prompt.get(arguments).await?;
        serde_json::to_value(result).map_err(McpError::from)
    }

    fn handle_logging_set_level(&self, session: &mut Session, params: Option<Value>) -> McpResult<Value> {
        let params: SetLoggingLevelParams = parse_params(params)?;
        session.log_level = params.level;
        serde_json::to_value(SetLoggingLevelResult { meta: None }).map_err(McpError::from)
    }

    fn handle_completion(&self, params: Option<Value>) -> McpResult<Value> {
        let params: CompleteParams = parse_params(params)?;
        // No completion provider is wired into the registry; echo back an
        // empty, well-formed result rather than fabricate candidates.
        let _ = match params.reference {
            CompletionReference::Prompt { name } => name,
            CompletionReference::Resource { uri } => uri,
            CompletionReference::Tool { name } => name,
        };
        let result = CompleteResult {
            completion: CompletionData { values: vec![], total: Some(0), has_more: Some(false) },
            meta: None,
        };
        serde_json::to_value(result).map_err(McpError::from)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let value = params.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    serde_json::from_value(value).map_err(|e| McpError::InvalidParams(format!("malformed params: {e}")))
}

/// Decode a base64 `offset=N` cursor. Invalid cursors decode to offset 0
/// and are logged at warning rather than rejected.
fn decode_cursor(cursor: Option<&str>) -> usize {
    let Some(cursor) = cursor else { return 0 };
    let decode = || -> Option<usize> {
        let bytes = BASE64.decode(cursor).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        text.strip_prefix("offset=")?.parse().ok()
    };
    match decode() {
        Some(offset) => offset,
        None => {
            warn!(cursor = %cursor, "invalid pagination cursor, defaulting to offset 0");
            0
        }
    }
}

fn encode_cursor(offset: usize) -> String {
    BASE64.encode(format!("offset={offset}"))
}

/// Slice `items` starting at the cursor's offset, honoring `limit`, and
/// produce the `nextCursor` for the following page if more remain.
fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, limit: usize) -> (Vec<T>, Option<String>) {
    let offset = decode_cursor(cursor);
    if offset >= items.len() {
        return (vec![], None);
    }
    let end = (offset + limit).min(items.len());
    let page = items[offset..end].to_vec();
    let next_cursor = if end < items.len() { Some(encode_cursor(end)) } else { None };
    (page, next_cursor)
}
