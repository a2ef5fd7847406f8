//! Element registry (C3): tools, resources, resource templates, and
//! prompts, each bound to a handler and distinguished as manually
//! registered or discovered.
//!
//! Composes [`core::tool::Tool`], [`core::resource::Resource`], and
//! [`core::prompt::Prompt`] behind one façade that adds what none of them
//! had on their own: manual-over-discovered registration precedence,
//! per-kind change notification, and cache-backed persistence of the
//! discovered subset.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::core::error::{McpError, McpResult};
use crate::core::prompt::{Prompt, PromptHandler};
use crate::core::resource::{Resource, ResourceHandler, ResourceTemplate};
use crate::core::tool::{Tool, ToolHandler};
use crate::protocol::types::{PromptInfo, ResourceInfo, ToolInfo};
use crate::server::cache::CacheBackend;
use crate::server::formatter::ResultFormatter;
use crate::server::host::{
    Container, ContainerBackedPromptHandler, ContainerBackedResourceHandler,
    ContainerBackedToolHandler, HandlerRef,
};
use crate::utils::UriTemplate;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static identifier pattern is valid"));

const CACHE_KEY: &str = "mcp:registry:discovered";

/// Whether an element was registered directly by the host at build time,
/// or loaded from a discovery manifest. Manual registrations always win
/// on identifier conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementSource {
    Manual,
    Discovered,
}

/// The four element kinds the registry tracks, used for `list_changed`
/// routing. `ResourceTemplate` never emits — spec.md explicitly excludes
/// it from the notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Tool,
    Resource,
    ResourceTemplate,
    Prompt,
}

struct Entry<T> {
    value: Arc<T>,
    source: ElementSource,
    registered_at: DateTime<Utc>,
    /// Present only for discovered entries; lets `save()` serialize
    /// `{metadata, handlerRef}` without needing to downcast the boxed
    /// handler trait object.
    handler_ref: Option<HandlerRef>,
}

impl<T> Entry<T> {
    fn manual(value: T) -> Self {
        Self {
            value: Arc::new(value),
            source: ElementSource::Manual,
            registered_at: now(),
            handler_ref: None,
        }
    }

    fn discovered(value: T, handler_ref: HandlerRef) -> Self {
        Self {
            value: Arc::new(value),
            source: ElementSource::Discovered,
            registered_at: now(),
            handler_ref: Some(handler_ref),
        }
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn validate_identifier(kind: &str, identifier: &str) -> McpResult<()> {
    if !IDENTIFIER_PATTERN.is_match(identifier) {
        return Err(McpError::DefinitionError(format!(
            "{kind} identifier '{identifier}' must match ^[A-Za-z0-9_-]+$"
        )));
    }
    Ok(())
}

fn list_hash<I: Iterator<Item = String>>(identifiers: I) -> u64 {
    let mut sorted: Vec<String> = identifiers.collect();
    sorted.sort();
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for id in sorted {
        id.hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Default, Serialize, Deserialize)]
struct CachedSnapshot {
    tools: Vec<(ToolInfo, HandlerRef)>,
    resources: Vec<(ResourceInfo, HandlerRef)>,
    resource_templates: Vec<(ResourceTemplateWire, HandlerRef)>,
    prompts: Vec<(PromptInfo, HandlerRef)>,
}

/// Serializable projection of `core::resource::ResourceTemplate`.
#[derive(Clone, Serialize, Deserialize)]
struct ResourceTemplateWire {
    uri_template: String,
    name: String,
    description: Option<String>,
    mime_type: Option<String>,
}

impl From<&ResourceTemplate> for ResourceTemplateWire {
    fn from(t: &ResourceTemplate) -> Self {
        Self {
            uri_template: t.uri_template.clone(),
            name: t.name.clone(),
            description: t.description.clone(),
            mime_type: t.mime_type.clone(),
        }
    }
}

impl From<ResourceTemplateWire> for ResourceTemplate {
    fn from(w: ResourceTemplateWire) -> Self {
        Self {
            uri_template: w.uri_template,
            name: w.name,
            description: w.description,
            mime_type: w.mime_type,
        }
    }
}

/// The element registry. Cheap to clone (internals are `Arc`-shared);
/// typically held once by the protocol loop and handed to the dispatcher.
pub struct Registry {
    tools: RwLock<HashMap<String, Entry<Tool>>>,
    resources: RwLock<HashMap<String, Entry<Resource>>>,
    templates: RwLock<HashMap<String, (Entry<Resource>, UriTemplate)>>,
    prompts: RwLock<HashMap<String, Entry<Prompt>>>,
    list_hashes: RwLock<HashMap<ElementKind, u64>>,
    changes: broadcast::Sender<ElementKind>,
    cache: Arc<dyn CacheBackend>,
    container: Option<Arc<dyn Container>>,
    formatter: Arc<dyn ResultFormatter>,
}

impl Registry {
    /// Build a registry with the given cache backend and default formatter.
    /// `container` is only required if discovered elements will be loaded.
    pub fn new(cache: Arc<dyn CacheBackend>, formatter: Arc<dyn ResultFormatter>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            tools: RwLock::new(HashMap::new()),
            resources: RwLock::new(HashMap::new()),
            templates: RwLock::new(HashMap::new()),
            prompts: RwLock::new(HashMap::new()),
            list_hashes: RwLock::new(HashMap::new()),
            changes,
            cache,
            container: None,
            formatter,
        }
    }

    /// Attach the host [`Container`] used to resolve discovered elements.
    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    /// Subscribe to `list_changed(kind)` events emitted on registry mutation.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ElementKind> {
        self.changes.subscribe()
    }

    async fn emit_if_changed(&self, kind: ElementKind, new_hash: u64) {
        let mut hashes = self.list_hashes.write().await;
        let changed = hashes.get(&kind) != Some(&new_hash);
        hashes.insert(kind, new_hash);
        drop(hashes);
        if changed && kind != ElementKind::ResourceTemplate {
            let _ = self.changes.send(kind);
        }
    }

    // ---- Tools ----------------------------------------------------------

    /// Register a tool with an inline handler (always manual).
    pub async fn register_tool<H>(
        &self,
        name: String,
        description: Option<String>,
        input_schema: serde_json::Value,
        handler: H,
    ) -> McpResult<()>
    where
        H: ToolHandler + 'static,
    {
        validate_identifier("Tool", &name)?;
        let tool = Tool::new(name.clone(), description, input_schema, handler)?;
        self.insert_tool(name, Entry::manual(tool)).await
    }

    /// Register a tool resolved through the host [`Container`] at call time.
    pub async fn register_discovered_tool(
        &self,
        metadata: ToolInfo,
        handler_ref: HandlerRef,
    ) -> McpResult<()> {
        validate_identifier("Tool", &metadata.name)?;
        let container = self.container.clone().ok_or_else(|| {
            McpError::internal("registry has no Container configured for discovered tools")
        })?;
        let name = metadata.name.clone();
        let schema = serde_json::json!({
            "type": "object",
            "properties": metadata.input_schema.properties.clone().unwrap_or_default(),
            "required": metadata.input_schema.required.clone().unwrap_or_default(),
        });
        let handler = ContainerBackedToolHandler {
            container,
            handler_ref: handler_ref.clone(),
            formatter: self.formatter.clone(),
        };
        let mut tool = Tool::new(name.clone(), metadata.description.clone(), schema, handler)?;
        tool.info = metadata;
        self.insert_tool(name, Entry::discovered(tool, handler_ref)).await
    }

    async fn insert_tool(&self, name: String, entry: Entry<Tool>) -> McpResult<()> {
        let hash = {
            let mut tools = self.tools.write().await;
            if let Some(existing) = tools.get(&name) {
                if existing.source == ElementSource::Manual && entry.source == ElementSource::Discovered {
                    debug!(tool = %name, "dropping discovered tool: manual registration wins");
                    return Ok(());
                }
                warn!(tool = %name, "replacing previously registered tool");
            }
            tools.insert(name.clone(), entry);
            list_hash(tools.keys().cloned())
        };
        self.emit_if_changed(ElementKind::Tool, hash).await;
        Ok(())
    }

    /// Look up a tool by name.
    pub async fn get_tool(&self, name: &str) -> Option<Arc<Tool>> {
        self.tools.read().await.get(name).map(|e| e.value.clone())
    }

    /// All registered tools' advertised info, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolInfo> {
        let tools = self.tools.read().await;
        let mut infos: Vec<ToolInfo> = tools.values().map(|e| e.value.info.clone()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    // ---- Resources --------------------------------------------------------

    /// Register a static resource (exact URI, no template variables).
    pub async fn register_resource<H>(&self, info: ResourceInfo, handler: H) -> McpResult<()>
    where
        H: ResourceHandler + 'static,
    {
        if info.uri.contains('{') {
            return Err(McpError::DefinitionError(format!(
                "resource uri '{}' contains a template variable; register it as a ResourceTemplate",
                info.uri
            )));
        }
        crate::utils::validate_uri(&info.uri)?;
        let uri = info.uri.clone();
        let resource = Resource::new(info, handler);
        self.insert_resource(uri, Entry::manual(resource)).await
    }

    /// Register a resource resolved through the host [`Container`].
    pub async fn register_discovered_resource(
        &self,
        metadata: ResourceInfo,
        handler_ref: HandlerRef,
    ) -> McpResult<()> {
        if metadata.uri.contains('{') {
            return Err(McpError::DefinitionError(format!(
                "resource uri '{}' contains a template variable; register it as a ResourceTemplate",
                metadata.uri
            )));
        }
        let container = self.container.clone().ok_or_else(|| {
            McpError::internal("registry has no Container configured for discovered resources")
        })?;
        let uri = metadata.uri.clone();
        let handler = ContainerBackedResourceHandler {
            container,
            handler_ref: handler_ref.clone(),
            formatter: self.formatter.clone(),
            mime_type: metadata.mime_type.clone(),
        };
        let resource = Resource::new(metadata, handler);
        self.insert_resource(uri, Entry::discovered(resource, handler_ref)).await
    }

    async fn insert_resource(&self, uri: String, entry: Entry<Resource>) -> McpResult<()> {
        let hash = {
            let mut resources = self.resources.write().await;
            if let Some(existing) = resources.get(&uri) {
                if existing.source == ElementSource::Manual && entry.source == ElementSource::Discovered {
                    debug!(resource = %uri, "dropping discovered resource: manual registration wins");
                    return Ok(());
                }
                warn!(resource = %uri, "replacing previously registered resource");
            }
            resources.insert(uri.clone(), entry);
            list_hash(resources.keys().cloned())
        };
        self.emit_if_changed(ElementKind::Resource, hash).await;
        Ok(())
    }

    /// Register a resource template with an inline handler.
    pub async fn register_resource_template<H>(
        &self,
        template: ResourceTemplate,
        handler: H,
    ) -> McpResult<()>
    where
        H: ResourceHandler + 'static,
    {
        let compiled = UriTemplate::compile(&template.uri_template)?;
        let key = template.uri_template.clone();
        let resource = Resource::with_template(template, handler);
        self.insert_template(key, Entry::manual(resource), compiled).await
    }

    /// Register a resource template resolved through the host [`Container`].
    pub async fn register_discovered_resource_template(
        &self,
        template: ResourceTemplate,
        handler_ref: HandlerRef,
    ) -> McpResult<()> {
        let compiled = UriTemplate::compile(&template.uri_template)?;
        let container = self.container.clone().ok_or_else(|| {
            McpError::internal("registry has no Container configured for discovered templates")
        })?;
        let key = template.uri_template.clone();
        let handler = ContainerBackedResourceHandler {
            container,
            handler_ref: handler_ref.clone(),
            formatter: self.formatter.clone(),
            mime_type: template.mime_type.clone(),
        };
        let resource = Resource::with_template(template, handler);
        self.insert_template(key, Entry::discovered(resource, handler_ref), compiled).await
    }

    async fn insert_template(
        &self,
        key: String,
        entry: Entry<Resource>,
        compiled: UriTemplate,
    ) -> McpResult<()> {
        let mut templates = self.templates.write().await;
        if let Some((existing, _)) = templates.get(&key) {
            if existing.source == ElementSource::Manual && entry.source == ElementSource::Discovered {
                debug!(template = %key, "dropping discovered template: manual registration wins");
                return Ok(());
            }
            warn!(template = %key, "replacing previously registered resource template");
        }
        templates.insert(key, (entry, compiled));
        // Resource templates never emit list_changed.
        Ok(())
    }

    /// Look up a resource by exact URI, falling back to template matching
    /// (returning the extracted variable bindings) when `include_templates`.
    pub async fn get_resource(
        &self,
        uri: &str,
        include_templates: bool,
    ) -> Option<(Arc<Resource>, HashMap<String, String>)> {
        if let Some(entry) = self.resources.read().await.get(uri) {
            return Some((entry.value.clone(), HashMap::new()));
        }
        if !include_templates {
            return None;
        }
        let templates = self.templates.read().await;
        for (entry, matcher) in templates.values() {
            if let Some(bindings) = matcher.matches(uri) {
                return Some((entry.value.clone(), bindings));
            }
        }
        None
    }

    /// All registered static resources' advertised info, sorted by URI.
    pub async fn list_resources(&self) -> Vec<ResourceInfo> {
        let resources = self.resources.read().await;
        let mut infos: Vec<ResourceInfo> = resources.values().map(|e| e.value.info.clone()).collect();
        infos.sort_by(|a, b| a.uri.cmp(&b.uri));
        infos
    }

    /// All registered resource templates, sorted by template string.
    pub async fn list_resource_templates(&self) -> Vec<crate::protocol::types::ResourceTemplate> {
        let templates = self.templates.read().await;
        let mut infos: Vec<crate::protocol::types::ResourceTemplate> = templates
            .values()
            .filter_map(|(entry, _)| entry.value.template.as_ref())
            .map(|t| crate::protocol::types::ResourceTemplate {
                uri_template: t.uri_template.clone(),
                name: t.name.clone(),
                description: t.description.clone(),
                mime_type: t.mime_type.clone(),
                annotations: None,
                title: None,
                meta: None,
            })
            .collect();
        infos.sort_by(|a, b| a.uri_template.cmp(&b.uri_template));
        infos
    }

    // ---- Prompts ------------------------------------------------------

    /// Register a prompt with an inline handler (always manual).
    pub async fn register_prompt<H>(&self, info: PromptInfo, handler: H) -> McpResult<()>
    where
        H: PromptHandler + 'static,
    {
        validate_identifier("Prompt", &info.name)?;
        let name = info.name.clone();
        let prompt = Prompt::new(info, handler);
        self.insert_prompt(name, Entry::manual(prompt)).await
    }

    /// Register a prompt resolved through the host [`Container`].
    pub async fn register_discovered_prompt(
        &self,
        metadata: PromptInfo,
        handler_ref: HandlerRef,
    ) -> McpResult<()> {
        validate_identifier("Prompt", &metadata.name)?;
        let container = self.container.clone().ok_or_else(|| {
            McpError::internal("registry has no Container configured for discovered prompts")
        })?;
        let name = metadata.name.clone();
        let handler = ContainerBackedPromptHandler {
            container,
            handler_ref: handler_ref.clone(),
            formatter: self.formatter.clone(),
        };
        let prompt = Prompt::new(metadata, handler);
        self.insert_prompt(name, Entry::discovered(prompt, handler_ref)).await
    }

    async fn insert_prompt(&self, name: String, entry: Entry<Prompt>) -> McpResult<()> {
        let hash = {
            let mut prompts = self.prompts.write().await;
            if let Some(existing) = prompts.get(&name) {
                if existing.source == ElementSource::Manual && entry.source == ElementSource::Discovered {
                    debug!(prompt = %name, "dropping discovered prompt: manual registration wins");
                    return Ok(());
                }
                warn!(prompt = %name, "replacing previously registered prompt");
            }
            prompts.insert(name.clone(), entry);
            list_hash(prompts.keys().cloned())
        };
        self.emit_if_changed(ElementKind::Prompt, hash).await;
        Ok(())
    }

    /// Look up a prompt by name.
    pub async fn get_prompt(&self, name: &str) -> Option<Arc<Prompt>> {
        self.prompts.read().await.get(name).map(|e| e.value.clone())
    }

    /// All registered prompts' advertised info, sorted by name.
    pub async fn list_prompts(&self) -> Vec<PromptInfo> {
        let prompts = self.prompts.read().await;
        let mut infos: Vec<PromptInfo> = prompts.values().map(|e| e.value.info.clone()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    // ---- Persistence ----------------------------------------------------

    /// Persist the discovered subset of every kind to the cache under a
    /// fixed key.
    pub async fn save(&self) -> McpResult<()> {
        let snapshot = CachedSnapshot {
            tools: self
                .tools
                .read()
                .await
                .values()
                .filter_map(|e| e.handler_ref.clone().map(|r| (e.value.info.clone(), r)))
                .collect(),
            resources: self
                .resources
                .read()
                .await
                .values()
                .filter_map(|e| e.handler_ref.clone().map(|r| (e.value.info.clone(), r)))
                .collect(),
            resource_templates: self
                .templates
                .read()
                .await
                .values()
                .filter_map(|(e, _)| {
                    let handler_ref = e.handler_ref.clone()?;
                    let template = e.value.template.as_ref()?;
                    Some((ResourceTemplateWire::from(template), handler_ref))
                })
                .collect(),
            prompts: self
                .prompts
                .read()
                .await
                .values()
                .filter_map(|e| e.handler_ref.clone().map(|r| (e.value.info.clone(), r)))
                .collect(),
        };

        let serialized = serde_json::to_string(&snapshot).map_err(McpError::from)?;
        self.cache.set(CACHE_KEY, serialized).await
    }

    /// Load the discovered snapshot from the cache, skipping any identifier
    /// already registered manually. Malformed payloads are logged and
    /// ignored rather than propagated.
    pub async fn load(&self) -> McpResult<()> {
        let Some(raw) = self.cache.get(CACHE_KEY).await? else {
            return Ok(());
        };

        let snapshot: CachedSnapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "discarding malformed registry cache payload");
                return Ok(());
            }
        };

        for (metadata, handler_ref) in snapshot.tools {
            if self.tools.read().await.contains_key(&metadata.name) {
                continue;
            }
            if let Err(e) = self.register_discovered_tool(metadata, handler_ref).await {
                warn!(error = %e, "failed to rehydrate discovered tool");
            }
        }
        for (metadata, handler_ref) in snapshot.resources {
            if self.resources.read().await.contains_key(&metadata.uri) {
                continue;
            }
            if let Err(e) = self.register_discovered_resource(metadata, handler_ref).await {
                warn!(error = %e, "failed to rehydrate discovered resource");
            }
        }
        for (wire, handler_ref) in snapshot.resource_templates {
            let template: ResourceTemplate = wire.into();
            if self.templates.read().await.contains_key(&template.uri_template) {
                continue;
            }
            if let Err(e) = self
                .register_discovered_resource_template(template, handler_ref)
                .await
            {
                warn!(error = %e, "failed to rehydrate discovered resource template");
            }
        }
        for (metadata, handler_ref) in snapshot.prompts {
            if self.prompts.read().await.contains_key(&metadata.name) {
                continue;
            }
            if let Err(e) = self.register_discovered_prompt(metadata, handler_ref).await {
                warn!(error = %e, "failed to rehydrate discovered prompt");
            }
        }

        Ok(())
    }

    /// Remove every discovered entry from memory and from the cache.
    /// Manual entries are untouched.
    pub async fn clear(&self) -> McpResult<()> {
        self.tools.write().await.retain(|_, e| e.source == ElementSource::Manual);
        self.resources.write().await.retain(|_, e| e.source == ElementSource::Manual);
        self.templates.write().await.retain(|_, (e, _)| e.source == ElementSource::Manual);
        self.prompts.write().await.retain(|_, e| e.source == ElementSource::Manual);
        self.cache.delete(CACHE_KEY).await
    }
}
