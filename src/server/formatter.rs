//! Result formatting: turning arbitrary handler return values into the
//! MCP content-block shapes the wire protocol expects.
//!
//! Handlers may return scalars, maps, content blocks, or resource-shaped
//! objects; the [`ResultFormatter`] trait is the single seam that
//! normalizes all of that, keeping polymorphic conversion logic out of
//! the dispatcher itself.

use std::collections::HashMap;

use serde_json::Value;

use crate::core::error::McpResult;
use crate::protocol::types::{ContentBlock, PromptMessage, ResourceContents, Role};

/// Converts handler return values into the wire shapes the dispatcher sends.
pub trait ResultFormatter: Send + Sync {
    /// Format a tool handler's return value as content blocks.
    fn format_tool_result(&self, value: Value) -> McpResult<Vec<ContentBlock>>;

    /// Format a resource handler's return value as resource contents.
    fn format_resource_contents(
        &self,
        value: Value,
        uri: &str,
        mime_type: Option<&str>,
    ) -> McpResult<Vec<ResourceContents>>;

    /// Format a prompt handler's return value as prompt messages.
    fn format_prompt_messages(&self, value: Value) -> McpResult<Vec<PromptMessage>>;
}

/// Default formatter implementing the conversions spec.md enumerates.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl ResultFormatter for DefaultFormatter {
    fn format_tool_result(&self, value: Value) -> McpResult<Vec<ContentBlock>> {
        Ok(vec![value_to_content_block(value)])
    }

    fn format_resource_contents(
        &self,
        value: Value,
        uri: &str,
        mime_type: Option<&str>,
    ) -> McpResult<Vec<ResourceContents>> {
        // A structured `{text|blob, mimeType?}` object is used directly.
        if let Value::Object(ref obj) = value {
            if let Some(text) = obj.get("text").and_then(Value::as_str) {
                let mime = obj
                    .get("mimeType")
                    .and_then(Value::as_str)
                    .or(mime_type)
                    .map(str::to_string);
                return Ok(vec![ResourceContents::Text {
                    uri: uri.to_string(),
                    mime_type: mime,
                    text: text.to_string(),
                    meta: None,
                }]);
            }
            if let Some(blob) = obj.get("blob").and_then(Value::as_str) {
                let mime = obj
                    .get("mimeType")
                    .and_then(Value::as_str)
                    .or(mime_type)
                    .map(str::to_string);
                return Ok(vec![ResourceContents::Blob {
                    uri: uri.to_string(),
                    mime_type: mime,
                    blob: blob.to_string(),
                    meta: None,
                }]);
            }
        }

        // A plain string becomes text content with the inferred/declared MIME type.
        if let Value::String(text) = value {
            return Ok(vec![ResourceContents::Text {
                uri: uri.to_string(),
                mime_type: mime_type
                    .map(str::to_string)
                    .or_else(|| crate::utils::guess_mime_type(uri)),
                text,
                meta: None,
            }]);
        }

        // Anything else is serialized to JSON text.
        Ok(vec![ResourceContents::Text {
            uri: uri.to_string(),
            mime_type: mime_type.map(str::to_string).or(Some("application/json".to_string())),
            text: serde_json::to_string_pretty(&value).unwrap_or_default(),
            meta: None,
        }])
    }

    fn format_prompt_messages(&self, value: Value) -> McpResult<Vec<PromptMessage>> {
        // A list of `{role, content}` entries maps straight onto `PromptMessage`.
        if let Value::Array(items) = &value {
            let mut messages = Vec::with_capacity(items.len());
            for item in items {
                messages.push(value_to_prompt_message(item)?);
            }
            return Ok(messages);
        }

        // Shorthand `{user?, assistant?}` object.
        if let Value::Object(ref obj) = value {
            if obj.contains_key("user") || obj.contains_key("assistant") {
                let mut messages = Vec::new();
                if let Some(user) = obj.get("user") {
                    messages.push(PromptMessage {
                        role: Role::User,
                        content: value_to_content_block(user.clone()),
                    });
                }
                if let Some(assistant) = obj.get("assistant") {
                    messages.push(PromptMessage {
                        role: Role::Assistant,
                        content: value_to_content_block(assistant.clone()),
                    });
                }
                return Ok(messages);
            }
            if obj.contains_key("role") {
                return Ok(vec![value_to_prompt_message(&value)?]);
            }
        }

        // Bare scalar: treat it as a single user message.
        Ok(vec![PromptMessage {
            role: Role::User,
            content: value_to_content_block(value),
        }])
    }
}

fn value_to_prompt_message(item: &Value) -> McpResult<PromptMessage> {
    let role = match item.get("role").and_then(Value::as_str) {
        Some("assistant") => Role::Assistant,
        _ => Role::User,
    };
    let content = item
        .get("content")
        .cloned()
        .unwrap_or(Value::Null);
    Ok(PromptMessage {
        role,
        content: value_to_content_block(content),
    })
}

/// Normalize a scalar/collection/object value, or an already-shaped content
/// block, into a single [`ContentBlock`].
fn value_to_content_block(value: Value) -> ContentBlock {
    // Already a content block (has a recognized `type` discriminant).
    if let Value::Object(ref obj) = value {
        if let Some(kind) = obj.get("type").and_then(Value::as_str) {
            if matches!(kind, "text" | "image" | "audio" | "resource" | "resource_link") {
                if let Ok(block) = serde_json::from_value::<ContentBlock>(value.clone()) {
                    return block;
                }
            }
        }
    }

    let text = match value {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_default(),
    };

    ContentBlock::Text {
        text,
        annotations: None,
        meta: None,
    }
}

/// Coerce raw tool-call arguments onto a handler's declared parameter names,
/// filling in any declared default for a missing optional parameter.
///
/// `defaults` maps parameter name to its declared default value.
pub fn coerce_named_arguments(
    mut arguments: HashMap<String, Value>,
    defaults: &HashMap<String, Value>,
) -> HashMap<String, Value> {
    for (name, default) in defaults {
        arguments.entry(name.clone()).or_insert_with(|| default.clone());
    }
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_string_becomes_text_block() {
        let blocks = DefaultFormatter.format_tool_result(json!("hello")).unwrap();
        assert_eq!(
            blocks[0],
            ContentBlock::Text { text: "hello".to_string(), annotations: None, meta: None }
        );
    }

    #[test]
    fn object_becomes_json_text_block() {
        let blocks = DefaultFormatter
            .format_tool_result(json!({"a": 1, "b": 2}))
            .unwrap();
        match &blocks[0] {
            ContentBlock::Text { text, .. } => assert!(text.contains('1') && text.contains('2')),
            other => panic!("expected text block, got {other:?}"),
        }
    }

    #[test]
    fn already_shaped_content_block_passes_through() {
        let blocks = DefaultFormatter
            .format_tool_result(json!({"type": "text", "text": "verbatim"}))
            .unwrap();
        assert_eq!(
            blocks[0],
            ContentBlock::Text { text: "verbatim".to_string(), annotations: None, meta: None }
        );
    }

    #[test]
    fn resource_string_gets_inferred_mime_type() {
        let contents = DefaultFormatter
            .format_resource_contents(json!("plain text"), "file:///a.txt", None)
            .unwrap();
        match &contents[0] {
            ResourceContents::Text { mime_type, text, .. } => {
                assert_eq!(mime_type.as_deref(), Some("text/plain"));
                assert_eq!(text, "plain text");
            }
            other => panic!("expected text contents, got {other:?}"),
        }
    }

    #[test]
    fn resource_structured_blob_passes_through() {
        let contents = DefaultFormatter
            .format_resource_contents(
                json!({"blob": "QQ==", "mimeType": "application/octet-stream"}),
                "file:///a.bin",
                None,
            )
            .unwrap();
        assert!(matches!(contents[0], ResourceContents::Blob { .. }));
    }

    #[test]
    fn prompt_shorthand_user_assistant() {
        let messages = DefaultFormatter
            .format_prompt_messages(json!({"user": "hi", "assistant": "hello"}))
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn prompt_list_of_entries() {
        let messages = DefaultFormatter
            .format_prompt_messages(json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]))
            .unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn coerce_named_arguments_fills_missing_defaults() {
        let mut args = HashMap::new();
        args.insert("a".to_string(), json!(1));
        let mut defaults = HashMap::new();
        defaults.insert("b".to_string(), json!(2));
        let merged = coerce_named_arguments(args, &defaults);
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(2)));
    }
}
