//! Tool system for the MCP runtime.
//!
//! A [`Tool`] pairs a [`ToolHandler`] with a JSON Schema describing its input
//! and the compiled [`SchemaValidator`] used to enforce it. `ElementSource`
//! and registration bookkeeping live one layer up, in `server::registry` —
//! a `Tool` on its own knows nothing about how it was registered.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::core::error::{McpError, McpResult};
use crate::core::validation::SchemaValidator;
use crate::protocol::types::{ContentBlock, ToolInfo, ToolInputSchema, ToolResult};

/// Trait for implementing tool handlers
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given arguments
    async fn call(&self, arguments: HashMap<String, Value>) -> McpResult<ToolResult>;
}

/// A registered tool: its advertised info, its handler, and the schema
/// validator compiled from its input schema.
pub struct Tool {
    /// Information about the tool
    pub info: ToolInfo,
    /// Handler that implements the tool's functionality
    pub handler: Box<dyn ToolHandler>,
    /// Whether the tool is currently enabled
    pub enabled: bool,
    /// Compiled validator for the tool's input schema
    pub validator: Option<SchemaValidator>,
}

impl Tool {
    /// Create a new tool with the given information and handler.
    ///
    /// Returns a [`McpError::SchemaDefinitionError`] if `input_schema` does
    /// not compile.
    pub fn new<H>(
        name: String,
        description: Option<String>,
        input_schema: Value,
        handler: H,
    ) -> McpResult<Self>
    where
        H: ToolHandler + 'static,
    {
        let validator = if input_schema.is_object() {
            Some(SchemaValidator::new(input_schema.clone())?)
        } else {
            None
        };

        Ok(Self {
            info: ToolInfo {
                name,
                description,
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties: input_schema
                        .get("properties")
                        .and_then(|p| p.as_object())
                        .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
                    required: input_schema
                        .get("required")
                        .and_then(|r| r.as_array())
                        .map(|arr| {
                            arr.iter()
                                .filter_map(|v| v.as_str().map(String::from))
                                .collect()
                        }),
                    additional_properties: input_schema
                        .as_object()
                        .unwrap_or(&serde_json::Map::new())
                        .iter()
                        .filter(|(k, _)| !["type", "properties", "required"].contains(&k.as_str()))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                },
                output_schema: None,
                annotations: None,
                title: None,
                meta: None,
            },
            handler: Box::new(handler),
            enabled: true,
            validator,
        })
    }

    /// Enable the tool
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the tool
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Check if the tool is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Execute the tool if it's enabled, validating and coercing arguments first.
    pub async fn call(&self, mut arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        if !self.enabled {
            return Err(McpError::validation(format!(
                "Tool '{}' is disabled",
                self.info.name
            )));
        }

        if let Some(ref validator) = self.validator {
            validator.validate_and_coerce(&mut arguments)?;
        }

        self.handler.call(arguments).await
    }

    /// Execute the tool without validation (for specialized use cases).
    pub async fn call_unchecked(&self, arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        if !self.enabled {
            return Err(McpError::validation(format!(
                "Tool '{}' is disabled",
                self.info.name
            )));
        }

        self.handler.call(arguments).await
    }

    /// Validate parameters without executing the tool.
    pub fn validate_parameters(&self, arguments: &mut HashMap<String, Value>) -> McpResult<()> {
        if let Some(ref validator) = self.validator {
            validator.validate_and_coerce(arguments)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("info", &self.info)
            .field("enabled", &self.enabled)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Helper macro for creating tools with schema validation.
#[macro_export]
macro_rules! tool {
    ($name:expr_2021, $schema:expr_2021, $handler:expr_2021) => {
        $crate::core::tool::Tool::new($name.to_string(), None, $schema, $handler)
    };
    ($name:expr_2021, $description:expr_2021, $schema:expr_2021, $handler:expr_2021) => {
        $crate::core::tool::Tool::new(
            $name.to_string(),
            Some($description.to_string()),
            $schema,
            $handler,
        )
    };
}

// Common tool implementations

/// Simple echo tool for testing
pub struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        let message = arguments
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("Hello, World!");

        Ok(ToolResult {
            content: vec![ContentBlock::Text {
                text: message.to_string(),
                annotations: None,
                meta: None,
            }],
            is_error: None,
            structured_content: None,
            meta: None,
        })
    }
}

/// Tool for adding two numbers
pub struct AdditionTool;

#[async_trait]
impl ToolHandler for AdditionTool {
    async fn call(&self, arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        let a = arguments
            .get("a")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| McpError::validation("Missing or invalid 'a' parameter"))?;

        let b = arguments
            .get("b")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| McpError::validation("Missing or invalid 'b' parameter"))?;

        let result = a + b;

        Ok(ToolResult {
            content: vec![ContentBlock::Text {
                text: result.to_string(),
                annotations: None,
                meta: None,
            }],
            is_error: None,
            structured_content: None,
            meta: None,
        })
    }
}

/// Tool for getting current timestamp
pub struct TimestampTool;

#[async_trait]
impl ToolHandler for TimestampTool {
    async fn call(&self, _arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        use std::time::{SystemTime, UNIX_EPOCH};

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| McpError::internal(e.to_string()))?
            .as_secs();

        Ok(ToolResult {
            content: vec![ContentBlock::Text {
                text: timestamp.to_string(),
                annotations: None,
                meta: None,
            }],
            is_error: None,
            structured_content: None,
            meta: None,
        })
    }
}

/// Builder for creating tools with a fluent API.
pub struct ToolBuilder {
    name: String,
    description: Option<String>,
    input_schema: Option<Value>,
    title: Option<String>,
}

impl ToolBuilder {
    /// Create a new tool builder with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
            title: None,
        }
    }

    /// Set the tool description
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tool title (for UI display)
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the input schema
    pub fn schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Build the tool with the given handler.
    pub fn build<H>(self, handler: H) -> McpResult<Tool>
    where
        H: ToolHandler + 'static,
    {
        let schema = self.input_schema.unwrap_or_else(|| {
            serde_json::json!({
                "type": "object",
                "properties": {},
                "additionalProperties": true
            })
        });

        let mut tool = Tool::new(self.name, self.description, schema, handler)?;

        if let Some(title) = self.title {
            tool.info.title = Some(title);
        }

        Ok(tool)
    }
}

/// Tool wrapper that runs a custom validation function ahead of the tool's
/// own schema validation.
type ValidationFunction = Box<dyn Fn(&mut HashMap<String, Value>) -> McpResult<()> + Send + Sync>;

pub struct ValidationChainTool {
    tool: Tool,
    custom_validator: ValidationFunction,
}

#[async_trait]
impl ToolHandler for ValidationChainTool {
    async fn call(&self, mut arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        (self.custom_validator)(&mut arguments)?;
        self.tool.call(arguments).await
    }
}

/// Create a tool with a single required string parameter.
pub fn create_string_tool<H>(
    name: &str,
    description: &str,
    param_name: &str,
    param_description: &str,
    handler: H,
) -> McpResult<Tool>
where
    H: ToolHandler + 'static,
{
    use serde_json::json;

    let schema = json!({
        "type": "object",
        "properties": {
            param_name: {
                "type": "string",
                "description": param_description
            }
        },
        "required": [param_name]
    });

    Tool::new(
        name.to_string(),
        Some(description.to_string()),
        schema,
        handler,
    )
}

/// Create a tool with multiple typed parameters.
pub fn create_typed_tool<H>(
    name: &str,
    description: &str,
    parameters: Vec<(&str, &str, Value)>, // (name, description, schema)
    required: Vec<&str>,
    handler: H,
) -> McpResult<Tool>
where
    H: ToolHandler + 'static,
{
    use serde_json::{Map, json};

    let mut properties = Map::new();
    for (param_name, param_desc, param_schema) in parameters {
        let mut schema_with_desc = param_schema;
        if let Some(obj) = schema_with_desc.as_object_mut() {
            obj.insert("description".to_string(), json!(param_desc));
        }
        properties.insert(param_name.to_string(), schema_with_desc);
    }

    let schema = json!({
        "type": "object",
        "properties": properties,
        "required": required
    });

    Tool::new(
        name.to_string(),
        Some(description.to_string()),
        schema,
        handler,
    )
}

/// Calculator tool exercising enum/range validation.
pub struct CalculatorTool;

#[async_trait]
impl ToolHandler for CalculatorTool {
    async fn call(&self, arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        let operation = arguments
            .get("operation")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::validation("Missing 'operation' parameter"))?;

        let a = arguments
            .get("a")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| McpError::validation("Missing or invalid 'a' parameter"))?;

        let b = arguments
            .get("b")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| McpError::validation("Missing or invalid 'b' parameter"))?;

        let result = match operation {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Ok(ToolResult {
                        content: vec![ContentBlock::Text {
                            text: "Error: Division by zero".to_string(),
                            annotations: None,
                            meta: None,
                        }],
                        is_error: Some(true),
                        structured_content: Some(serde_json::json!({
                            "error": "division_by_zero",
                            "message": "Cannot divide by zero"
                        })),
                        meta: None,
                    });
                }
                a / b
            }
            _ => {
                return Err(McpError::validation(format!(
                    "Unsupported operation: {operation}"
                )));
            }
        };

        Ok(ToolResult {
            content: vec![ContentBlock::Text {
                text: result.to_string(),
                annotations: None,
                meta: None,
            }],
            is_error: None,
            structured_content: Some(serde_json::json!({
                "operation": operation,
                "operands": [a, b],
                "result": result
            })),
            meta: None,
        })
    }
}

impl CalculatorTool {
    /// JSON schema for this tool's parameters.
    pub fn parameter_schema() -> Value {
        crate::core::validation::create_tool_schema(
            vec![
                (
                    "operation",
                    serde_json::json!({"type": "string", "enum": ["add", "subtract", "multiply", "divide"]}),
                ),
                (
                    "a",
                    serde_json::json!({"type": "number", "minimum": -1_000_000, "maximum": 1_000_000}),
                ),
                (
                    "b",
                    serde_json::json!({"type": "number", "minimum": -1_000_000, "maximum": 1_000_000}),
                ),
            ],
            vec!["operation", "a", "b"],
        )
    }

    /// Build a [`Tool`] wrapping this handler with its own schema.
    pub fn create_tool(name: String, description: Option<String>) -> McpResult<Tool> {
        Tool::new(name, description, Self::parameter_schema(), CalculatorTool)
    }
}

/// Text processing tool with string validation.
pub struct TextProcessorTool;

#[async_trait]
impl ToolHandler for TextProcessorTool {
    async fn call(&self, arguments: HashMap<String, Value>) -> McpResult<ToolResult> {
        let text = arguments
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::validation("Missing 'text' parameter"))?;

        let operation = arguments
            .get("operation")
            .and_then(|v| v.as_str())
            .unwrap_or("uppercase");

        let result = match operation {
            "uppercase" => text.to_uppercase(),
            "lowercase" => text.to_lowercase(),
            "reverse" => text.chars().rev().collect(),
            "word_count" => text.split_whitespace().count().to_string(),
            "char_count" => text.len().to_string(),
            _ => {
                return Err(McpError::validation(format!(
                    "Unsupported operation: {operation}"
                )));
            }
        };

        Ok(ToolResult {
            content: vec![ContentBlock::Text {
                text: result.clone(),
                annotations: None,
                meta: None,
            }],
            is_error: None,
            structured_content: Some(serde_json::json!({
                "original_text": text,
                "operation": operation,
                "result": result,
                "length": text.len()
            })),
            meta: None,
        })
    }
}

impl TextProcessorTool {
    /// JSON schema for this tool's parameters.
    pub fn parameter_schema() -> Value {
        crate::core::validation::create_tool_schema(
            vec![
                ("text", serde_json::json!({"type": "string", "minLength": 1, "maxLength": 10000})),
                (
                    "operation",
                    serde_json::json!({"type": "string", "enum": ["uppercase", "lowercase", "reverse", "word_count", "char_count"]}),
                ),
            ],
            vec!["text"],
        )
    }

    /// Build a [`Tool`] wrapping this handler with its own schema.
    pub fn create_tool(name: String, description: Option<String>) -> McpResult<Tool> {
        Tool::new(
            name,
            description,
            Self::parameter_schema(),
            TextProcessorTool,
        )
    }
}

/// Extension trait for HashMap to make parameter extraction easier
pub trait ParameterExt {
    /// Extract a required string parameter
    fn get_string(&self, key: &str) -> McpResult<&str>;

    /// Extract an optional string parameter
    fn get_optional_string(&self, key: &str) -> Option<&str>;

    /// Extract a required number parameter
    fn get_number(&self, key: &str) -> McpResult<f64>;

    /// Extract an optional number parameter
    fn get_optional_number(&self, key: &str) -> Option<f64>;

    /// Extract a required integer parameter
    fn get_integer(&self, key: &str) -> McpResult<i64>;

    /// Extract an optional integer parameter
    fn get_optional_integer(&self, key: &str) -> Option<i64>;

    /// Extract a required boolean parameter
    fn get_boolean(&self, key: &str) -> McpResult<bool>;

    /// Extract an optional boolean parameter
    fn get_optional_boolean(&self, key: &str) -> Option<bool>;
}

impl ParameterExt for HashMap<String, Value> {
    fn get_string(&self, key: &str) -> McpResult<&str> {
        self.get(key).and_then(|v| v.as_str()).ok_or_else(|| {
            McpError::validation(format!("Missing or invalid string parameter: {key}"))
        })
    }

    fn get_optional_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    fn get_number(&self, key: &str) -> McpResult<f64> {
        self.get(key).and_then(|v| v.as_f64()).ok_or_else(|| {
            McpError::validation(format!("Missing or invalid number parameter: {key}"))
        })
    }

    fn get_optional_number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    fn get_integer(&self, key: &str) -> McpResult<i64> {
        self.get(key).and_then(|v| v.as_i64()).ok_or_else(|| {
            McpError::validation(format!("Missing or invalid integer parameter: {key}"))
        })
    }

    fn get_optional_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    fn get_boolean(&self, key: &str) -> McpResult<bool> {
        self.get(key).and_then(|v| v.as_bool()).ok_or_else(|| {
            McpError::validation(format!("Missing or invalid boolean parameter: {key}"))
        })
    }

    fn get_optional_boolean(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }
}
