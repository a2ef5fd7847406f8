//! JSON Schema validation for tool, resource and prompt parameters.
//!
//! Schemas are compiled once (at registration time) into a [`SchemaValidator`],
//! which turns `jsonschema`'s validation errors into JSON-pointer-addressed
//! [`ValidationIssue`]s. A lightweight coercion pass runs ahead of strict
//! validation so that loosely-typed client input (stringly-typed numbers,
//! `"true"`/`"false"` strings for booleans) can still satisfy a strict schema,
//! mirroring how CLI argument parsers are usually more forgiving than their
//! underlying data model.

use crate::core::error::{McpError, McpResult, ValidationIssue};
use jsonschema::Validator;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Coercion configuration applied before schema validation.
#[derive(Debug, Clone)]
pub struct CoercionConfig {
    /// Attempt to coerce values to the type declared by the schema
    /// (e.g. string `"5"` -> number `5`) before validating.
    pub coerce_types: bool,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self { coerce_types: true }
    }
}

/// A compiled JSON Schema, ready to validate instances against.
///
/// Compilation happens once, at registration time, so a malformed schema is
/// reported synchronously as [`McpError::SchemaDefinitionError`] rather than
/// surfacing as a confusing validation failure on the first call.
pub struct SchemaValidator {
    schema: Value,
    compiled: Validator,
    coercion: CoercionConfig,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema)
            .field("coercion", &self.coercion)
            .finish()
    }
}

impl Clone for SchemaValidator {
    fn clone(&self) -> Self {
        // Recompiling is infallible here since `self.schema` already compiled once.
        Self::compile(self.schema.clone(), self.coercion.clone())
            .expect("previously-compiled schema failed to recompile")
    }
}

impl SchemaValidator {
    /// Compile a schema, failing synchronously if it is not well-formed.
    pub fn compile(schema: Value, coercion: CoercionConfig) -> McpResult<Self> {
        let compiled = jsonschema::validator_for(&schema)
            .map_err(|e| McpError::SchemaDefinitionError(e.to_string()))?;

        Ok(Self {
            schema,
            compiled,
            coercion,
        })
    }

    /// Compile with default coercion settings.
    pub fn new(schema: Value) -> McpResult<Self> {
        Self::compile(schema, CoercionConfig::default())
    }

    /// The raw schema this validator was compiled from.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Run the coercion pre-pass, then validate strictly, returning a
    /// [`McpError::ValidationFailed`] carrying every failure found.
    pub fn validate_and_coerce(&self, params: &mut HashMap<String, Value>) -> McpResult<()> {
        if self.coercion.coerce_types {
            coerce_against_schema(params, &self.schema);
        }

        let instance = Value::Object(Map::from_iter(params.clone()));
        self.validate(&instance)
    }

    /// Validate an instance without coercion, returning structured issues.
    pub fn validate(&self, instance: &Value) -> McpResult<()> {
        let issues: Vec<ValidationIssue> = self
            .compiled
            .iter_errors(instance)
            .map(|err| ValidationIssue {
                pointer: err.instance_path.to_string(),
                keyword: keyword_of(&err),
                message: err.to_string(),
            })
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(McpError::ValidationFailed(issues))
        }
    }

    /// `true` if the instance satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.compiled.is_valid(instance)
    }
}

/// `jsonschema::ValidationError` doesn't expose a parsed keyword directly;
/// the schema-path tail (its last segment) is the keyword that failed.
fn keyword_of(err: &jsonschema::ValidationError<'_>) -> String {
    err.schema_path
        .to_string()
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("schema")
        .to_string()
}

/// Best-effort coercion of top-level object properties toward the type
/// declared by an object schema's `properties`. Coercion failures are
/// silently skipped; the value is left as-is and strict validation reports
/// the real error.
fn coerce_against_schema(params: &mut HashMap<String, Value>, schema: &Value) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };

    for (name, value) in params.iter_mut() {
        let Some(prop_schema) = properties.get(name) else {
            continue;
        };
        let Some(expected_type) = prop_schema.get("type").and_then(Value::as_str) else {
            continue;
        };

        match expected_type {
            "string" => {
                if !value.is_string() {
                    if let Some(coerced) = coerce_to_string(value) {
                        *value = coerced;
                    }
                }
            }
            "number" | "integer" => {
                if !value.is_number() {
                    if let Some(coerced) = coerce_to_number(value) {
                        *value = coerced;
                    }
                }
                if expected_type == "integer" {
                    if let Some(f) = value.as_f64() {
                        if f.fract() == 0.0 {
                            *value = Value::Number(serde_json::Number::from(f as i64));
                        }
                    }
                }
            }
            "boolean" => {
                if !value.is_boolean() {
                    if let Some(coerced) = coerce_to_boolean(value) {
                        *value = coerced;
                    }
                }
            }
            _ => {}
        }
    }
}

fn coerce_to_string(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn coerce_to_number(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => s.parse::<f64>().ok().and_then(|f| {
            if f.fract() == 0.0 {
                Some(Value::Number(serde_json::Number::from(f as i64)))
            } else {
                serde_json::Number::from_f64(f).map(Value::Number)
            }
        }),
        Value::Bool(true) => Some(Value::Number(serde_json::Number::from(1))),
        Value::Bool(false) => Some(Value::Number(serde_json::Number::from(0))),
        _ => None,
    }
}

fn coerce_to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
            "false" | "0" | "no" | "off" | "" => Some(Value::Bool(false)),
            _ => None,
        },
        Value::Number(n) => Some(Value::Bool(n.as_f64().unwrap_or(0.0) != 0.0)),
        _ => None,
    }
}

/// Helper trait for pulling a typed value out of a raw parameter map,
/// for host code that wants a native type instead of a `serde_json::Value`.
pub trait ParameterType {
    /// JSON schema fragment describing this type, for building tool schemas.
    fn to_schema() -> Value;

    /// Extract and validate a single named parameter.
    fn from_params(params: &HashMap<String, Value>, name: &str) -> McpResult<Self>
    where
        Self: Sized;
}

impl ParameterType for String {
    fn to_schema() -> Value {
        serde_json::json!({"type": "string"})
    }

    fn from_params(params: &HashMap<String, Value>, name: &str) -> McpResult<Self> {
        params
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| McpError::validation(format!("Missing string parameter: {name}")))
    }
}

impl ParameterType for i64 {
    fn to_schema() -> Value {
        serde_json::json!({"type": "integer"})
    }

    fn from_params(params: &HashMap<String, Value>, name: &str) -> McpResult<Self> {
        params
            .get(name)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| McpError::validation(format!("Missing integer parameter: {name}")))
    }
}

impl ParameterType for f64 {
    fn to_schema() -> Value {
        serde_json::json!({"type": "number"})
    }

    fn from_params(params: &HashMap<String, Value>, name: &str) -> McpResult<Self> {
        params
            .get(name)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| McpError::validation(format!("Missing number parameter: {name}")))
    }
}

impl ParameterType for bool {
    fn to_schema() -> Value {
        serde_json::json!({"type": "boolean"})
    }

    fn from_params(params: &HashMap<String, Value>, name: &str) -> McpResult<Self> {
        params
            .get(name)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| McpError::validation(format!("Missing boolean parameter: {name}")))
    }
}

/// Build an object schema from a list of `(name, schema)` pairs and required names.
pub fn create_tool_schema(params: Vec<(&str, Value)>, required: Vec<&str>) -> Value {
    let mut properties = Map::new();
    for (name, schema) in params {
        properties.insert(name.to_string(), schema);
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}
