//! Error types for the MCP runtime
//!
//! Module defines all error types that can occur within the MCP runtime,
//! providing structured error handling with detailed context.

use thiserror::Error;

/// A single structured validation failure, addressed by JSON pointer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value (e.g. `/a/0/name`)
    pub pointer: String,
    /// The schema keyword that failed (e.g. `required`, `type`)
    pub keyword: String,
    /// Human-readable description of the failure
    pub message: String,
}

/// The main error type for the MCP runtime
#[derive(Error, Debug, Clone)]
pub enum McpError {
    /// Transport-related errors (connection, I/O, framing)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level errors (invalid messages, unexpected responses)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid URI format or content
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Requested tool was not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Requested resource was not found
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Requested prompt was not found
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// Method not found (JSON-RPC error); also used to mask disabled capabilities
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters (JSON-RPC error)
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Invalid parameters with structured, JSON-pointer-addressed validation issues
    #[error("Invalid parameters: {} validation error(s)", .0.len())]
    ValidationFailed(Vec<ValidationIssue>),

    /// A tool/resource/prompt/template was registered with malformed data
    /// (bad name pattern, template without a variable, etc). Surfaced
    /// synchronously to the host; never a JSON-RPC error.
    #[error("Definition error: {0}")]
    DefinitionError(String),

    /// A JSON Schema attached to a tool was not itself well-formed
    #[error("Schema definition error: {0}")]
    SchemaDefinitionError(String),

    /// Connection-related errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Input validation errors (free-form, used internally by coercion helpers)
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors from the standard library
    #[error("I/O error: {0}")]
    Io(String),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Cancellation errors
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Internal errors that shouldn't normally occur
    #[error("Internal error: {0}")]
    Internal(String),
}

// Manual From implementations for types that don't implement Clone
impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<url::ParseError> for McpError {
    fn from(err: url::ParseError) -> Self {
        McpError::Url(err.to_string())
    }
}

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new IO error from std::io::Error
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }

    /// Create a new serialization error from serde_json::Error
    pub fn serialization(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Maps this error onto the JSON-RPC error code the wire protocol expects.
    ///
    /// `MethodNotFound` deliberately also covers the capability-gate and
    /// initialization-gate cases (the spec requires the server not disclose
    /// whether a gated method merely exists).
    pub fn json_rpc_code(&self) -> i32 {
        use crate::protocol::types::error_codes;
        match self {
            McpError::Serialization(_) => error_codes::PARSE_ERROR,
            McpError::Protocol(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) => error_codes::METHOD_NOT_FOUND,
            McpError::InvalidParams(_)
            | McpError::ValidationFailed(_)
            | McpError::Validation(_)
            | McpError::ToolNotFound(_)
            | McpError::ResourceNotFound(_)
            | McpError::PromptNotFound(_) => error_codes::INVALID_PARAMS,
            _ => error_codes::INTERNAL_ERROR,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            McpError::Connection(_) | McpError::Timeout(_) | McpError::Io(_)
        )
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            McpError::Transport(_) => "transport",
            McpError::Protocol(_) => "protocol",
            McpError::Connection(_) => "connection",
            McpError::Timeout(_) => "timeout",
            McpError::Validation(_) | McpError::ValidationFailed(_) => "validation",
            McpError::ToolNotFound(_) => "not_found",
            McpError::ResourceNotFound(_) => "not_found",
            McpError::PromptNotFound(_) => "not_found",
            McpError::MethodNotFound(_) => "not_found",
            McpError::InvalidParams(_) => "validation",
            McpError::DefinitionError(_) => "definition",
            McpError::SchemaDefinitionError(_) => "definition",
            McpError::Serialization(_) => "serialization",
            McpError::InvalidUri(_) => "validation",
            McpError::Io(_) => "io",
            McpError::Url(_) => "validation",
            McpError::Cancelled(_) => "cancelled",
            McpError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = McpError::transport("Connection failed");
        assert_eq!(error.to_string(), "Transport error: Connection failed");
        assert_eq!(error.category(), "transport");
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_error_recovery() {
        assert!(McpError::connection("timeout").is_recoverable());
        assert!(!McpError::validation("invalid input").is_recoverable());
        assert!(McpError::timeout("request timeout").is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(McpError::protocol("bad message").category(), "protocol");
        assert_eq!(
            McpError::ToolNotFound("missing".to_string()).category(),
            "not_found"
        );
        assert_eq!(
            McpError::DefinitionError("bad name".to_string()).category(),
            "definition"
        );
    }

    #[test]
    fn test_json_rpc_code_mapping() {
        use crate::protocol::types::error_codes;
        assert_eq!(
            McpError::MethodNotFound("tools/list".into()).json_rpc_code(),
            error_codes::METHOD_NOT_FOUND
        );
        assert_eq!(
            McpError::ValidationFailed(vec![]).json_rpc_code(),
            error_codes::INVALID_PARAMS
        );
        assert_eq!(
            McpError::Internal("boom".into()).json_rpc_code(),
            error_codes::INTERNAL_ERROR
        );
    }
}
