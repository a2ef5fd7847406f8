// Copyright (c) 2025 MCP Rust Contributors
// SPDX-License-Identifier: MIT

//! # mcp-runtime
//!
//! A host-embeddable runtime for the [Model Context Protocol (MCP)](https://modelcontextprotocol.io/),
//! supporting both the `2024-11-05` and `2025-03-26` protocol revisions.
//!
//! ## Features
//!
//! - **Schema-validated tools**: tool parameters are compiled to a JSON Schema
//!   validator at registration time and checked (with best-effort coercion) on
//!   every call.
//! - **Manual + discovered registries**: tools, resources, and prompts can be
//!   registered directly or supplied by a host-side discovery source, with
//!   manual registrations always taking precedence.
//! - **Pluggable transports**: STDIO (newline-delimited JSON-RPC) and
//!   HTTP+SSE, gated behind the `stdio` and `http` features.
//! - **Structured logging**: built on `tracing`, with error categorization
//!   and contextual spans.
//!
//! ## Quick Start
//!
//! The easiest way to get started is with the prelude module:
//!
//! ```rust
//! use mcp_runtime::prelude::*;
//! ```
//!
//! This imports the most commonly used types and traits.
//!
//! ## Module Organization
//!
//! - [`core`]: Core abstractions for tools, resources, prompts, validation, and errors
//! - [`protocol`]: MCP protocol types, message definitions, and codec
//! - [`server`]: Registry, session store, subscription manager, and dispatch loop
//! - [`transport`]: Transport layer implementations (STDIO, HTTP+SSE)
//! - [`utils`]: Utility functions and helpers

pub mod core;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::error::{McpError, McpResult};
pub use protocol::types::*;

/// Prelude module for convenient imports
///
/// Module re-exports the most commonly used types and traits for easy access.
/// Use `use mcp_runtime::prelude::*;` to import everything you need.
pub mod prelude {
    // Core types and traits
    pub use crate::core::{
        error::{McpError, McpResult},
        prompt::{Prompt, PromptHandler},
        resource::{Resource, ResourceHandler},
        tool::{Tool, ToolHandler},
        validation::SchemaValidator,
    };

    // Protocol types and messages
    pub use crate::protocol::messages::*;
    pub use crate::protocol::missing_types::*;
    pub use crate::protocol::types::*;

    // Completion handlers
    pub use crate::core::completion::{
        CompletionHandler, CompositeCompletionHandler, PromptCompletionHandler,
        ResourceUriCompletionHandler, ToolCompletionHandler,
    };

    // Server
    pub use crate::server::protocol::{MessageSink, Protocol};
    pub use crate::server::config::{RuntimeConfig, ServerBuilder};
    pub use crate::server::McpServer;

    // Transport layer implementations
    #[cfg(feature = "stdio")]
    pub use crate::transport::StdioTransport;

    #[cfg(feature = "http")]
    pub use crate::transport::HttpTransport;

    // Essential external types
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
    pub use std::collections::HashMap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Basic smoke test to ensure all modules are accessible
        let _error = McpError::Protocol("test".to_string());
    }
}