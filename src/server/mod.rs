//! MCP server implementation
//!
//! This module provides the main server implementation for the Model Context Protocol:
//! the element registry (C3), session store (C4), subscription manager (C5),
//! dispatcher (C6), and protocol loop (C7), plus configuration (C13) and the
//! [`runtime::McpServer`] handle that wires them together for a host.

pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod formatter;
pub mod host;
pub mod protocol;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod subscription;

pub use runtime::McpServer;
