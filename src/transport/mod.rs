//! Transport layer implementations
//!
//! This module provides concrete implementations of the transport traits
//! for the communication protocols the runtime supports: STDIO and HTTP+SSE.

pub mod traits;

#[cfg(feature = "stdio")]
pub mod stdio;

#[cfg(feature = "http")]
pub mod http;

// Re-export commonly used types
pub use traits::{
    ConnectionState, EventEmittingTransport, FilterableTransport, ReconnectConfig,
    ReconnectableTransport, ServerTransport, Transport, TransportConfig, TransportEvent,
    TransportStats,
};

// Re-export transport implementations when features are enabled
#[cfg(feature = "stdio")]
pub use stdio::{StdioClientTransport, StdioTransport, STDIO_SESSION_ID};

#[cfg(feature = "http")]
pub use http::{HttpTransport, Middleware, RequestLogging};
