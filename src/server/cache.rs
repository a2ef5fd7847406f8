//! Pluggable cache backend for discovered-element and session persistence.
//!
//! The registry and session store both depend on this trait rather than
//! any concrete backend; the host wires in Redis, a KV store, or whatever
//! else it already runs. [`NullCache`] is the default for stdio-only
//! hosts that have no multi-process state to share: a no-op backend for
//! an otherwise-optional external collaborator.

use async_trait::async_trait;

use crate::core::error::McpResult;

/// Minimal async key/value cache contract. Values are opaque strings
/// (JSON-serialized by the caller); the backend is not expected to
/// understand their structure.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> McpResult<Option<String>>;

    /// Store `value` under `key`, overwriting any existing entry.
    async fn set(&self, key: &str, value: String) -> McpResult<()>;

    /// Remove the entry stored under `key`, if any.
    async fn delete(&self, key: &str) -> McpResult<()>;
}

/// No-op cache backend: every read misses, every write and delete succeed
/// silently. Used when a host has no shared cache to offer; registry
/// `save()`/`load()`/`clear()` and session persistence all degrade
/// gracefully to in-process-only state.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _key: &str) -> McpResult<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String) -> McpResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> McpResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_cache_always_misses() {
        let cache = NullCache;
        cache.set("k", "v".to_string()).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        cache.delete("k").await.unwrap();
    }
}
