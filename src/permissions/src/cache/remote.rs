//! Shared cache over a remote key-value store

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use super::PermissionCache;
use crate::error::Result;

/// Default key namespace
pub const DEFAULT_PREFIX: &str = "perm:";

/// Minimal remote store operations needed by [`RemoteCache`]
///
/// Values are strings; keys passed in are already namespaced.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store with an expiry in whole seconds
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    async fn del(&self, key: &str) -> Result<()>;

    /// Keys matching a glob pattern (`*`, `?`, `[...]`, `\` escapes)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    async fn del_many(&self, keys: &[String]) -> Result<()>;
}

/// Permission cache backed by a [`RemoteStore`]
///
/// Keys are namespaced with a prefix and values stored as JSON. Store
/// failures are logged and treated as a miss (reads) or a no-op (writes).
pub struct RemoteCache<S> {
    store: S,
    prefix: String,
}

impl<S: RemoteStore> RemoteCache<S> {
    /// Create a cache using [`DEFAULT_PREFIX`]
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, DEFAULT_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn remove_matching(&self, pattern: &str) -> Result<usize> {
        let keys = self.store.keys(pattern).await?;
        if !keys.is_empty() {
            self.store.del_many(&keys).await?;
        }
        Ok(keys.len())
    }
}

#[async_trait]
impl<S: RemoteStore> PermissionCache for RemoteCache<S> {
    async fn get(&self, key: &str) -> Option<Value> {
        let raw = match self.store.get(&self.namespaced(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Remote cache read failed for '{}': {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache value for '{}': {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let raw = match serde_json::to_string(&value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache value for '{}': {}", key, e);
                return;
            }
        };

        // SETEX rejects a zero expiry
        let ttl_secs = ttl.as_secs().max(1);
        if let Err(e) = self.store.set_ex(&self.namespaced(key), &raw, ttl_secs).await {
            warn!("Remote cache write failed for '{}': {}", key, e);
        }
    }

    async fn delete(&self, key: &str) {
        if let Err(e) = self.store.del(&self.namespaced(key)).await {
            warn!("Remote cache delete failed for '{}': {}", key, e);
        }
    }

    async fn clear(&self) {
        let pattern = format!("{}*", escape_glob(&self.prefix));
        if let Err(e) = self.remove_matching(&pattern).await {
            warn!("Remote cache clear failed for prefix '{}': {}", self.prefix, e);
        }
    }

    async fn delete_prefix(&self, prefix: &str) {
        let pattern = format!("{}*", escape_glob(&self.namespaced(prefix)));
        if let Err(e) = self.remove_matching(&pattern).await {
            warn!("Remote cache prefix delete failed for '{}': {}", prefix, e);
        }
    }
}

/// Escapes glob metacharacters so `s` only matches itself
fn escape_glob(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
