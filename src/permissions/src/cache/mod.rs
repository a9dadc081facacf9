//! Permission caching
//!
//! Two tiers sit behind one trait:
//!
//! - [`MemoryCache`]: in-process TTL cache on a `DashMap`
//! - [`RemoteCache`]: prefix-namespaced JSON values in a shared [`RemoteStore`]
//!   (Redis via [`RedisStore`] with the `redis` feature)
//!
//! Caches never fail their callers. A broken backend behaves like an empty
//! cache and the failure is logged.

mod decision;
mod memory;
#[cfg(feature = "redis")]
mod redis;
mod remote;

pub use decision::DecisionCache;
pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use remote::{RemoteCache, RemoteStore, DEFAULT_PREFIX};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default time-to-live for cached permission data
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Keys longer than this are replaced by their digest
pub const MAX_KEY_LEN: usize = 100;

/// Key-value cache with per-entry TTL
///
/// Every operation is infallible from the caller's point of view.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Cached value, `None` on miss or expiry
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value for `ttl`
    async fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Remove a key if present
    async fn delete(&self, key: &str);

    /// Remove every entry
    async fn clear(&self);

    /// Remove every key starting with `prefix`
    async fn delete_prefix(&self, prefix: &str);
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`, zero before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Builds a cache key from its parts
///
/// Parts are joined with `:`. A key longer than [`MAX_KEY_LEN`] is replaced
/// by the hex BLAKE3 digest of the joined string (64 characters).
pub fn cache_key<S: AsRef<str>>(parts: &[S]) -> String {
    let combined = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(":");

    if combined.len() > MAX_KEY_LEN {
        blake3::hash(combined.as_bytes()).to_hex().to_string()
    } else {
        combined
    }
}

/// Key of a cached tenant membership
pub fn membership_key(user_id: &str, tenant_id: &str) -> String {
    format!("tenant_user:{}:{}", user_id, tenant_id)
}

/// Prefix shared by every cached check result of a user in a tenant
pub(crate) fn permission_check_prefix(user_id: &str, tenant_id: &str) -> String {
    format!("perm_check:{}:{}:", tenant_id, user_id)
}

/// Drops the cached membership and check results of a user in a tenant
///
/// Call after a user's tenant permissions change. Without a cache this is a
/// no-op. Check results stored under a digest key (see [`cache_key`]) are not
/// matched by the prefix and age out with their TTL.
pub async fn invalidate_permission_cache(
    cache: Option<&dyn PermissionCache>,
    user_id: &str,
    tenant_id: &str,
) {
    let Some(cache) = cache else {
        debug!("No cache configured, nothing to invalidate for user {}", user_id);
        return;
    };

    cache.delete(&membership_key(user_id, tenant_id)).await;
    cache
        .delete_prefix(&permission_check_prefix(user_id, tenant_id))
        .await;

    debug!("Invalidated permission cache for user {} in tenant {}", user_id, tenant_id);
}
