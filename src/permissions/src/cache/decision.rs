//! Cache of permission data and check results
//!
//! Key layout (parts joined by [`super::cache_key`]):
//!
//! ```text
//! user_perms:{tenant}:{user}                     -> ["users.read", ...]
//! role_perms:{tenant}:{role}                     -> ["users.*", ...]
//! perm_check:{tenant}:{user}:{permission}:{scope} -> true | false
//! ```

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{cache_key, permission_check_prefix, PermissionCache, DEFAULT_TTL};
use crate::types::PermissionScope;

/// Caches user permissions, role permissions and check results on top of
/// any [`PermissionCache`]
#[derive(Clone)]
pub struct DecisionCache {
    cache: Arc<dyn PermissionCache>,

    /// Time-to-live for every entry written through this cache
    ttl: Duration,
}

impl DecisionCache {
    /// Create a decision cache with the default TTL (5 minutes)
    pub fn new(cache: Arc<dyn PermissionCache>) -> Self {
        Self::with_ttl(cache, DEFAULT_TTL)
    }

    pub fn with_ttl(cache: Arc<dyn PermissionCache>, ttl: Duration) -> Self {
        info!("Creating decision cache with ttl {:?}", ttl);
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Underlying cache
    pub fn inner(&self) -> &Arc<dyn PermissionCache> {
        &self.cache
    }

    pub async fn cache_user_permissions(&self, user_id: &str, tenant_id: &str, permissions: &[String]) {
        let key = cache_key(&["user_perms", tenant_id, user_id]);
        self.cache.set(&key, Value::from(permissions.to_vec()), self.ttl).await;
    }

    pub async fn cached_user_permissions(&self, user_id: &str, tenant_id: &str) -> Option<Vec<String>> {
        let key = cache_key(&["user_perms", tenant_id, user_id]);
        self.get_list(&key).await
    }

    pub async fn cache_role_permissions(&self, role_name: &str, tenant_id: &str, permissions: &[String]) {
        let key = cache_key(&["role_perms", tenant_id, role_name]);
        self.cache.set(&key, Value::from(permissions.to_vec()), self.ttl).await;
    }

    pub async fn cached_role_permissions(&self, role_name: &str, tenant_id: &str) -> Option<Vec<String>> {
        let key = cache_key(&["role_perms", tenant_id, role_name]);
        self.get_list(&key).await
    }

    /// Record whether `permission` was granted to the user
    pub async fn cache_permission_check(
        &self,
        user_id: &str,
        tenant_id: &str,
        permission: &str,
        scope: PermissionScope,
        granted: bool,
    ) {
        let key = cache_key(&["perm_check", tenant_id, user_id, permission, scope.as_str()]);
        self.cache.set(&key, Value::Bool(granted), self.ttl).await;
    }

    pub async fn cached_permission_check(
        &self,
        user_id: &str,
        tenant_id: &str,
        permission: &str,
        scope: PermissionScope,
    ) -> Option<bool> {
        let key = cache_key(&["perm_check", tenant_id, user_id, permission, scope.as_str()]);
        match self.cache.get(&key).await? {
            Value::Bool(granted) => Some(granted),
            other => {
                warn!("Ignoring non-boolean check result under '{}': {}", key, other);
                None
            }
        }
    }

    /// Drop a user's cached permissions and check results
    ///
    /// Call when the user's permissions or roles change.
    pub async fn invalidate_user(&self, user_id: &str, tenant_id: &str) {
        self.cache
            .delete(&cache_key(&["user_perms", tenant_id, user_id]))
            .await;
        self.cache
            .delete_prefix(&permission_check_prefix(user_id, tenant_id))
            .await;
        debug!("Invalidated cached permissions of user {} in tenant {}", user_id, tenant_id);
    }

    /// Drop a role's cached permissions
    pub async fn invalidate_role(&self, role_name: &str, tenant_id: &str) {
        self.cache
            .delete(&cache_key(&["role_perms", tenant_id, role_name]))
            .await;
        debug!("Invalidated cached permissions of role {} in tenant {}", role_name, tenant_id);
    }

    /// Clear everything in the underlying cache
    pub async fn invalidate_all(&self) {
        self.cache.clear().await;
        info!("Cleared permission cache");
    }

    async fn get_list(&self, key: &str) -> Option<Vec<String>> {
        let value = self.cache.get(key).await?;
        match serde_json::from_value(value) {
            Ok(list) => Some(list),
            Err(e) => {
                warn!("Ignoring malformed permission list under '{}': {}", key, e);
                None
            }
        }
    }
}
