//! Priority permission checks: global > tenant > deny
//!
//! A user's `global` permission entries are evaluated first. Only when none
//! grants is the user's tenant membership fetched (through the cache when
//! one is configured) and its permissions evaluated. Anything else is denied.
//!
//! The membership lookup is never invoked when a global entry grants.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{invalidate_permission_cache, membership_key, PermissionCache, DEFAULT_TTL};
use crate::error::Result;
use crate::permission::{matches_wildcard, normalize, validate, WILDCARD};
use crate::types::{PermissionCheckResult, PermissionScope, ScopedUser, TenantMembership};

/// Source of tenant memberships, usually a database
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    /// The membership of `user_id` in `tenant_id`, `None` if not a member
    async fn find_membership(&self, user_id: &str, tenant_id: &str) -> Result<Option<TenantMembership>>;
}

/// [`MembershipLookup`] backed by an async closure, see [`lookup_fn`]
pub struct FnLookup<F>(F);

/// Adapts an async closure into a [`MembershipLookup`]
///
/// ```
/// use tenantguard_permissions::{lookup_fn, PermissionError, TenantMembership};
///
/// let lookup = lookup_fn(|user_id: String, tenant_id: String| async move {
///     let membership = TenantMembership::new(user_id, tenant_id).with_permissions(["posts.read"]);
///     Ok::<_, PermissionError>(Some(membership))
/// });
/// # let _ = lookup;
/// ```
pub fn lookup_fn<F, Fut>(f: F) -> FnLookup<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<TenantMembership>>> + Send + 'static,
{
    FnLookup(f)
}

#[async_trait]
impl<F, Fut> MembershipLookup for FnLookup<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<TenantMembership>>> + Send + 'static,
{
    async fn find_membership(&self, user_id: &str, tenant_id: &str) -> Result<Option<TenantMembership>> {
        (self.0)(user_id.to_string(), tenant_id.to_string()).await
    }
}

/// Priority checker configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityConfig {
    /// Time-to-live of cached memberships
    pub membership_ttl: Duration,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            membership_ttl: DEFAULT_TTL,
        }
    }
}

/// Resolves permissions with global entries taking precedence over tenant
/// membership
///
/// ```
/// use tenantguard_permissions::{
///     lookup_fn, PermissionError, PriorityChecker, ScopedPermission, ScopedUser, TenantMembership,
/// };
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tenantguard_permissions::Result<()> {
/// let checker = PriorityChecker::new(lookup_fn(|_user: String, _tenant: String| async {
///     Ok::<Option<TenantMembership>, PermissionError>(None)
/// }));
/// let user = ScopedUser::new("user-1").with_entry(ScopedPermission::global("users.*"));
///
/// assert!(checker.has_permission(&user, "tenant-1", "users.delete").await?);
/// assert!(!checker.has_permission(&user, "tenant-1", "posts.read").await?);
/// # Ok(())
/// # }
/// ```
pub struct PriorityChecker {
    lookup: Arc<dyn MembershipLookup>,

    cache: Option<Arc<dyn PermissionCache>>,

    config: PriorityConfig,
}

impl PriorityChecker {
    /// Create a checker without a membership cache
    pub fn new<L: MembershipLookup + 'static>(lookup: L) -> Self {
        Self::from_arc(Arc::new(lookup))
    }

    /// Create a checker sharing an existing lookup
    pub fn from_arc(lookup: Arc<dyn MembershipLookup>) -> Self {
        Self {
            lookup,
            cache: None,
            config: PriorityConfig::default(),
        }
    }

    /// Cache memberships in `cache`
    pub fn with_cache(mut self, cache: Arc<dyn PermissionCache>) -> Self {
        info!("Priority checker using membership cache");
        self.cache = Some(cache);
        self
    }

    pub fn with_config(mut self, config: PriorityConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PriorityConfig {
        &self.config
    }

    /// Checks `permission` for `user` in `tenant_id`
    ///
    /// # Errors
    ///
    /// Returns [`crate::PermissionError::InvalidFormat`] for an invalid
    /// required permission. Lookup and cache failures never surface; they
    /// lead to a denial when nothing else grants.
    pub async fn check(
        &self,
        user: &ScopedUser,
        tenant_id: &str,
        permission: &str,
    ) -> Result<PermissionCheckResult> {
        let required = normalize(permission);
        validate(&required)?;

        if let Some(pattern) = global_grant(user, &required) {
            debug!("Granted '{}' to user {} via global '{}'", required, user.id, pattern);
            return Ok(PermissionCheckResult::grant(pattern).with_reason("Granted by global permission"));
        }

        if let Some(membership) = self.membership(&user.id, tenant_id).await {
            if let Some(pattern) = first_grant(&membership.permissions, &required) {
                debug!(
                    "Granted '{}' to user {} via tenant {} permission '{}'",
                    required, user.id, tenant_id, pattern
                );
                return Ok(PermissionCheckResult::grant(pattern).with_reason("Granted by tenant permission"));
            }
        }

        debug!("Denied '{}' for user {} in tenant {}", required, user.id, tenant_id);
        Ok(PermissionCheckResult::deny(format!(
            "User does not have permission: {}",
            permission
        )))
    }

    /// Boolean form of [`PriorityChecker::check`]
    pub async fn has_permission(&self, user: &ScopedUser, tenant_id: &str, permission: &str) -> Result<bool> {
        Ok(self.check(user, tenant_id, permission).await?.granted)
    }

    /// Drops the cached membership and check results of a user in a tenant
    ///
    /// Call whenever the membership or the user's direct permissions change.
    pub async fn invalidate(&self, user_id: &str, tenant_id: &str) {
        invalidate_permission_cache(self.cache.as_deref(), user_id, tenant_id).await;
    }

    /// Membership through the cache; failures and undecodable entries fall
    /// through to the lookup
    async fn membership(&self, user_id: &str, tenant_id: &str) -> Option<TenantMembership> {
        let key = membership_key(user_id, tenant_id);

        if let Some(cache) = &self.cache {
            if let Some(value) = cache.get(&key).await {
                match serde_json::from_value(value) {
                    Ok(membership) => return Some(membership),
                    Err(e) => warn!("Ignoring malformed cached membership '{}': {}", key, e),
                }
            }
        }

        let membership = match self.lookup.find_membership(user_id, tenant_id).await {
            Ok(membership) => membership?,
            Err(e) => {
                warn!("Membership lookup failed for user {} in tenant {}: {}", user_id, tenant_id, e);
                return None;
            }
        };

        if let Some(cache) = &self.cache {
            match serde_json::to_value(&membership) {
                Ok(value) => cache.set(&key, value, self.config.membership_ttl).await,
                Err(e) => warn!("Failed to encode membership for '{}': {}", key, e),
            }
        }

        Some(membership)
    }
}

/// First well-formed global entry granting `required`
fn global_grant(user: &ScopedUser, required: &str) -> Option<String> {
    user.entries_in(PermissionScope::Global)
        .map(|entry| normalize(&entry.name))
        .find(|pattern| grants(pattern, required))
}

fn first_grant(patterns: &[String], required: &str) -> Option<String> {
    patterns
        .iter()
        .map(|pattern| normalize(pattern))
        .find(|pattern| grants(pattern, required))
}

/// Bare wildcard, exact match or prefix wildcard
fn grants(pattern: &str, required: &str) -> bool {
    pattern == WILDCARD || pattern == required || matches_wildcard(required, pattern)
}
