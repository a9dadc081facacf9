//! Permission decision resolver
//!
//! Combines a user's direct permissions with the permissions aggregated
//! from their roles and resolves a required permission against them:
//!
//! ```text
//! required ─► normalize/validate ─► own-scope gate ─► exact match ─► wildcard match ─► deny
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::Result;
use crate::hierarchy::{aggregate_from_names, RoleCatalog};
use crate::permission::{matches_wildcard, normalize, validate, WILDCARD_SUFFIX};
use crate::types::{PermissionCheckResult, PermissionScope, UserPermissionContext};

/// Normalized direct permissions plus role-derived ones (when a catalog is given)
fn candidate_permissions(
    context: &UserPermissionContext,
    roles: Option<&RoleCatalog>,
) -> BTreeSet<String> {
    let mut candidates: BTreeSet<String> =
        context.permissions.iter().map(|p| normalize(p)).collect();

    if let Some(catalog) = roles {
        candidates.extend(aggregate_from_names(&context.roles, catalog));
    }

    candidates
}

/// `own` scope requires the user to own the resource
fn check_ownership(context: &UserPermissionContext, scope: PermissionScope) -> Option<PermissionCheckResult> {
    if scope != PermissionScope::Own {
        return None;
    }

    match context.resource_owner_id.as_deref() {
        None => Some(PermissionCheckResult::deny(
            "Resource owner information not provided for \"own\" scope check",
        )),
        Some(owner) if owner != context.user_id => Some(PermissionCheckResult::deny(
            "User is not the owner of this resource",
        )),
        Some(_) => None,
    }
}

fn resolve(
    context: &UserPermissionContext,
    candidates: &BTreeSet<String>,
    required_permission: &str,
    scope: PermissionScope,
) -> Result<PermissionCheckResult> {
    let normalized = normalize(required_permission);
    validate(&normalized)?;

    if let Some(denied) = check_ownership(context, scope) {
        debug!(
            "Denied '{}' for user {} on ownership: {:?}",
            normalized, context.user_id, denied.reason
        );
        return Ok(denied);
    }

    if candidates.contains(&normalized) {
        debug!("Granted '{}' to user {} by exact match", normalized, context.user_id);
        return Ok(PermissionCheckResult::grant(normalized));
    }

    if let Some(pattern) = candidates
        .iter()
        .filter(|candidate| candidate.ends_with(WILDCARD_SUFFIX))
        .find(|candidate| matches_wildcard(&normalized, candidate))
    {
        debug!("Granted '{}' to user {} via '{}'", normalized, context.user_id, pattern);
        return Ok(PermissionCheckResult::grant(pattern.clone()));
    }

    debug!("Denied '{}' for user {}", normalized, context.user_id);
    Ok(PermissionCheckResult::deny(format!(
        "User does not have permission: {}",
        required_permission
    )))
}

/// Checks whether the user holds `required_permission`
///
/// # Arguments
///
/// * `context` - The user's permission context
/// * `required_permission` - Permission to check; normalized before matching
/// * `scope` - `Own` additionally requires the user to own the resource
/// * `roles` - Role catalog; when absent only direct permissions count
///
/// # Errors
///
/// Returns [`crate::PermissionError::InvalidFormat`] if the required
/// permission is not a valid dot-notation permission. A missing permission
/// is a denied result, never an error.
pub fn check(
    context: &UserPermissionContext,
    required_permission: &str,
    scope: PermissionScope,
    roles: Option<&RoleCatalog>,
) -> Result<PermissionCheckResult> {
    let candidates = candidate_permissions(context, roles);
    resolve(context, &candidates, required_permission, scope)
}

/// Grants on the first required permission the user holds
///
/// An empty list is denied.
pub fn check_any<S: AsRef<str>>(
    context: &UserPermissionContext,
    required_permissions: &[S],
    scope: PermissionScope,
    roles: Option<&RoleCatalog>,
) -> Result<PermissionCheckResult> {
    if required_permissions.is_empty() {
        return Ok(PermissionCheckResult::deny("No permissions specified"));
    }

    let candidates = candidate_permissions(context, roles);
    for permission in required_permissions {
        let result = resolve(context, &candidates, permission.as_ref(), scope)?;
        if result.granted {
            return Ok(result);
        }
    }

    Ok(PermissionCheckResult::deny(format!(
        "User does not have any of the required permissions: {}",
        join(required_permissions)
    )))
}

/// Grants only if the user holds every required permission
///
/// An empty list is granted. The denial reason lists every missing
/// permission.
pub fn check_all<S: AsRef<str>>(
    context: &UserPermissionContext,
    required_permissions: &[S],
    scope: PermissionScope,
    roles: Option<&RoleCatalog>,
) -> Result<PermissionCheckResult> {
    if required_permissions.is_empty() {
        return Ok(PermissionCheckResult {
            granted: true,
            reason: Some("No permissions required".to_string()),
            matched_permission: None,
        });
    }

    let candidates = candidate_permissions(context, roles);
    let mut missing = Vec::new();
    for permission in required_permissions {
        if !resolve(context, &candidates, permission.as_ref(), scope)?.granted {
            missing.push(permission.as_ref());
        }
    }

    if !missing.is_empty() {
        return Ok(PermissionCheckResult::deny(format!(
            "User is missing permissions: {}",
            missing.join(", ")
        )));
    }

    Ok(PermissionCheckResult::grant(join(required_permissions)))
}

/// Checks `resource.action`
pub fn can_perform(
    context: &UserPermissionContext,
    resource: &str,
    action: &str,
    scope: PermissionScope,
    roles: Option<&RoleCatalog>,
) -> Result<PermissionCheckResult> {
    check(context, &format!("{}.{}", resource, action), scope, roles)
}

/// Every permission the user holds, normalized, deduplicated and sorted
///
/// For display and audit; access decisions go through [`check`].
pub fn effective_permissions(
    context: &UserPermissionContext,
    roles: Option<&RoleCatalog>,
) -> Vec<String> {
    candidate_permissions(context, roles).into_iter().collect()
}

fn join<S: AsRef<str>>(permissions: &[S]) -> String {
    permissions
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}
