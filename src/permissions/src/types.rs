//! Core permission types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Context in which a permission applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    /// Permission is valid inside the current tenant
    #[default]
    Tenant,
    /// Permission is valid across every tenant
    Global,
    /// Permission is valid only on resources the user owns
    Own,
}

impl PermissionScope {
    /// Lowercase name, as used in cache keys and serialized entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Global => "global",
            Self::Own => "own",
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role definition with permissions and inheritance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier
    pub id: String,

    /// Role name (e.g., "admin", "viewer")
    pub name: String,

    /// Human-readable name
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Permissions granted directly by this role
    #[serde(default)]
    pub permissions: BTreeSet<String>,

    /// Parent roles, referenced by id or name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<Vec<String>>,

    /// Inactive roles are ignored by aggregation
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Tenant owning this role, if tenant-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Role {
    /// Create an active role with no permissions and no parents
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            display_name: name.clone(),
            name,
            description: String::new(),
            permissions: BTreeSet::new(),
            inherits_from: None,
            is_active: true,
            tenant_id: None,
        }
    }

    /// Add directly granted permissions
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Set the parent role references
    pub fn inherits_from<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherits_from = Some(parents.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Mark the role inactive
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Parent references, empty when the role inherits nothing
    pub fn parents(&self) -> &[String] {
        self.inherits_from.as_deref().unwrap_or(&[])
    }

    /// Whether `role_ref` names this role by id or name
    pub fn is_referenced_by(&self, role_ref: &str) -> bool {
        self.id == role_ref || self.name == role_ref
    }
}

/// Per-request user context for permission checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionContext {
    pub user_id: String,

    pub tenant_id: String,

    /// Role names or ids held by the user
    #[serde(default)]
    pub roles: Vec<String>,

    /// Directly granted permissions
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Owner of the resource being accessed (for `own` scope checks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_owner_id: Option<String>,
}

impl UserPermissionContext {
    /// Create a context with no roles and no permissions
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_resource_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.resource_owner_id = Some(owner_id.into());
        self
    }
}

/// Permission entry with scope, e.g. `{"name": "users.*", "scope": "global"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedPermission {
    pub name: String,

    #[serde(default)]
    pub scope: PermissionScope,
}

impl ScopedPermission {
    pub fn new(name: impl Into<String>, scope: PermissionScope) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::new(name, PermissionScope::Global)
    }

    pub fn tenant(name: impl Into<String>) -> Self {
        Self::new(name, PermissionScope::Tenant)
    }
}

/// Permission entry as stored on a user record
///
/// Records are loosely shaped; anything that does not deserialize into a
/// [`ScopedPermission`] lands in `Malformed` and is skipped by every check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionEntry {
    Scoped(ScopedPermission),
    Malformed(serde_json::Value),
}

impl PermissionEntry {
    /// The well-formed entry, if any
    pub fn as_scoped(&self) -> Option<&ScopedPermission> {
        match self {
            Self::Scoped(permission) => Some(permission),
            Self::Malformed(_) => None,
        }
    }
}

impl From<ScopedPermission> for PermissionEntry {
    fn from(permission: ScopedPermission) -> Self {
        Self::Scoped(permission)
    }
}

/// User identity with scoped permission entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopedUser {
    pub id: String,

    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

impl ScopedUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permissions: Vec::new(),
        }
    }

    /// Add an entry (well-formed or not)
    pub fn with_entry(mut self, entry: impl Into<PermissionEntry>) -> Self {
        self.permissions.push(entry.into());
        self
    }

    /// Well-formed entries with the given scope
    pub fn entries_in(&self, scope: PermissionScope) -> impl Iterator<Item = &ScopedPermission> {
        self.permissions
            .iter()
            .filter_map(PermissionEntry::as_scoped)
            .filter(move |permission| permission.scope == scope)
    }
}

/// A user's membership in a tenant, owned by an external store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub user_id: String,

    pub tenant_id: String,

    /// Tenant-specific permissions
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Tenant-specific roles
    #[serde(default)]
    pub roles: Vec<String>,
}

impl TenantMembership {
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a permission check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCheckResult {
    /// Whether access is granted
    pub granted: bool,

    /// Human-readable reason, for audit and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Permission that granted access
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_permission: Option<String>,
}

impl PermissionCheckResult {
    /// Grant, recording the permission that matched
    pub fn grant(matched_permission: impl Into<String>) -> Self {
        Self {
            granted: true,
            reason: None,
            matched_permission: Some(matched_permission.into()),
        }
    }

    /// Deny with a reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            granted: false,
            reason: Some(reason.into()),
            matched_permission: None,
        }
    }

    /// Attach a reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
