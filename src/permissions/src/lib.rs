//! # Tenantguard Permission Engine
//!
//! Dot-notation permission checks for multi-tenant services.
//!
//! ## Features
//!
//! - **Permission grammar**: `[app.]module.action` strings with a trailing `.*` wildcard
//! - **Role inheritance**: cycle-safe aggregation over a role catalog
//! - **Decision resolver**: direct + role permissions with `tenant`/`global`/`own` scopes
//! - **Priority checks**: global entries win over tenant membership, default deny
//! - **Two-tier caching**: in-process TTL cache and an optional Redis-backed store
//!
//! ## Example
//!
//! ```rust
//! use tenantguard_permissions::{checker, PermissionScope, Role, RoleCatalog, UserPermissionContext};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = RoleCatalog::new(vec![
//!     Role::new("r-viewer", "viewer").with_permissions(["users.read"]),
//!     Role::new("r-admin", "admin")
//!         .with_permissions(["users.*"])
//!         .inherits_from(["viewer"]),
//! ]);
//!
//! let context = UserPermissionContext::new("user-1", "tenant-1").with_roles(["admin"]);
//! let result = checker::check(&context, "users.delete", PermissionScope::Tenant, Some(&catalog))?;
//!
//! assert!(result.granted);
//! assert_eq!(result.matched_permission.as_deref(), Some("users.*"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checker;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod permission;
pub mod priority;
pub mod types;

// Re-export commonly used types
pub use cache::{DecisionCache, MemoryCache, PermissionCache, RemoteCache, RemoteStore};
pub use config::{CacheBackend, CacheConfig, EngineConfig};
pub use error::{FormatError, PermissionError, Result};
pub use hierarchy::{InheritanceError, InheritanceValidation, RoleCatalog, RoleNode};
pub use permission::ParsedPermission;
pub use priority::{lookup_fn, MembershipLookup, PriorityChecker, PriorityConfig};
pub use types::{
    PermissionCheckResult, PermissionEntry, PermissionScope, Role, ScopedPermission, ScopedUser,
    TenantMembership, UserPermissionContext,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
