//! Role hierarchy module
//!
//! Provides the role catalog, permission aggregation over role inheritance,
//! inheritance validation and hierarchy traversal.
//!
//! # Features
//!
//! - **Arena catalog**: roles resolved by id or name through one index map
//! - **Cycle-safe aggregation**: copy-on-recurse visited sets, always terminates
//! - **Cycle reporting**: separate validation pass with the offending path
//! - **Traversal**: transitive children/parents and a display tree
//!
//! # Example
//!
//! ```rust
//! use tenantguard_permissions::hierarchy::{aggregate, validate_inheritance, RoleCatalog};
//! use tenantguard_permissions::Role;
//!
//! let catalog = RoleCatalog::new(vec![
//!     Role::new("r-admin", "admin").with_permissions(["users.*"]).inherits_from(["viewer"]),
//!     Role::new("r-viewer", "viewer").with_permissions(["users.read"]),
//! ]);
//!
//! let admin = catalog.resolve("admin").unwrap();
//! let permissions = aggregate(admin, &catalog);
//! assert!(permissions.contains("users.read"));
//! assert!(validate_inheritance(admin, &catalog).valid);
//! ```

mod aggregate;
mod catalog;
mod graph;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, aggregate_from_names, effective_role_permissions, role_has_permission};
pub use catalog::RoleCatalog;
pub use graph::{
    build_hierarchy, children_of, parents_of, render_hierarchy, validate_catalog,
    validate_inheritance, InheritanceError, InheritanceValidation, RoleNode,
};
