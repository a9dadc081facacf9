//! Permission aggregation over role inheritance
//!
//! Cycle avoidance: every recursive call receives its own copy of the set of
//! role ids already on the path. A role seen again contributes nothing, so
//! aggregation terminates on any graph. Permissions reachable only through a
//! revisited node are dropped; run [`super::validate_inheritance`] to find
//! such catalogs.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::catalog::RoleCatalog;
use crate::permission::normalize;
use crate::types::Role;

/// Normalized permissions of `role` plus everything its active parents grant
pub fn aggregate(role: &Role, catalog: &RoleCatalog) -> BTreeSet<String> {
    aggregate_with_visited(role, catalog, &HashSet::new())
}

fn aggregate_with_visited<'a>(
    role: &'a Role,
    catalog: &'a RoleCatalog,
    visited: &HashSet<&'a str>,
) -> BTreeSet<String> {
    if visited.contains(role.id.as_str()) {
        debug!("Role '{}' already on inheritance path, skipping", role.name);
        return BTreeSet::new();
    }

    let mut visited = visited.clone();
    visited.insert(role.id.as_str());

    let mut permissions: BTreeSet<String> =
        role.permissions.iter().map(|p| normalize(p)).collect();

    for parent_ref in role.parents() {
        match catalog.resolve(parent_ref) {
            Some(parent) if parent.is_active => {
                permissions.extend(aggregate_with_visited(parent, catalog, &visited));
            }
            Some(parent) => {
                debug!("Skipping inactive parent role '{}' of '{}'", parent.name, role.name);
            }
            None => {
                debug!("Parent role '{}' of '{}' not in catalog", parent_ref, role.name);
            }
        }
    }

    permissions
}

/// Union of the aggregated permissions of every named role
///
/// Unknown and inactive roles are skipped.
pub fn aggregate_from_names<S: AsRef<str>>(role_names: &[S], catalog: &RoleCatalog) -> BTreeSet<String> {
    role_names
        .iter()
        .filter_map(|name| catalog.resolve_active(name.as_ref()))
        .flat_map(|role| aggregate(role, catalog))
        .collect()
}

/// Whether an active role grants `permission` exactly (inheritance included)
pub fn role_has_permission(role_name: &str, permission: &str, catalog: &RoleCatalog) -> bool {
    catalog
        .resolve_active(role_name)
        .map(|role| aggregate(role, catalog).contains(&normalize(permission)))
        .unwrap_or(false)
}

/// Sorted permissions a user holding `role_names` ends up with
pub fn effective_role_permissions<S: AsRef<str>>(role_names: &[S], catalog: &RoleCatalog) -> Vec<String> {
    aggregate_from_names(role_names, catalog).into_iter().collect()
}
