//! Inheritance graph traversal
//!
//! This module walks the role inheritance graph to:
//! 1. Detect and report circular inheritance and dangling parent references
//! 2. Collect the transitive children or parents of a role
//! 3. Build a display tree of the catalog

use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;
use tracing::warn;

use super::catalog::RoleCatalog;
use crate::types::Role;

/// Inheritance problems found by [`validate_inheritance`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InheritanceError {
    /// A role is reachable from itself
    #[error("Circular role inheritance detected: {}", .path.join(" -> "))]
    CircularInheritance { path: Vec<String> },

    /// A parent reference resolves to no role
    #[error("Parent role '{0}' not found")]
    ParentNotFound(String),
}

/// Outcome of an inheritance validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceValidation {
    pub valid: bool,
    pub error: Option<InheritanceError>,
    /// Role names from the validated role to the repeated one
    pub cycle_path: Option<Vec<String>>,
}

impl InheritanceValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
            cycle_path: None,
        }
    }

    fn failed(error: InheritanceError) -> Self {
        let cycle_path = match &error {
            InheritanceError::CircularInheritance { path } => Some(path.clone()),
            InheritanceError::ParentNotFound(_) => None,
        };

        Self {
            valid: false,
            error: Some(error),
            cycle_path,
        }
    }

    /// Convert into a `Result`, dropping the duplicated path
    pub fn into_result(self) -> Result<(), InheritanceError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Validates the inheritance chain starting at `role`
///
/// Unlike aggregation, which silently avoids cycles, this traversal reports
/// the first cycle it meets together with the path of role names leading to
/// it. A parent reference missing from the catalog is also an error; the
/// active flag is not consulted.
pub fn validate_inheritance(role: &Role, catalog: &RoleCatalog) -> InheritanceValidation {
    match walk_inheritance(role, catalog, &HashSet::new(), &[]) {
        Ok(()) => InheritanceValidation::ok(),
        Err(error) => InheritanceValidation::failed(error),
    }
}

fn walk_inheritance<'a>(
    role: &'a Role,
    catalog: &'a RoleCatalog,
    visited: &HashSet<&'a str>,
    path: &[&'a str],
) -> Result<(), InheritanceError> {
    if visited.contains(role.id.as_str()) {
        let path = path
            .iter()
            .copied()
            .chain(std::iter::once(role.name.as_str()))
            .map(str::to_string)
            .collect();
        return Err(InheritanceError::CircularInheritance { path });
    }

    let mut visited = visited.clone();
    visited.insert(role.id.as_str());
    let mut path = path.to_vec();
    path.push(role.name.as_str());

    for parent_ref in role.parents() {
        let parent = catalog
            .resolve(parent_ref)
            .ok_or_else(|| InheritanceError::ParentNotFound(parent_ref.clone()))?;

        walk_inheritance(parent, catalog, &visited, &path)?;
    }

    Ok(())
}

/// Validates every role of the catalog, returning the failing ones
pub fn validate_catalog(catalog: &RoleCatalog) -> Vec<(String, InheritanceError)> {
    catalog
        .iter()
        .filter_map(|role| {
            validate_inheritance(role, catalog)
                .into_result()
                .err()
                .map(|error| (role.name.clone(), error))
        })
        .collect()
}

/// All roles inheriting from `role_name`, directly or transitively
///
/// Matching is on the parent reference string, so children must name the
/// parent by its name. Deduplicated by role id, in discovery order.
pub fn children_of<'a>(role_name: &str, catalog: &'a RoleCatalog) -> Vec<&'a Role> {
    dedup_by_id(collect_children(role_name, catalog, &HashSet::new()))
}

fn collect_children<'a>(
    role_name: &str,
    catalog: &'a RoleCatalog,
    visited: &HashSet<String>,
) -> Vec<&'a Role> {
    if visited.contains(role_name) {
        return Vec::new();
    }
    let mut visited = visited.clone();
    visited.insert(role_name.to_string());

    let mut children = Vec::new();
    for role in catalog.iter() {
        if role.parents().iter().any(|parent| parent == role_name) {
            children.push(role);
            children.extend(collect_children(&role.name, catalog, &visited));
        }
    }

    children
}

/// All roles `role_name` inherits from, directly or transitively
///
/// `role_name` may be a role id or name. Deduplicated by role id, in
/// discovery order.
pub fn parents_of<'a>(role_name: &str, catalog: &'a RoleCatalog) -> Vec<&'a Role> {
    dedup_by_id(collect_parents(role_name, catalog, &HashSet::new()))
}

fn collect_parents<'a>(
    role_name: &str,
    catalog: &'a RoleCatalog,
    visited: &HashSet<String>,
) -> Vec<&'a Role> {
    if visited.contains(role_name) {
        return Vec::new();
    }
    let mut visited = visited.clone();
    visited.insert(role_name.to_string());

    let Some(role) = catalog.resolve(role_name) else {
        return Vec::new();
    };

    let mut parents = Vec::new();
    for parent_ref in role.parents() {
        if let Some(parent) = catalog.resolve(parent_ref) {
            parents.push(parent);
            parents.extend(collect_parents(&parent.name, catalog, &visited));
        }
    }

    parents
}

fn dedup_by_id(roles: Vec<&Role>) -> Vec<&Role> {
    let mut seen = HashSet::new();
    roles
        .into_iter()
        .filter(|&role| seen.insert(role.id.as_str()))
        .collect()
}

/// Node of a role hierarchy tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleNode<'a> {
    pub role: &'a Role,
    pub children: Vec<RoleNode<'a>>,
    /// Distance from the root (roots are depth 0)
    pub depth: usize,
}

impl RoleNode<'_> {
    /// Number of nodes in this subtree, the node included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(RoleNode::size).sum::<usize>()
    }
}

/// Builds the role hierarchy tree for display
///
/// Roots are roles without parents; a node's children are the roles whose
/// `inherits_from` contains its name. Meant for catalogs that pass
/// [`validate_catalog`]: a role that already appears among a node's
/// ancestors is not expanded again, so a cyclic catalog yields a truncated
/// tree instead of unbounded recursion.
pub fn build_hierarchy(catalog: &RoleCatalog) -> Vec<RoleNode<'_>> {
    catalog
        .iter()
        .filter(|role| role.parents().is_empty())
        .map(|role| build_node(role, catalog, 0, &mut Vec::new()))
        .collect()
}

fn build_node<'a>(
    role: &'a Role,
    catalog: &'a RoleCatalog,
    depth: usize,
    ancestors: &mut Vec<&'a str>,
) -> RoleNode<'a> {
    ancestors.push(role.id.as_str());

    let mut children = Vec::new();
    for child in catalog.iter() {
        if !child.parents().iter().any(|parent| *parent == role.name) {
            continue;
        }
        if ancestors.contains(&child.id.as_str()) {
            warn!("Role '{}' inherits from its own descendant '{}'", child.name, role.name);
            continue;
        }
        children.push(build_node(child, catalog, depth + 1, ancestors));
    }

    ancestors.pop();

    RoleNode {
        role,
        children,
        depth,
    }
}

/// Renders a hierarchy as an indented outline of display names
pub fn render_hierarchy(nodes: &[RoleNode<'_>]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, &mut out);
    }
    out
}

fn render_node(node: &RoleNode<'_>, out: &mut String) {
    let _ = writeln!(out, "{}{}", "  ".repeat(node.depth), node.role.display_name);
    for child in &node.children {
        render_node(child, out);
    }
}
