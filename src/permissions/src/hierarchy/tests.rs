//! Comprehensive tests for the role hierarchy
//!
//! Verifies aggregation (including cyclic catalogs), inheritance validation
//! and traversal helpers.

use super::*;
use crate::types::Role;
use std::collections::BTreeSet;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn names(roles: &[&Role]) -> Vec<String> {
    roles.iter().map(|r| r.name.clone()).collect()
}

/// admin -> manager -> viewer, editor -> viewer
fn company_catalog() -> RoleCatalog {
    RoleCatalog::new(vec![
        Role::new("r-viewer", "viewer").with_permissions(["users.read", "posts.read"]),
        Role::new("r-editor", "editor")
            .with_permissions(["posts.create", "posts.update"])
            .inherits_from(["viewer"]),
        Role::new("r-manager", "manager")
            .with_permissions(["reports.read"])
            .inherits_from(["viewer"]),
        Role::new("r-admin", "admin")
            .with_permissions(["users.*"])
            .inherits_from(["manager"]),
    ])
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_admin_inherits_viewer() {
    let catalog = RoleCatalog::new(vec![
        Role::new("r-admin", "admin")
            .with_permissions(["users.*"])
            .inherits_from(["viewer"]),
        Role::new("r-viewer", "viewer").with_permissions(["users.read"]),
    ]);
    let admin = catalog.resolve("admin").unwrap();

    assert_eq!(aggregate(admin, &catalog), set(&["users.*", "users.read"]));
}

#[test]
fn test_multi_level_inheritance() {
    let catalog = company_catalog();
    let admin = catalog.resolve("admin").unwrap();

    assert_eq!(
        aggregate(admin, &catalog),
        set(&["users.*", "reports.read", "users.read", "posts.read"])
    );
}

#[test]
fn test_aggregation_normalizes() {
    let catalog = RoleCatalog::new(vec![
        Role::new("r-1", "shouty").with_permissions([" Users.Read ", "users.read"]),
    ]);
    let role = catalog.resolve("shouty").unwrap();

    assert_eq!(aggregate(role, &catalog), set(&["users.read"]));
}

#[test]
fn test_parent_referenced_by_id() {
    let catalog = RoleCatalog::new(vec![
        Role::new("r-base", "base").with_permissions(["profile.read"]),
        Role::new("r-child", "child").inherits_from(["r-base"]),
    ]);
    let child = catalog.resolve("child").unwrap();

    assert_eq!(aggregate(child, &catalog), set(&["profile.read"]));
}

#[test]
fn test_two_role_cycle_terminates() {
    let catalog = RoleCatalog::new(vec![
        Role::new("a", "role_a").with_permissions(["a.read"]).inherits_from(["role_b"]),
        Role::new("b", "role_b").with_permissions(["b.read"]).inherits_from(["role_a"]),
    ]);
    let role_a = catalog.resolve("role_a").unwrap();

    let permissions = aggregate(role_a, &catalog);
    assert!(permissions.is_superset(&set(&["a.read", "b.read"])));
}

#[test]
fn test_self_loop_terminates() {
    let catalog = RoleCatalog::new(vec![Role::new("a", "loop")
        .with_permissions(["loop.run"])
        .inherits_from(["loop"])]);
    let role = catalog.resolve("loop").unwrap();

    assert_eq!(aggregate(role, &catalog), set(&["loop.run"]));
}

#[test]
fn test_three_role_cycle_terminates() {
    let catalog = RoleCatalog::new(vec![
        Role::new("a", "a").with_permissions(["a.x"]).inherits_from(["b"]),
        Role::new("b", "b").with_permissions(["b.x"]).inherits_from(["c"]),
        Role::new("c", "c").with_permissions(["c.x"]).inherits_from(["a"]),
    ]);

    for name in ["a", "b", "c"] {
        let role = catalog.resolve(name).unwrap();
        assert_eq!(aggregate(role, &catalog), set(&["a.x", "b.x", "c.x"]));
    }
}

#[test]
fn test_diamond_siblings_do_not_share_visited() {
    // top -> left -> base, top -> right -> base
    let catalog = RoleCatalog::new(vec![
        Role::new("base", "base").with_permissions(["base.read"]),
        Role::new("left", "left").with_permissions(["left.read"]).inherits_from(["base"]),
        Role::new("right", "right").with_permissions(["right.read"]).inherits_from(["base"]),
        Role::new("top", "top").inherits_from(["left", "right"]),
    ]);
    let top = catalog.resolve("top").unwrap();

    assert_eq!(
        aggregate(top, &catalog),
        set(&["base.read", "left.read", "right.read"])
    );
}

#[test]
fn test_inactive_and_unknown_parents_skipped() {
    let catalog = RoleCatalog::new(vec![
        Role::new("old", "legacy").with_permissions(["legacy.read"]).deactivated(),
        Role::new("r-1", "member")
            .with_permissions(["posts.read"])
            .inherits_from(["legacy", "ghost"]),
    ]);
    let member = catalog.resolve("member").unwrap();

    assert_eq!(aggregate(member, &catalog), set(&["posts.read"]));
}

#[test]
fn test_aggregate_from_names() {
    let catalog = company_catalog();

    let permissions = aggregate_from_names(&["editor", "r-manager", "nobody"], &catalog);
    assert_eq!(
        permissions,
        set(&["posts.create", "posts.update", "users.read", "posts.read", "reports.read"])
    );
}

#[test]
fn test_aggregate_from_names_skips_inactive() {
    let catalog = RoleCatalog::new(vec![Role::new("r-1", "old")
        .with_permissions(["users.read"])
        .deactivated()]);

    assert!(aggregate_from_names(&["old"], &catalog).is_empty());
}

#[test]
fn test_role_has_permission() {
    let catalog = company_catalog();

    assert!(role_has_permission("admin", "users.read", &catalog));
    assert!(role_has_permission("admin", "Reports.Read", &catalog));
    // exact membership only; wildcards are not expanded here
    assert!(!role_has_permission("admin", "users.delete", &catalog));
    assert!(!role_has_permission("nobody", "users.read", &catalog));
}

#[test]
fn test_effective_role_permissions_sorted() {
    let catalog = company_catalog();

    let permissions = effective_role_permissions(&["editor"], &catalog);
    assert_eq!(
        permissions,
        vec!["posts.create", "posts.read", "posts.update", "users.read"]
    );
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_valid_hierarchy() {
    let catalog = company_catalog();
    let admin = catalog.resolve("admin").unwrap();

    let validation = validate_inheritance(admin, &catalog);
    assert!(validation.valid);
    assert!(validation.error.is_none());
    assert!(validation.cycle_path.is_none());
    assert!(validate_catalog(&catalog).is_empty());
}

#[test]
fn test_cycle_reported_with_path() {
    let catalog = RoleCatalog::new(vec![
        Role::new("a", "role_a").inherits_from(["role_b"]),
        Role::new("b", "role_b").inherits_from(["role_a"]),
    ]);
    let role_a = catalog.resolve("role_a").unwrap();

    let validation = validate_inheritance(role_a, &catalog);
    assert!(!validation.valid);
    assert_eq!(
        validation.cycle_path,
        Some(vec!["role_a".to_string(), "role_b".to_string(), "role_a".to_string()])
    );

    let message = validation.error.unwrap().to_string();
    assert!(message.contains("Circular role inheritance"));
    assert!(message.contains("role_a -> role_b -> role_a"));
}

#[test]
fn test_self_reference_reported() {
    let catalog = RoleCatalog::new(vec![Role::new("a", "narcissist").inherits_from(["a"])]);
    let role = catalog.resolve("a").unwrap();

    let validation = validate_inheritance(role, &catalog);
    assert_eq!(
        validation.cycle_path,
        Some(vec!["narcissist".to_string(), "narcissist".to_string()])
    );
}

#[test]
fn test_missing_parent_reported() {
    let catalog = RoleCatalog::new(vec![Role::new("a", "orphan").inherits_from(["ghost"])]);
    let role = catalog.resolve("orphan").unwrap();

    let validation = validate_inheritance(role, &catalog);
    assert!(!validation.valid);
    assert_eq!(
        validation.error,
        Some(InheritanceError::ParentNotFound("ghost".to_string()))
    );
    assert!(validation.cycle_path.is_none());
    assert!(validation.into_result().unwrap_err().to_string().contains("not found"));
}

#[test]
fn test_validate_catalog_lists_failures() {
    let catalog = RoleCatalog::new(vec![
        Role::new("ok", "fine").with_permissions(["x.read"]),
        Role::new("a", "role_a").inherits_from(["role_b"]),
        Role::new("b", "role_b").inherits_from(["role_a"]),
        Role::new("c", "orphan").inherits_from(["ghost"]),
    ]);

    let failures = validate_catalog(&catalog);
    let failed: Vec<&str> = failures.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(failed, vec!["role_a", "role_b", "orphan"]);
}

#[test]
fn test_cyclic_catalog_still_aggregates() {
    // validation flags the catalog, aggregation keeps working on it
    let catalog = RoleCatalog::new(vec![
        Role::new("a", "role_a").with_permissions(["a.read"]).inherits_from(["role_b"]),
        Role::new("b", "role_b").with_permissions(["b.read"]).inherits_from(["role_a"]),
    ]);
    let role_a = catalog.resolve("role_a").unwrap();

    assert!(!validate_inheritance(role_a, &catalog).valid);
    assert_eq!(aggregate(role_a, &catalog), set(&["a.read", "b.read"]));
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_children_of() {
    let catalog = company_catalog();

    let children = children_of("viewer", &catalog);
    assert_eq!(names(&children), vec!["editor", "manager", "admin"]);

    assert!(children_of("admin", &catalog).is_empty());
}

#[test]
fn test_parents_of() {
    let catalog = company_catalog();

    assert_eq!(names(&parents_of("admin", &catalog)), vec!["manager", "viewer"]);
    assert_eq!(names(&parents_of("r-editor", &catalog)), vec!["viewer"]);
    assert!(parents_of("viewer", &catalog).is_empty());
    assert!(parents_of("ghost", &catalog).is_empty());
}

#[test]
fn test_traversal_terminates_on_cycles() {
    let catalog = RoleCatalog::new(vec![
        Role::new("a", "role_a").inherits_from(["role_b"]),
        Role::new("b", "role_b").inherits_from(["role_a"]),
    ]);

    assert_eq!(names(&children_of("role_a", &catalog)), vec!["role_b", "role_a"]);
    assert_eq!(names(&parents_of("role_a", &catalog)), vec!["role_b", "role_a"]);
}

#[test]
fn test_traversal_deduplicates_diamonds() {
    let catalog = RoleCatalog::new(vec![
        Role::new("base", "base"),
        Role::new("left", "left").inherits_from(["base"]),
        Role::new("right", "right").inherits_from(["base"]),
        Role::new("top", "top").inherits_from(["left", "right"]),
    ]);

    assert_eq!(names(&children_of("base", &catalog)), vec!["left", "top", "right"]);
    assert_eq!(names(&parents_of("top", &catalog)), vec!["left", "base", "right"]);
}

#[test]
fn test_build_hierarchy() {
    let catalog = company_catalog();

    let roots = build_hierarchy(&catalog);
    assert_eq!(roots.len(), 1);

    let viewer = &roots[0];
    assert_eq!(viewer.role.name, "viewer");
    assert_eq!(viewer.depth, 0);
    assert_eq!(viewer.children.len(), 2);
    assert_eq!(viewer.size(), 4);

    let manager = &viewer.children[1];
    assert_eq!(manager.role.name, "manager");
    assert_eq!(manager.depth, 1);
    assert_eq!(manager.children[0].role.name, "admin");
    assert_eq!(manager.children[0].depth, 2);
}

#[test]
fn test_render_hierarchy() {
    let catalog = company_catalog();

    let rendered = render_hierarchy(&build_hierarchy(&catalog));
    assert_eq!(rendered, "viewer\n  editor\n  manager\n    admin\n");
}

#[test]
fn test_build_hierarchy_does_not_loop_on_cycles() {
    // root -> a -> b -> a
    let catalog = RoleCatalog::new(vec![
        Role::new("root", "root"),
        Role::new("a", "a").inherits_from(["root", "b"]),
        Role::new("b", "b").inherits_from(["a"]),
    ]);

    let roots = build_hierarchy(&catalog);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].size(), 3);
}
