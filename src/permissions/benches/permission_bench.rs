/// Benchmarks for the permission engine
///
/// Measures performance of:
/// - Permission validation and wildcard matching
/// - Role aggregation over inheritance chains
/// - Decision resolution with and without roles
/// - Priority checks against a warm membership cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use tenantguard_permissions::checker::check;
use tenantguard_permissions::hierarchy::aggregate;
use tenantguard_permissions::permission::{matches_wildcard, validate};
use tenantguard_permissions::{
    lookup_fn, MemoryCache, PermissionError, PermissionScope, PriorityChecker, Role, RoleCatalog,
    ScopedPermission, ScopedUser, TenantMembership, UserPermissionContext,
};

/// Linear chain `role-0 <- role-1 <- ... <- role-{depth-1}`
fn chain_catalog(depth: usize) -> RoleCatalog {
    (0..depth)
        .map(|i| {
            let role = Role::new(format!("r-{}", i), format!("role-{}", i))
                .with_permissions([format!("module{}.read", i), format!("module{}.write", i)]);
            if i == 0 {
                role
            } else {
                role.inherits_from([format!("role-{}", i - 1)])
            }
        })
        .collect()
}

fn bench_grammar(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar");

    for (name, permission) in [
        ("two_segments", "users.read"),
        ("three_segments", "billing.invoices.create"),
        ("wildcard", "billing.invoices.*"),
    ] {
        group.bench_with_input(BenchmarkId::new("validate", name), &permission, |b, &p| {
            b.iter(|| validate(black_box(p)).is_ok());
        });
    }

    group.bench_function("matches_wildcard", |b| {
        b.iter(|| matches_wildcard(black_box("billing.invoices.create"), black_box("billing.*")));
    });

    group.finish();
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    for depth in [1, 5, 20] {
        let catalog = chain_catalog(depth);
        let leaf = catalog.resolve(&format!("role-{}", depth - 1)).cloned().unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &leaf, |b, role| {
            b.iter(|| aggregate(black_box(role), &catalog));
        });
    }

    group.finish();
}

fn bench_decision(c: &mut Criterion) {
    let mut group = c.benchmark_group("decision");
    let catalog = chain_catalog(10);

    let direct = UserPermissionContext::new("user-1", "tenant-1")
        .with_permissions(["users.read", "posts.*", "reports.export"]);
    group.bench_function("direct_wildcard", |b| {
        b.iter(|| check(&direct, black_box("posts.publish"), PermissionScope::Tenant, None));
    });

    let with_roles = UserPermissionContext::new("user-1", "tenant-1").with_roles(["role-9"]);
    group.bench_function("role_chain_10", |b| {
        b.iter(|| {
            check(&with_roles, black_box("module0.read"), PermissionScope::Tenant, Some(&catalog))
        });
    });

    group.finish();
}

fn bench_priority(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("priority");

    let checker = PriorityChecker::new(lookup_fn(|user_id: String, tenant_id: String| async move {
        Ok::<_, PermissionError>(Some(
            TenantMembership::new(user_id, tenant_id).with_permissions(["posts.*"]),
        ))
    }))
    .with_cache(Arc::new(MemoryCache::new()));

    let global = ScopedUser::new("user-1").with_entry(ScopedPermission::global("*"));
    let tenant = ScopedUser::new("user-2");

    group.bench_function("global_grant", |b| {
        b.to_async(&runtime)
            .iter(|| checker.check(&global, "tenant-1", "posts.read"));
    });

    group.bench_function("cached_tenant_grant", |b| {
        b.to_async(&runtime)
            .iter(|| checker.check(&tenant, "tenant-1", "posts.read"));
    });

    group.finish();
}

criterion_group!(benches, bench_grammar, bench_aggregation, bench_decision, bench_priority);
criterion_main!(benches);
