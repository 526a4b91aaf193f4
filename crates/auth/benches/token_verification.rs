use criterion::{black_box, criterion_group, criterion_main, Criterion};

use std::sync::Arc;

use campus_auth::{
    authorize, ClaimsCodec, InMemoryTokenStore, Role, SubjectId, TokenKind, TokenLifecycle,
};

fn setup() -> (TokenLifecycle, SubjectId) {
    let store = Arc::new(InMemoryTokenStore::new());
    let lifecycle = TokenLifecycle::new(ClaimsCodec::new("bench-secret"), store);
    let subject = SubjectId::new("bench-user").unwrap();
    (lifecycle, subject)
}

/// Request-path cost: verify the bearer token, then run the role gate.
fn bench_access_path(c: &mut Criterion) {
    let (lifecycle, subject) = setup();
    let token = lifecycle
        .codec()
        .issue(&subject, Role::SchoolAdmin, TokenKind::Access)
        .unwrap();
    let required = [Role::SuperAdmin, Role::Admin, Role::SchoolAdmin];

    let mut group = c.benchmark_group("access_path");

    group.bench_function("verify_access", |b| {
        b.iter(|| lifecycle.verify_access(black_box(&token)).unwrap());
    });

    group.bench_function("verify_access_and_authorize", |b| {
        b.iter(|| {
            let principal = lifecycle.verify_access(black_box(&token)).unwrap();
            authorize(Some(&principal), &required).unwrap();
        });
    });

    group.finish();
}

/// Rotation against the in-memory store (codec + store, no network).
fn bench_rotation(c: &mut Criterion) {
    let (lifecycle, subject) = setup();

    c.bench_function("issue_then_refresh", |b| {
        b.iter(|| {
            let pair = lifecycle.issue_pair(&subject, Role::Student).unwrap();
            lifecycle.refresh(black_box(&pair.refresh_token)).unwrap();
        });
    });
}

criterion_group!(benches, bench_access_path, bench_rotation);
criterion_main!(benches);
