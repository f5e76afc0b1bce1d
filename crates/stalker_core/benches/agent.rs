//! Agent benchmarks for stalker_core.
//!
//! Run with: `cargo bench -p stalker_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stalker_core::math::Vec3;
use stalker_core::ranging::multilaterate;
use stalker_test_utils::fixtures::{exact_distances, hostile, reference_cube, test_config, ScriptedHost};

/// Position solve from eight exact ranges.
pub fn solver_benchmark(c: &mut Criterion) {
    let refs = reference_cube();
    let distances = exact_distances(&refs, Vec3::new(123.0, -456.0, 78.0));
    c.bench_function("multilaterate", |b| {
        b.iter(|| multilaterate(black_box(&refs), black_box(&distances)))
    });
}

/// Ten seconds of a duel against two hostiles, host replies included.
pub fn duel_benchmark(c: &mut Criterion) {
    c.bench_function("duel_10s", |b| {
        b.iter(|| {
            let mut host = ScriptedHost::new(test_config(), 4, Vec3::ZERO);
            host.players = vec![
                hostile(1, Vec3::new(90.0, 0.0, 0.0)),
                hostile(2, Vec3::new(-600.0, 200.0, 0.0)),
            ];
            host.run_until(10_000);
            black_box(host.runtime.state_hash())
        })
    });
}

criterion_group!(benches, solver_benchmark, duel_benchmark);
criterion_main!(benches);
