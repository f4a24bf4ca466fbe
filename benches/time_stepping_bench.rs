//! Full Newmark step benchmark on a small acoustic problem.

use criterion::{criterion_group, criterion_main, Criterion};

use semwave::mesh::{uniform_hex, uniform_quad, Mesh};
use semwave::physics::PhysicsKind;
use semwave::simulation::SimulationBuilder;

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("newmark_step");

    let mesh = Mesh::build(
        uniform_quad(-1.0, 1.0, -1.0, 1.0, 8, 8).with_constant_material("VP", 1.0),
    )
    .unwrap();
    let mut sim = SimulationBuilder::new(mesh, 4, PhysicsKind::Acoustic, 1e6, 1e-3)
        .build()
        .unwrap();
    sim.set_initial_condition("u", |p| (p[0] * p[1]).sin());
    group.bench_function("quad_8x8_order4", |b| b.iter(|| sim.step().unwrap()));

    let mesh = Mesh::build(
        uniform_hex(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 4, 4, 4).with_constant_material("VP", 1.0),
    )
    .unwrap();
    let mut sim = SimulationBuilder::new(mesh, 3, PhysicsKind::Acoustic, 1e6, 1e-3)
        .build()
        .unwrap();
    sim.set_initial_condition("u", |p| (p[0] + p[1] + p[2]).cos());
    group.bench_function("hex_4x4x4_order3", |b| b.iter(|| sim.step().unwrap()));

    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
