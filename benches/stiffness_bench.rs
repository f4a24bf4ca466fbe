//! Per-element stiffness application benchmarks: sum-factorized tensor
//! shapes against dense simplex mat-vecs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use semwave::element::Element;
use semwave::physics::{ElementKernel, PhysicsKind};
use semwave::reference::{Shape, Tables};

fn element(shape: Shape, order: usize) -> Element {
    let tables = Tables::new(shape, order).unwrap();
    let vtx: Vec<[f64; 3]> = match shape {
        Shape::Quad => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        Shape::Tri => vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        Shape::Hex => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
        Shape::Tet => vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
    };
    let mut el = Element::new(0, tables, vtx).unwrap();
    el.attach_material("VP", vec![1.0; shape.num_vertices()]);
    el
}

fn bench_stiffness(c: &mut Criterion) {
    let mut group = c.benchmark_group("stiffness_term");
    for (shape, order) in [
        (Shape::Quad, 4),
        (Shape::Hex, 4),
        (Shape::Tri, 3),
        (Shape::Tet, 3),
    ] {
        let el = element(shape, order);
        let kernel = ElementKernel::new(PhysicsKind::Acoustic, &el).unwrap();
        let u = vec![(0..el.tables.num_points)
            .map(|i| (i as f64 * 0.1).sin())
            .collect::<Vec<f64>>()];
        group.bench_function(format!("{}_order{}", shape.name(), order), |b| {
            b.iter(|| kernel.stiffness_term(black_box(&el), black_box(&u)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stiffness);
criterion_main!(benches);
