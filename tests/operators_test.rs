//! Assembled-operator properties on real meshes: quadrature exactness,
//! basis-gradient exactness, stiffness symmetry, mass positivity, delta
//! reproduction and the assembly round trip.

use std::sync::Arc;

use semwave::element::Element;
use semwave::assembly::Section;
use semwave::mesh::{uniform_hex, uniform_quad, uniform_tet, uniform_tri, Mesh, MeshData};
use semwave::physics::{ElementKernel, PhysicsKind};
use semwave::reference::{Shape, Tables};
use semwave::time::Order2Newmark;

fn meshes() -> Vec<(MeshData, usize)> {
    vec![
        (uniform_quad(-1.0, 1.0, -1.0, 1.0, 2, 2), 4),
        (uniform_tri(-1.0, 1.0, -1.0, 1.0, 2, 2), 3),
        (uniform_hex(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 2, 2, 2), 3),
        (uniform_tet(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0, 2, 2, 2), 3),
    ]
}

fn elements_of(mesh: &Mesh, tables: &Arc<Tables>) -> Vec<Element> {
    (0..mesh.num_cells())
        .map(|c| {
            let mut el = Element::new(c, tables.clone(), mesh.cell_vertices(c)).unwrap();
            el.attach_material("VP", vec![1.0; tables.shape.num_vertices()]);
            el
        })
        .collect()
}

#[test]
fn quadrature_measures_domain_volume() {
    // Σ w_i det J_i over all elements equals the domain measure for
    // every shape: quadrature exactness applied to p = 1.
    for (data, order) in meshes() {
        let expected = match data.dim {
            2 => 4.0,
            _ => 8.0,
        };
        let shape = data.shape;
        let mesh = Mesh::build(data).unwrap();
        let tables = Tables::new(shape, order).unwrap();
        let mut vol = 0.0;
        for el in elements_of(&mesh, &tables) {
            let ones = vec![1.0; tables.num_points];
            vol += el.apply_test_and_integrate(&ones).iter().sum::<f64>();
        }
        assert!(
            (vol - expected).abs() < 1e-10 * expected,
            "{:?}: volume {}",
            shape,
            vol
        );
    }
}

#[test]
fn gradient_of_lagrange_basis_is_exact() {
    // compute_gradient applied to each basis vector matches the
    // analytical derivative of ℓ_i at every integration point, checked
    // through a polynomial the space contains.
    for (data, order) in meshes() {
        let shape = data.shape;
        let mesh = Mesh::build(data).unwrap();
        let tables = Tables::new(shape, order).unwrap();
        let el = Element::new(0, tables.clone(), mesh.cell_vertices(0)).unwrap();
        let pts = el.build_nodal_points();
        let f: Vec<f64> = pts.iter().map(|p| p[0] * p[0] + 2.0 * p[1]).collect();
        let grad = el.compute_gradient(&f);
        for (q, p) in pts.iter().enumerate() {
            assert!(
                (grad[q][0] - 2.0 * p[0]).abs() < 1e-9,
                "{:?} d/dx at {:?}: {}",
                shape,
                p,
                grad[q][0]
            );
            assert!(
                (grad[q][1] - 2.0).abs() < 1e-9,
                "{:?} d/dy at {:?}: {}",
                shape,
                p,
                grad[q][1]
            );
        }
    }
}

#[test]
fn assembled_stiffness_is_symmetric() {
    // u·(K v) = v·(K u) with constant material, summed over elements.
    for (data, order) in meshes() {
        let shape = data.shape;
        let mesh = Mesh::build(data).unwrap();
        let tables = Tables::new(shape, order).unwrap();
        let section = Section::build(&mesh, &tables).unwrap();
        let elements = elements_of(&mesh, &tables);
        let kernels: Vec<ElementKernel> = elements
            .iter()
            .map(|el| ElementKernel::new(PhysicsKind::Acoustic, el).unwrap())
            .collect();

        let n = section.num_dofs;
        let u: Vec<f64> = (0..n).map(|i| (i as f64 * 0.317).sin()).collect();
        let v: Vec<f64> = (0..n).map(|i| (i as f64 * 0.711).cos()).collect();
        let apply = |x: &[f64]| {
            let mut out = vec![0.0; n];
            for (el, kernel) in elements.iter().zip(kernels.iter()) {
                let xe = section.closure_get(x, el.index);
                let ke = kernel.stiffness_term(el, &[xe]);
                section.closure_set_add(&mut out, el.index, &ke[0]);
            }
            out
        };
        let ku = apply(&u);
        let kv = apply(&v);
        let ukv: f64 = u.iter().zip(kv.iter()).map(|(a, b)| a * b).sum();
        let vku: f64 = v.iter().zip(ku.iter()).map(|(a, b)| a * b).sum();
        let scale = ukv.abs().max(1.0);
        assert!(
            (ukv - vku).abs() < 1e-10 * scale,
            "{:?}: {} vs {}",
            shape,
            ukv,
            vku
        );
    }
}

#[test]
fn lumped_mass_is_strictly_positive() {
    for (data, order) in meshes() {
        let shape = data.shape;
        let mesh = Mesh::build(data).unwrap();
        let tables = Tables::new(shape, order).unwrap();
        let section = Section::build(&mesh, &tables).unwrap();
        let elements = elements_of(&mesh, &tables);
        let kernels: Vec<ElementKernel> = elements
            .iter()
            .map(|el| ElementKernel::new(PhysicsKind::Acoustic, el).unwrap())
            .collect();
        let newmark = Order2Newmark::new(1.0, 0.1);
        let fields = newmark
            .initialize_global_dofs(&elements, &kernels, &section, PhysicsKind::Acoustic)
            .unwrap();
        // `mi` holds the reciprocal mass; positivity of both is the same.
        assert!(
            fields["mi"].global.iter().all(|&v| v > 0.0),
            "{:?}: non-positive mass row",
            shape
        );
    }
}

#[test]
fn delta_coefficients_reproduce_point_source() {
    for (data, order) in meshes() {
        let shape = data.shape;
        let mesh = Mesh::build(data).unwrap();
        let tables = Tables::new(shape, order).unwrap();
        let el = Element::new(0, tables.clone(), mesh.cell_vertices(0)).unwrap();
        let xi = match shape.dim() {
            2 => vec![-0.31, -0.42],
            _ => vec![-0.31, -0.42, -0.53],
        };
        let c = el.delta_coefficients(&xi);
        let total: f64 = el.apply_test_and_integrate(&c).iter().sum();
        assert!((total - 1.0).abs() < 1e-10, "{:?}: {}", shape, total);
    }
}

#[test]
fn closure_round_trip_is_exact() {
    // Values written through a closure come back bit-identical through
    // the same closure, for every shape and orientation in the mesh.
    for (data, order) in meshes() {
        let shape = data.shape;
        let mesh = Mesh::build(data).unwrap();
        let tables = Tables::new(shape, order).unwrap();
        let section = Section::build(&mesh, &tables).unwrap();
        for cell in 0..mesh.num_cells() {
            let mut local = vec![0.0; section.num_dofs];
            let values: Vec<f64> = (0..tables.num_points).map(|t| t as f64 + 1.0).collect();
            section.closure_set_insert(&mut local, cell, &values);
            let back = section.closure_get(&local, cell);
            assert_eq!(back, values, "{:?} cell {}", shape, cell);
        }
    }
}
