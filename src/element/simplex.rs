//! Dense-table operators for the simplex shapes.
//!
//! Triangles and tetrahedra are affine, so the inverse Jacobian is a
//! per-element constant and the reference derivative tables apply
//! directly. Sum factorization buys nothing here; the stiffness matrix is
//! pre-formed once per element and applied as a dense mat-vec thereafter.

use faer::Mat;

use super::Element;
use crate::reference::Shape;

/// Physical gradient at every node: dense reference derivatives rotated
/// by the constant inverse Jacobian.
pub(crate) fn gradient(el: &Element, f: &[f64]) -> Vec<[f64; 3]> {
    let b = el.tables.simplex();
    let aff = el.affine.as_ref().expect("simplex elements cache their Jacobian");
    let n = b.num_points;
    let dim = b.dim;
    let mut out = vec![[0.0; 3]; n];
    for q in 0..n {
        let mut gref = [0.0; 3];
        for j in 0..n {
            gref[0] += b.d_r[(q, j)] * f[j];
            gref[1] += b.d_s[(q, j)] * f[j];
            if dim == 3 {
                gref[2] += b.d_t[(q, j)] * f[j];
            }
        }
        for i in 0..dim {
            let mut v = 0.0;
            for k in 0..dim {
                v += aff.inv[i][k] * gref[k];
            }
            out[q][i] = v;
        }
    }
    out
}

/// ∫ ∇φ_i · F dΩ with the collocated rule.
pub(crate) fn apply_grad_test_and_integrate(el: &Element, f: &[[f64; 3]]) -> Vec<f64> {
    let b = el.tables.simplex();
    let aff = el.affine.as_ref().expect("simplex elements cache their Jacobian");
    let n = b.num_points;
    let dim = b.dim;
    // Rotate into reference components F_ξk = Σ_i inv[i][k] F_i.
    let mut fref = vec![[0.0; 3]; n];
    for q in 0..n {
        for k in 0..dim {
            let mut v = 0.0;
            for i in 0..dim {
                v += aff.inv[i][k] * f[q][i];
            }
            fref[q][k] = v;
        }
    }
    let mut out = vec![0.0; n];
    for i in 0..n {
        let mut acc = 0.0;
        for q in 0..n {
            let wq = b.weights[q] * aff.det;
            let mut g = b.d_r[(q, i)] * fref[q][0] + b.d_s[(q, i)] * fref[q][1];
            if dim == 3 {
                g += b.d_t[(q, i)] * fref[q][2];
            }
            acc += wq * g;
        }
        out[i] = acc;
    }
    out
}

/// Dense stiffness K_ij = Σ_q w_q det J c_q ∇ℓ_i(q)·∇ℓ_j(q).
pub(crate) fn build_stiffness_matrix(el: &Element, c: &[f64]) -> Mat<f64> {
    let b = el.tables.simplex();
    let aff = el.affine.as_ref().expect("simplex elements cache their Jacobian");
    let n = b.num_points;
    let dim = b.dim;
    // Physical gradient tables g[d][q][j].
    let mut g = vec![vec![vec![0.0; n]; n]; dim];
    for q in 0..n {
        for j in 0..n {
            for d in 0..dim {
                let mut v = aff.inv[d][0] * b.d_r[(q, j)] + aff.inv[d][1] * b.d_s[(q, j)];
                if dim == 3 {
                    v += aff.inv[d][2] * b.d_t[(q, j)];
                }
                g[d][q][j] = v;
            }
        }
    }
    let mut k = Mat::zeros(n, n);
    for q in 0..n {
        let wq = b.weights[q] * aff.det * c[q];
        for d in 0..dim {
            let gq = &g[d][q];
            for i in 0..n {
                let gi = wq * gq[i];
                if gi == 0.0 {
                    continue;
                }
                for j in 0..n {
                    k[(i, j)] += gi * gq[j];
                }
            }
        }
    }
    k
}

/// Surface integral on one side with the interpolatory trace rule and
/// the affine side metric.
pub(crate) fn apply_test_and_integrate_side(el: &Element, f: &[f64], side: usize) -> Vec<f64> {
    let b = el.tables.simplex();
    let nodes = b.side_nodes(side);
    let weights = &b.side_weights[side];
    let det = side_metric(el, side);
    let mut out = vec![0.0; b.num_points];
    for (p, &idx) in nodes.iter().enumerate() {
        out[idx] = f[idx] * weights[p] * det;
    }
    out
}

/// Ratio of the physical side measure to the reference side measure (2
/// for both reference edges and reference faces).
fn side_metric(el: &Element, side: usize) -> f64 {
    match el.shape {
        Shape::Tri => {
            let (a, b) = crate::basis::TRI_EDGES[side];
            let dx = el.vtx[b][0] - el.vtx[a][0];
            let dy = el.vtx[b][1] - el.vtx[a][1];
            (dx * dx + dy * dy).sqrt() / 2.0
        }
        Shape::Tet => {
            let (f0, f1, f2) = crate::basis::TET_FACES[side];
            let u = [
                el.vtx[f1][0] - el.vtx[f0][0],
                el.vtx[f1][1] - el.vtx[f0][1],
                el.vtx[f1][2] - el.vtx[f0][2],
            ];
            let v = [
                el.vtx[f2][0] - el.vtx[f0][0],
                el.vtx[f2][1] - el.vtx[f0][1],
                el.vtx[f2][2] - el.vtx[f0][2],
            ];
            let c = [
                u[1] * v[2] - u[2] * v[1],
                u[2] * v[0] - u[0] * v[2],
                u[0] * v[1] - u[1] * v[0],
            ];
            let area = (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt() / 2.0;
            area / 2.0
        }
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Shape, Tables};

    fn tri_element(order: usize) -> Element {
        let tables = Tables::new(Shape::Tri, order).unwrap();
        let vtx = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        Element::new(0, tables, vtx).unwrap()
    }

    fn tet_element(order: usize) -> Element {
        let tables = Tables::new(Shape::Tet, order).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        Element::new(0, tables, vtx).unwrap()
    }

    #[test]
    fn test_tri_gradient_quadratic() {
        let el = tri_element(3);
        let pts = el.build_nodal_points();
        let f: Vec<f64> = pts.iter().map(|p| p[0] * p[0] + p[0] * p[1]).collect();
        let g = gradient(&el, &f);
        for (q, p) in pts.iter().enumerate() {
            assert!((g[q][0] - (2.0 * p[0] + p[1])).abs() < 1e-10);
            assert!((g[q][1] - p[0]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_tet_gradient_linear() {
        let el = tet_element(2);
        let pts = el.build_nodal_points();
        let f: Vec<f64> = pts.iter().map(|p| p[0] - p[1] + 2.0 * p[2]).collect();
        let g = gradient(&el, &f);
        for gq in g {
            assert!((gq[0] - 1.0).abs() < 1e-10);
            assert!((gq[1] + 1.0).abs() < 1e-10);
            assert!((gq[2] - 2.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_stiffness_matrix_symmetry() {
        for el in [tri_element(3), tet_element(3)] {
            let n = el.tables.num_points;
            let c = vec![1.0; n];
            let k = build_stiffness_matrix(&el, &c);
            for i in 0..n {
                for j in 0..n {
                    assert!(
                        (k[(i, j)] - k[(j, i)]).abs() < 1e-10,
                        "K[{},{}] asymmetric",
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_stiffness_annihilates_constants() {
        let el = tri_element(3);
        let n = el.tables.num_points;
        let k = build_stiffness_matrix(&el, &vec![1.0; n]);
        for i in 0..n {
            let row_sum: f64 = (0..n).map(|j| k[(i, j)]).sum();
            assert!(row_sum.abs() < 1e-10, "row {} sums to {}", i, row_sum);
        }
    }

    #[test]
    fn test_side_integral_measures() {
        let el = tri_element(3);
        let ones = vec![1.0; el.tables.num_points];
        // Sides: (0,1) length 1, (1,2) length √2, (2,0) length 1.
        let sums: Vec<f64> = (0..3)
            .map(|s| apply_test_and_integrate_side(&el, &ones, s).iter().sum())
            .collect();
        assert!((sums[0] - 1.0).abs() < 1e-12);
        assert!((sums[1] - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((sums[2] - 1.0).abs() < 1e-12);

        let el = tet_element(2);
        let ones = vec![1.0; el.tables.num_points];
        // Face (0,1,2) of the unit tet has area 1/2.
        let s: f64 = apply_test_and_integrate_side(&el, &ones, 0).iter().sum();
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_grad_test_matches_dense_stiffness() {
        // apply_grad_test(c ∇u) equals K·u with the same coefficient.
        let el = tet_element(3);
        let n = el.tables.num_points;
        let pts = el.build_nodal_points();
        let u: Vec<f64> = pts.iter().map(|p| p[0] * p[1] + p[2]).collect();
        let c = vec![1.0; n];
        let k = build_stiffness_matrix(&el, &c);
        let mut ku = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                ku[i] += k[(i, j)] * u[j];
            }
        }
        let grad = gradient(&el, &u);
        let r = apply_grad_test_and_integrate(&el, &grad);
        for i in 0..n {
            assert!((ku[i] - r[i]).abs() < 1e-9, "{}: {} vs {}", i, ku[i], r[i]);
        }
    }
}
