//! Sum-factorized operators for the tensor-product shapes.
//!
//! All contractions run over one 1D index at a time; the full P×P
//! operator is never materialized. Weight products are always formed in
//! (r, s, t) order so repeated runs of the same build are bit-identical.

use super::Element;
use crate::error::Result;
use crate::reference::Shape;
use crate::shape::{hex, quad};

/// Probe the Jacobian at every integration point; degenerate geometry is
/// rejected at element construction.
pub(crate) fn validate_geometry(el: &Element) -> Result<()> {
    let n = el.tables.num_points;
    for q in 0..n {
        let xi = el.tables.node_coords(q);
        match el.shape {
            Shape::Quad => {
                quad::inverse_jacobian_at(xi[0], xi[1], &el.vtx, el.index)?;
            }
            Shape::Hex => {
                hex::inverse_jacobian_at(xi[0], xi[1], xi[2], &el.vtx, el.index)?;
            }
            _ => unreachable!(),
        }
    }
    Ok(())
}

/// det J at one integration point; geometry was validated at construction.
pub(crate) fn det_jac_at(el: &Element, q: usize) -> f64 {
    let xi = el.tables.node_coords(q);
    match el.shape {
        Shape::Quad => quad::jacobian_at(xi[0], xi[1], &el.vtx).1,
        Shape::Hex => hex::jacobian_at(xi[0], xi[1], xi[2], &el.vtx).1,
        _ => unreachable!(),
    }
}

fn inv_at(el: &Element, xi: &[f64; 3]) -> ([[f64; 3]; 3], f64) {
    match el.shape {
        Shape::Quad => {
            let (inv2, det) = quad::inverse_jacobian_at(xi[0], xi[1], &el.vtx, el.index)
                .expect("geometry validated at construction");
            let mut inv = [[0.0; 3]; 3];
            for i in 0..2 {
                for k in 0..2 {
                    inv[i][k] = inv2[i][k];
                }
            }
            (inv, det)
        }
        Shape::Hex => hex::inverse_jacobian_at(xi[0], xi[1], xi[2], &el.vtx, el.index)
            .expect("geometry validated at construction"),
        _ => unreachable!(),
    }
}

/// Physical gradient at every node: 1D derivative contractions per
/// direction, rotated by the inverse Jacobian at each point.
pub(crate) fn gradient(el: &Element, f: &[f64]) -> Vec<[f64; 3]> {
    let line = el.tables.line();
    let n = el.tables.points_1d();
    let d = &line.deriv;
    match el.shape {
        Shape::Quad => {
            let mut out = vec![[0.0; 3]; n * n];
            for j in 0..n {
                for i in 0..n {
                    let idx = i + j * n;
                    let mut gr = 0.0;
                    let mut gs = 0.0;
                    for a in 0..n {
                        gr += d[(i, a)] * f[a + j * n];
                        gs += d[(j, a)] * f[i + a * n];
                    }
                    let xi = [line.nodes[i], line.nodes[j], 0.0];
                    let (inv, _) = inv_at(el, &xi);
                    out[idx][0] = inv[0][0] * gr + inv[0][1] * gs;
                    out[idx][1] = inv[1][0] * gr + inv[1][1] * gs;
                }
            }
            out
        }
        Shape::Hex => {
            let nn = n * n;
            let mut out = vec![[0.0; 3]; n * nn];
            for k in 0..n {
                for j in 0..n {
                    for i in 0..n {
                        let idx = i + j * n + k * nn;
                        let mut gr = 0.0;
                        let mut gs = 0.0;
                        let mut gt = 0.0;
                        for a in 0..n {
                            gr += d[(i, a)] * f[a + j * n + k * nn];
                            gs += d[(j, a)] * f[i + a * n + k * nn];
                            gt += d[(k, a)] * f[i + j * n + a * nn];
                        }
                        let xi = [line.nodes[i], line.nodes[j], line.nodes[k]];
                        let (inv, _) = inv_at(el, &xi);
                        for dir in 0..3 {
                            out[idx][dir] =
                                inv[dir][0] * gr + inv[dir][1] * gs + inv[dir][2] * gt;
                        }
                    }
                }
            }
            out
        }
        _ => unreachable!(),
    }
}

/// ∫ ∇φ_i · F dΩ with three sum-factorized passes.
///
/// The field is first rotated into reference components
/// F_ξk = Σ_i (∂ξ_k/∂x_i) F_i and scaled by det J at each point; each
/// reference direction then contracts with the 1D derivative table.
pub(crate) fn apply_grad_test_and_integrate(el: &Element, f: &[[f64; 3]]) -> Vec<f64> {
    let line = el.tables.line();
    let n = el.tables.points_1d();
    let d = &line.deriv;
    let w = &line.weights;
    match el.shape {
        Shape::Quad => {
            let np = n * n;
            let mut fref = vec![[0.0; 2]; np];
            let mut detj = vec![0.0; np];
            for j in 0..n {
                for i in 0..n {
                    let idx = i + j * n;
                    let xi = [line.nodes[i], line.nodes[j], 0.0];
                    let (inv, det) = inv_at(el, &xi);
                    detj[idx] = det;
                    for k in 0..2 {
                        fref[idx][k] = inv[0][k] * f[idx][0] + inv[1][k] * f[idx][1];
                    }
                }
            }
            let mut out = vec![0.0; np];
            for j in 0..n {
                for i in 0..n {
                    let mut term_r = 0.0;
                    let mut term_s = 0.0;
                    for a in 0..n {
                        term_r += w[a] * detj[a + j * n] * fref[a + j * n][0] * d[(a, i)];
                        term_s += w[a] * detj[i + a * n] * fref[i + a * n][1] * d[(a, j)];
                    }
                    out[i + j * n] = w[j] * term_r + w[i] * term_s;
                }
            }
            out
        }
        Shape::Hex => {
            let nn = n * n;
            let np = n * nn;
            let mut fref = vec![[0.0; 3]; np];
            let mut detj = vec![0.0; np];
            for k in 0..n {
                for j in 0..n {
                    for i in 0..n {
                        let idx = i + j * n + k * nn;
                        let xi = [line.nodes[i], line.nodes[j], line.nodes[k]];
                        let (inv, det) = inv_at(el, &xi);
                        detj[idx] = det;
                        for kk in 0..3 {
                            fref[idx][kk] = inv[0][kk] * f[idx][0]
                                + inv[1][kk] * f[idx][1]
                                + inv[2][kk] * f[idx][2];
                        }
                    }
                }
            }
            let mut out = vec![0.0; np];
            for k in 0..n {
                for j in 0..n {
                    for i in 0..n {
                        let mut term_r = 0.0;
                        let mut term_s = 0.0;
                        let mut term_t = 0.0;
                        for a in 0..n {
                            let ridx = a + j * n + k * nn;
                            let sidx = i + a * n + k * nn;
                            let tidx = i + j * n + a * nn;
                            term_r += w[a] * detj[ridx] * fref[ridx][0] * d[(a, i)];
                            term_s += w[a] * detj[sidx] * fref[sidx][1] * d[(a, j)];
                            term_t += w[a] * detj[tidx] * fref[tidx][2] * d[(a, k)];
                        }
                        out[i + j * n + k * nn] =
                            w[j] * w[k] * term_r + w[i] * w[k] * term_s + w[i] * w[j] * term_t;
                    }
                }
            }
            out
        }
        _ => unreachable!(),
    }
}

/// Surface integral on one side. Quad edges carry the 1D rule with the
/// straight-edge metric; hex faces project their vertices onto an
/// orthonormal in-plane frame and integrate with the 2D rule.
pub(crate) fn apply_test_and_integrate_side(el: &Element, f: &[f64], side: usize) -> Vec<f64> {
    let line = el.tables.line();
    let n = el.tables.points_1d();
    let w = &line.weights;
    let mut out = vec![0.0; el.tables.num_points];
    match el.shape {
        Shape::Quad => {
            let nodes = el.side_nodes(side);
            let (a, b) = crate::reference::QUAD_EDGES[side];
            let dx = el.vtx[b][0] - el.vtx[a][0];
            let dy = el.vtx[b][1] - el.vtx[a][1];
            let det = (dx * dx + dy * dy).sqrt() / 2.0;
            for (p, &idx) in nodes.iter().enumerate() {
                out[idx] = f[idx] * w[p] * det;
            }
        }
        Shape::Hex => {
            let nodes = el.side_nodes(side);
            let face = crate::reference::HEX_FACES[side];
            let q0 = el.vtx[face[0]];
            let q1 = el.vtx[face[1]];
            let q2 = el.vtx[face[2]];
            let q3 = el.vtx[face[3]];
            let v0 = sub(q1, q0);
            let v1 = sub(q3, q0);
            let nrm = normalize(cross(v0, v1));
            let e0 = normalize(v0);
            let e1 = normalize(cross(nrm, v0));
            // Face vertices in the in-plane frame.
            let proj = |q: [f64; 3]| {
                let d = sub(q, q0);
                [dot(d, e0), dot(d, e1), 0.0]
            };
            let fv = [proj(q0), proj(q1), proj(q2), proj(q3)];
            for (p, &idx) in nodes.iter().enumerate() {
                let ai = p % n;
                let bi = p / n;
                let (_, det) = quad::jacobian_at(line.nodes[ai], line.nodes[bi], &fv);
                out[idx] = f[idx] * w[ai] * w[bi] * det;
            }
        }
        _ => unreachable!(),
    }
    out
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(a: [f64; 3]) -> [f64; 3] {
    let n = dot(a, a).sqrt();
    [a[0] / n, a[1] / n, a[2] / n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Tables;

    fn hex_element(order: usize) -> Element {
        let tables = Tables::new(Shape::Hex, order).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        Element::new(0, tables, vtx).unwrap()
    }

    #[test]
    fn test_hex_gradient_linear() {
        let el = hex_element(3);
        let pts = el.build_nodal_points();
        let f: Vec<f64> = pts.iter().map(|p| p[0] - 2.0 * p[1] + 0.5 * p[2]).collect();
        for g in gradient(&el, &f) {
            assert!((g[0] - 1.0).abs() < 1e-11);
            assert!((g[1] + 2.0).abs() < 1e-11);
            assert!((g[2] - 0.5).abs() < 1e-11);
        }
    }

    #[test]
    fn test_grad_test_integrate_constant_field_is_zero() {
        // ∫ ∇φ_i · F with constant F over a closed sum of test functions:
        // Σ_i r_i = ∫ ∇(Σφ) · F = 0 since Σφ = 1.
        let el = hex_element(2);
        let np = el.tables.num_points;
        let f = vec![[1.0, 2.0, -0.5]; np];
        let r = apply_grad_test_and_integrate(&el, &f);
        let total: f64 = r.iter().sum();
        assert!(total.abs() < 1e-12, "total {}", total);
    }

    #[test]
    fn test_stiffness_annihilated_by_partition_of_unity() {
        // Σ_i (K u)_i = ∫ ∇(Σφ_i) · ∇u = 0 since the basis sums to 1.
        let el = hex_element(3);
        let pts = el.build_nodal_points();
        let u: Vec<f64> = pts.iter().map(|p| p[0] * p[0]).collect();
        let grad = gradient(&el, &u);
        let r = apply_grad_test_and_integrate(&el, &grad);
        let total: f64 = r.iter().sum();
        assert!(total.abs() < 1e-11, "total {}", total);
    }

    #[test]
    fn test_side_integral_area() {
        // Integrating f = 1 over a face of the unit cube gives its area.
        let el = hex_element(3);
        let np = el.tables.num_points;
        let ones = vec![1.0; np];
        for side in 0..6 {
            let r = apply_test_and_integrate_side(&el, &ones, side);
            let total: f64 = r.iter().sum();
            assert!((total - 1.0).abs() < 1e-12, "side {}: {}", side, total);
        }
    }

    #[test]
    fn test_quad_side_integral_length() {
        let tables = Tables::new(Shape::Quad, 4).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let el = Element::new(0, tables, vtx).unwrap();
        let ones = vec![1.0; el.tables.num_points];
        let bottom: f64 = apply_test_and_integrate_side(&el, &ones, 0).iter().sum();
        let right: f64 = apply_test_and_integrate_side(&el, &ones, 1).iter().sum();
        assert!((bottom - 2.0).abs() < 1e-12);
        assert!((right - 1.0).abs() < 1e-12);
    }
}
