//! Mass-lumped nodal bases on the reference triangle and tetrahedron.
//!
//! Simplices admit no tensor-product structure, so the interpolation,
//! differentiation and quadrature tables are full-dimensional. The node
//! sets are the classical mass-lumped spectral elements: the polynomial
//! space P_N is enriched with bubble modes so that a quadrature rule
//! collocated with the nodes exists with strictly positive weights.
//!
//! Reference triangle: (-1,-1), (1,-1), (-1,1), area 2.
//! Reference tetrahedron: (-1,-1,-1), (1,-1,-1), (-1,1,-1), (-1,-1,1),
//! volume 4/3.
//!
//! Supported spaces:
//! - triangle order 1: P1 on the 3 vertices
//! - triangle order 2: P2 ⊕ bubble, 7 nodes, rule exact to degree 3
//! - triangle order 3: P3 ⊕ b·P1, 12 nodes, rule exact to degree 5
//! - tetrahedron order 1: P1 on the 4 vertices
//! - tetrahedron order 2: P2 ⊕ face bubbles ⊕ volume bubble, 15 nodes
//! - tetrahedron order 3: P3 ⊕ face-bubble modes ⊕ b_v·P1, 32 nodes,
//!   rule exact through degree 5
//!
//! The rule parameters below are the (unique) positive solutions of the
//! symmetric moment conditions for each node orbit; they satisfy the
//! quoted exactness degrees to machine precision (asserted in the tests).

use faer::linalg::solvers::Solve;
use faer::Mat;

use crate::error::{EngineError, Result};

/// Highest supported polynomial order on triangles.
pub const TRI_MAX_ORDER: usize = 3;
/// Highest supported polynomial order on tetrahedra.
pub const TET_MAX_ORDER: usize = 3;

// Degree-3 triangle: edge nodes at parameter ALPHA along each edge,
// interior orbit at barycentric (BETA, BETA, 1-2*BETA).
const TRI3_ALPHA: f64 = 0.293_469_555_909_039_78;
const TRI3_BETA: f64 = 0.207_345_175_663_591_01;
const TRI3_WV: f64 = 0.029_745_826_049_641_006;
const TRI3_WE: f64 = 0.097_683_362_468_102_261;
const TRI3_WI: f64 = 0.441_554_115_680_821_15;

// Degree-2 triangle: vertices, edge midpoints, centroid (area 2).
const TRI2_WV: f64 = 0.1;
const TRI2_WE: f64 = 4.0 / 15.0;
const TRI2_WC: f64 = 0.9;

// Degree-2 tetrahedron: vertices, edge midpoints, face centroids, centroid
// (volume 4/3).
const TET2_WV: f64 = 17.0 / 630.0;
const TET2_WE: f64 = 16.0 / 315.0;
const TET2_WF: f64 = 9.0 / 70.0;
const TET2_WC: f64 = 128.0 / 315.0;

// Degree-3 tetrahedron: edge nodes at ALPHA, face orbit at
// (BETA, BETA, 1-2*BETA) in face barycentrics, interior orbit at
// (1/6, 1/6, 1/6, 1/2).
const TET3_ALPHA: f64 = 0.314_210_342_418_032_47;
const TET3_BETA: f64 = 0.215_482_203_135_576_01;
const TET3_GAMMA: f64 = 1.0 / 6.0;
const TET3_WV: f64 = 0.005_495_058_880_202_884_3;
const TET3_WE: f64 = 0.012_086_251_930_820_911;
const TET3_WF: f64 = 0.040_050_315_744_032_366;
const TET3_WI: f64 = 6.0 / 35.0;

/// Local edge vertex pairs of the reference triangle.
pub const TRI_EDGES: [(usize, usize); 3] = [(0, 1), (1, 2), (2, 0)];
/// Local edge vertex pairs of the reference tetrahedron.
pub const TET_EDGES: [(usize, usize); 6] = [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)];
/// Local face vertex triples of the reference tetrahedron.
pub const TET_FACES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (1, 2, 3), (0, 2, 3)];

/// Nodal basis tables for one simplex shape and order.
pub struct SimplexBasis {
    pub dim: usize,
    pub order: usize,
    pub num_points: usize,
    /// Node coordinates on the reference element (t component 0 in 2D).
    pub points: Vec<[f64; 3]>,
    /// Barycentric coordinates of the nodes (fourth component 0 in 2D).
    pub bary: Vec<[f64; 4]>,
    /// Positive collocation weights; Σ w_i equals the reference measure.
    pub weights: Vec<f64>,
    /// Nodal derivative tables: d_r[(i, j)] = ∂ℓ_j/∂r at node i.
    pub d_r: Mat<f64>,
    pub d_s: Mat<f64>,
    pub d_t: Mat<f64>,
    /// Per local edge, node indices ordered along the edge direction.
    pub edge_nodes: Vec<Vec<usize>>,
    /// 3D only: per local face, node indices in vertex-associated order.
    pub face_nodes: Vec<Vec<usize>>,
    /// Element-private interior nodes.
    pub interior_nodes: Vec<usize>,
    /// Per side (edge in 2D, face in 3D): quadrature weights on the
    /// reference side, aligned with [`SimplexBasis::side_nodes`].
    pub side_weights: Vec<Vec<f64>>,
    v_inv: Mat<f64>,
}

impl SimplexBasis {
    pub fn triangle(order: usize) -> Result<Self> {
        if order == 0 || order > TRI_MAX_ORDER {
            return Err(EngineError::UnsupportedOrder {
                shape: "triangle",
                order,
                max: TRI_MAX_ORDER,
            });
        }
        let (bary, weights) = tri_nodes_weights(order);
        let points: Vec<[f64; 3]> = bary.iter().map(|l| tri_bary_to_ref(l)).collect();
        let n = points.len();

        let mut v = Mat::zeros(n, n);
        for (i, p) in points.iter().enumerate() {
            let row = tri_modes(order, p[0], p[1]);
            for (m, val) in row.iter().enumerate() {
                v[(i, m)] = *val;
            }
        }
        let v_inv = invert(&v);

        let mut d_r = Mat::zeros(n, n);
        let mut d_s = Mat::zeros(n, n);
        for (i, p) in points.iter().enumerate() {
            let (gr, gs) = tri_mode_grads(order, p[0], p[1]);
            for j in 0..n {
                let mut dr = 0.0;
                let mut ds = 0.0;
                for m in 0..n {
                    dr += v_inv[(m, j)] * gr[m];
                    ds += v_inv[(m, j)] * gs[m];
                }
                d_r[(i, j)] = dr;
                d_s[(i, j)] = ds;
            }
        }

        let k = order.saturating_sub(1);
        let mut edge_nodes = Vec::with_capacity(3);
        for e in 0..3 {
            edge_nodes.push((0..k).map(|p| 3 + e * k + p).collect());
        }
        let interior_nodes: Vec<usize> = (3 + 3 * k..n).collect();

        let mut basis = SimplexBasis {
            dim: 2,
            order,
            num_points: n,
            points,
            bary,
            weights,
            d_r,
            d_s,
            d_t: Mat::zeros(0, 0),
            edge_nodes,
            face_nodes: Vec::new(),
            interior_nodes,
            side_weights: Vec::new(),
            v_inv,
        };
        let side_weights = (0..3).map(|s| basis.tri_side_weights(s)).collect();
        basis.side_weights = side_weights;
        Ok(basis)
    }

    pub fn tetrahedron(order: usize) -> Result<Self> {
        if order == 0 || order > TET_MAX_ORDER {
            return Err(EngineError::UnsupportedOrder {
                shape: "tetrahedron",
                order,
                max: TET_MAX_ORDER,
            });
        }
        let (bary, weights) = tet_nodes_weights(order);
        let points: Vec<[f64; 3]> = bary.iter().map(|l| tet_bary_to_ref(l)).collect();
        let n = points.len();

        let mut v = Mat::zeros(n, n);
        for (i, p) in points.iter().enumerate() {
            let row = tet_modes(order, p[0], p[1], p[2]);
            for (m, val) in row.iter().enumerate() {
                v[(i, m)] = *val;
            }
        }
        let v_inv = invert(&v);

        let mut d_r = Mat::zeros(n, n);
        let mut d_s = Mat::zeros(n, n);
        let mut d_t = Mat::zeros(n, n);
        for (i, p) in points.iter().enumerate() {
            let (gr, gs, gt) = tet_mode_grads(order, p[0], p[1], p[2]);
            for j in 0..n {
                let mut dr = 0.0;
                let mut ds = 0.0;
                let mut dt = 0.0;
                for m in 0..n {
                    dr += v_inv[(m, j)] * gr[m];
                    ds += v_inv[(m, j)] * gs[m];
                    dt += v_inv[(m, j)] * gt[m];
                }
                d_r[(i, j)] = dr;
                d_s[(i, j)] = ds;
                d_t[(i, j)] = dt;
            }
        }

        let k = order.saturating_sub(1);
        let per_face = match order {
            1 => 0,
            2 => 1,
            _ => 3,
        };
        let mut edge_nodes = Vec::with_capacity(6);
        for e in 0..6 {
            edge_nodes.push((0..k).map(|p| 4 + e * k + p).collect());
        }
        let face_base = 4 + 6 * k;
        let mut face_nodes = Vec::with_capacity(4);
        for f in 0..4 {
            face_nodes.push((0..per_face).map(|p| face_base + f * per_face + p).collect());
        }
        let interior_nodes: Vec<usize> = (face_base + 4 * per_face..n).collect();

        let mut basis = SimplexBasis {
            dim: 3,
            order,
            num_points: n,
            points,
            bary,
            weights,
            d_r,
            d_s,
            d_t,
            edge_nodes,
            face_nodes,
            interior_nodes,
            side_weights: Vec::new(),
            v_inv,
        };
        let side_weights = (0..4).map(|f| basis.tet_face_weights(f)).collect();
        basis.side_weights = side_weights;
        Ok(basis)
    }

    /// All nodes supported on a side (edge in 2D, face in 3D), in the
    /// side's traversal order: vertices, then edge interiors, then face
    /// nodes.
    pub fn side_nodes(&self, side: usize) -> Vec<usize> {
        if self.dim == 2 {
            let (a, b) = TRI_EDGES[side];
            let mut out = vec![a];
            out.extend(self.edge_nodes[side].iter().copied());
            out.push(b);
            out
        } else {
            let (f0, f1, f2) = TET_FACES[side];
            let mut out = vec![f0, f1, f2];
            for (a, b) in [(f0, f1), (f1, f2), (f2, f0)] {
                let (e, reversed) = tet_edge_lookup(a, b);
                if reversed {
                    out.extend(self.edge_nodes[e].iter().rev().copied());
                } else {
                    out.extend(self.edge_nodes[e].iter().copied());
                }
            }
            out.extend(self.face_nodes[side].iter().copied());
            out
        }
    }

    /// Interpolatory quadrature weights along a triangle edge: the trace
    /// space on an edge is the full 1D polynomial space on its nodes, so
    /// the weights come from the 1D moment conditions.
    fn tri_side_weights(&self, side: usize) -> Vec<f64> {
        let nodes = self.side_nodes(side);
        let (_, b) = TRI_EDGES[side];
        let xs: Vec<f64> = nodes.iter().map(|&i| 2.0 * self.bary[i][b] - 1.0).collect();
        let m = xs.len();
        let mut v = Mat::zeros(m, m);
        let mut rhs = Mat::zeros(m, 1);
        for k in 0..m {
            for (p, &x) in xs.iter().enumerate() {
                v[(k, p)] = x.powi(k as i32);
            }
            rhs[(k, 0)] = if k % 2 == 0 { 2.0 / (k + 1) as f64 } else { 0.0 };
        }
        let sol = v.as_ref().full_piv_lu().solve(&rhs);
        (0..m).map(|p| sol[(p, 0)]).collect()
    }

    /// Interpolatory quadrature weights on a tetrahedron face. The face
    /// trace of the enriched space equals the matching triangle space, so
    /// the weights solve the triangle mode moment conditions at the face
    /// node positions.
    fn tet_face_weights(&self, face: usize) -> Vec<f64> {
        let (f0, f1, f2) = TET_FACES[face];
        let nodes = self.side_nodes(face);
        let m = nodes.len();
        let moments = tri_mode_integrals(self.order);
        debug_assert_eq!(moments.len(), m);
        let mut v = Mat::zeros(m, m);
        let mut rhs = Mat::zeros(m, 1);
        for (p, &node) in nodes.iter().enumerate() {
            let l = self.bary[node];
            let (lf0, lf1, lf2) = (l[f0], l[f1], l[f2]);
            let r = -lf0 + lf1 - lf2;
            let s = -lf0 - lf1 + lf2;
            let modes = tri_modes(self.order, r, s);
            for k in 0..m {
                v[(k, p)] = modes[k];
            }
        }
        for k in 0..m {
            rhs[(k, 0)] = moments[k];
        }
        let sol = v.as_ref().full_piv_lu().solve(&rhs);
        (0..m).map(|p| sol[(p, 0)]).collect()
    }

    /// Lagrange basis values ℓ_j(ξ) at an arbitrary reference point.
    pub fn interpolate(&self, xi: &[f64]) -> Vec<f64> {
        let n = self.num_points;
        let modes = if self.dim == 2 {
            tri_modes(self.order, xi[0], xi[1])
        } else {
            tet_modes(self.order, xi[0], xi[1], xi[2])
        };
        let mut out = vec![0.0; n];
        for (j, o) in out.iter_mut().enumerate() {
            let mut s = 0.0;
            for m in 0..n {
                s += self.v_inv[(m, j)] * modes[m];
            }
            *o = s;
        }
        out
    }
}

fn invert(v: &Mat<f64>) -> Mat<f64> {
    let n = v.nrows();
    let lu = v.as_ref().full_piv_lu();
    let mut rhs = Mat::zeros(n, n);
    for i in 0..n {
        rhs[(i, i)] = 1.0;
    }
    lu.solve(&rhs)
}

// ---------------------------------------------------------------------------
// Triangle node sets
// ---------------------------------------------------------------------------

fn tri_bary_to_ref(l: &[f64; 4]) -> [f64; 3] {
    [-l[0] + l[1] - l[2], -l[0] - l[1] + l[2], 0.0]
}

fn tri_nodes_weights(order: usize) -> (Vec<[f64; 4]>, Vec<f64>) {
    let mut bary: Vec<[f64; 4]> = vec![
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ];
    match order {
        1 => {
            let w = vec![2.0 / 3.0; 3];
            (bary, w)
        }
        2 => {
            for (a, b) in TRI_EDGES {
                let mut l = [0.0; 4];
                l[a] = 0.5;
                l[b] = 0.5;
                bary.push(l);
            }
            let third = 1.0 / 3.0;
            bary.push([third, third, third, 0.0]);
            let mut w = vec![TRI2_WV; 3];
            w.extend(vec![TRI2_WE; 3]);
            w.push(TRI2_WC);
            (bary, w)
        }
        _ => {
            for (a, b) in TRI_EDGES {
                for pos in [TRI3_ALPHA, 1.0 - TRI3_ALPHA] {
                    let mut l = [0.0; 4];
                    l[a] = 1.0 - pos;
                    l[b] = pos;
                    bary.push(l);
                }
            }
            // Interior orbit, one node associated with each vertex.
            let b = TRI3_BETA;
            for i in 0..3 {
                let mut l = [b, b, b, 0.0];
                l[i] = 1.0 - 2.0 * b;
                bary.push(l);
            }
            let mut w = vec![TRI3_WV; 3];
            w.extend(vec![TRI3_WE; 6]);
            w.extend(vec![TRI3_WI; 3]);
            (bary, w)
        }
    }
}

fn tri_lambda(r: f64, s: f64) -> [f64; 3] {
    [-(r + s) / 2.0, (r + 1.0) / 2.0, (s + 1.0) / 2.0]
}

// dλ/d(r,s) for the reference triangle.
const TRI_DLAM: [[f64; 2]; 3] = [[-0.5, -0.5], [0.5, 0.0], [0.0, 0.5]];

fn tri_modes(order: usize, r: f64, s: f64) -> Vec<f64> {
    let mut out = Vec::new();
    for total in 0..=order {
        for a in 0..=total {
            let b = total - a;
            out.push(r.powi(a as i32) * s.powi(b as i32));
        }
    }
    let l = tri_lambda(r, s);
    let bubble = l[0] * l[1] * l[2];
    match order {
        2 => out.push(bubble),
        3 => {
            out.push(bubble * r);
            out.push(bubble * s);
        }
        _ => {}
    }
    out
}

fn tri_mode_grads(order: usize, r: f64, s: f64) -> (Vec<f64>, Vec<f64>) {
    let mut gr = Vec::new();
    let mut gs = Vec::new();
    for total in 0..=order {
        for a in 0..=total {
            let b = total - a;
            let (ai, bi) = (a as i32, b as i32);
            gr.push(if a > 0 {
                a as f64 * r.powi(ai - 1) * s.powi(bi)
            } else {
                0.0
            });
            gs.push(if b > 0 {
                b as f64 * r.powi(ai) * s.powi(bi - 1)
            } else {
                0.0
            });
        }
    }
    let l = tri_lambda(r, s);
    let bubble = l[0] * l[1] * l[2];
    let db_dr = TRI_DLAM[0][0] * l[1] * l[2] + l[0] * TRI_DLAM[1][0] * l[2] + l[0] * l[1] * TRI_DLAM[2][0];
    let db_ds = TRI_DLAM[0][1] * l[1] * l[2] + l[0] * TRI_DLAM[1][1] * l[2] + l[0] * l[1] * TRI_DLAM[2][1];
    match order {
        2 => {
            gr.push(db_dr);
            gs.push(db_ds);
        }
        3 => {
            gr.push(db_dr * r + bubble);
            gs.push(db_ds * r);
            gr.push(db_dr * s);
            gs.push(db_ds * s + bubble);
        }
        _ => {}
    }
    (gr, gs)
}

// ---------------------------------------------------------------------------
// Tetrahedron node sets
// ---------------------------------------------------------------------------

fn tet_bary_to_ref(l: &[f64; 4]) -> [f64; 3] {
    [
        -l[0] + l[1] - l[2] - l[3],
        -l[0] - l[1] + l[2] - l[3],
        -l[0] - l[1] - l[2] + l[3],
    ]
}

fn tet_nodes_weights(order: usize) -> (Vec<[f64; 4]>, Vec<f64>) {
    let mut bary: Vec<[f64; 4]> = vec![
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    match order {
        1 => {
            let w = vec![1.0 / 3.0; 4];
            (bary, w)
        }
        2 => {
            for (a, b) in TET_EDGES {
                let mut l = [0.0; 4];
                l[a] = 0.5;
                l[b] = 0.5;
                bary.push(l);
            }
            let third = 1.0 / 3.0;
            for (a, b, c) in TET_FACES {
                let mut l = [0.0; 4];
                l[a] = third;
                l[b] = third;
                l[c] = third;
                bary.push(l);
            }
            bary.push([0.25; 4]);
            let mut w = vec![TET2_WV; 4];
            w.extend(vec![TET2_WE; 6]);
            w.extend(vec![TET2_WF; 4]);
            w.push(TET2_WC);
            (bary, w)
        }
        _ => {
            for (a, b) in TET_EDGES {
                for pos in [TET3_ALPHA, 1.0 - TET3_ALPHA] {
                    let mut l = [0.0; 4];
                    l[a] = 1.0 - pos;
                    l[b] = pos;
                    bary.push(l);
                }
            }
            // Face orbit: per face, one node associated with each face
            // vertex (the large barycentric coordinate marks the vertex).
            let b = TET3_BETA;
            for (f0, f1, f2) in TET_FACES {
                for big in [f0, f1, f2] {
                    let mut l = [0.0; 4];
                    l[f0] = b;
                    l[f1] = b;
                    l[f2] = b;
                    l[big] = 1.0 - 2.0 * b;
                    bary.push(l);
                }
            }
            // Interior orbit, vertex-associated.
            let g = TET3_GAMMA;
            for i in 0..4 {
                let mut l = [g; 4];
                l[i] = 1.0 - 3.0 * g;
                bary.push(l);
            }
            let mut w = vec![TET3_WV; 4];
            w.extend(vec![TET3_WE; 12]);
            w.extend(vec![TET3_WF; 12]);
            w.extend(vec![TET3_WI; 4]);
            (bary, w)
        }
    }
}

fn tet_lambda(r: f64, s: f64, t: f64) -> [f64; 4] {
    [
        -(1.0 + r + s + t) / 2.0,
        (r + 1.0) / 2.0,
        (s + 1.0) / 2.0,
        (t + 1.0) / 2.0,
    ]
}

const TET_DLAM: [[f64; 3]; 4] = [
    [-0.5, -0.5, -0.5],
    [0.5, 0.0, 0.0],
    [0.0, 0.5, 0.0],
    [0.0, 0.0, 0.5],
];

/// Gradient of a product of barycentric coordinates (with repetition).
fn lambda_product_grad(idxs: &[usize], l: &[f64; 4]) -> [f64; 3] {
    let mut g = [0.0; 3];
    for k in 0..idxs.len() {
        let mut term = 1.0;
        for (kk, &idx) in idxs.iter().enumerate() {
            if kk != k {
                term *= l[idx];
            }
        }
        for c in 0..3 {
            g[c] += TET_DLAM[idxs[k]][c] * term;
        }
    }
    g
}

fn tet_monomial_count(order: usize) -> usize {
    (order + 1) * (order + 2) * (order + 3) / 6
}

fn tet_modes(order: usize, r: f64, s: f64, t: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(tet_monomial_count(order) + 12);
    for total in 0..=order {
        for a in 0..=total {
            for b in 0..=(total - a) {
                let c = total - a - b;
                out.push(r.powi(a as i32) * s.powi(b as i32) * t.powi(c as i32));
            }
        }
    }
    let l = tet_lambda(r, s, t);
    match order {
        2 => {
            for (f0, f1, f2) in TET_FACES {
                out.push(l[f0] * l[f1] * l[f2]);
            }
            out.push(l[0] * l[1] * l[2] * l[3]);
        }
        3 => {
            for (f0, f1, f2) in TET_FACES {
                let bf = l[f0] * l[f1] * l[f2];
                out.push(bf * (l[f1] - l[f0]));
                out.push(bf * (l[f2] - l[f0]));
            }
            let bv = l[0] * l[1] * l[2] * l[3];
            out.push(bv);
            for i in 0..3 {
                out.push(bv * l[i]);
            }
        }
        _ => {}
    }
    out
}

fn tet_mode_grads(order: usize, r: f64, s: f64, t: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = tet_monomial_count(order);
    let mut gr = Vec::with_capacity(n + 12);
    let mut gs = Vec::with_capacity(n + 12);
    let mut gt = Vec::with_capacity(n + 12);
    for total in 0..=order {
        for a in 0..=total {
            for b in 0..=(total - a) {
                let c = total - a - b;
                let (ai, bi, ci) = (a as i32, b as i32, c as i32);
                gr.push(if a > 0 {
                    a as f64 * r.powi(ai - 1) * s.powi(bi) * t.powi(ci)
                } else {
                    0.0
                });
                gs.push(if b > 0 {
                    b as f64 * r.powi(ai) * s.powi(bi - 1) * t.powi(ci)
                } else {
                    0.0
                });
                gt.push(if c > 0 {
                    c as f64 * r.powi(ai) * s.powi(bi) * t.powi(ci - 1)
                } else {
                    0.0
                });
            }
        }
    }
    let l = tet_lambda(r, s, t);
    let mut push = |g: [f64; 3], gr: &mut Vec<f64>, gs: &mut Vec<f64>, gt: &mut Vec<f64>| {
        gr.push(g[0]);
        gs.push(g[1]);
        gt.push(g[2]);
    };
    match order {
        2 => {
            for (f0, f1, f2) in TET_FACES {
                push(lambda_product_grad(&[f0, f1, f2], &l), &mut gr, &mut gs, &mut gt);
            }
            push(lambda_product_grad(&[0, 1, 2, 3], &l), &mut gr, &mut gs, &mut gt);
        }
        3 => {
            for (f0, f1, f2) in TET_FACES {
                for other in [f1, f2] {
                    // b_f (λ_other − λ_f0) = λ_f0 λ_f1 λ_f2 λ_other − λ_f0² λ_f1 λ_f2
                    let ga = lambda_product_grad(&[f0, f1, f2, other], &l);
                    let gb = lambda_product_grad(&[f0, f0, f1, f2], &l);
                    push(
                        [ga[0] - gb[0], ga[1] - gb[1], ga[2] - gb[2]],
                        &mut gr,
                        &mut gs,
                        &mut gt,
                    );
                }
            }
            push(lambda_product_grad(&[0, 1, 2, 3], &l), &mut gr, &mut gs, &mut gt);
            for i in 0..3 {
                push(lambda_product_grad(&[0, 1, 2, 3, i], &l), &mut gr, &mut gs, &mut gt);
            }
        }
        _ => {}
    }
    (gr, gs, gt)
}

/// Local edge id and reversal flag for a directed tetrahedron edge.
fn tet_edge_lookup(a: usize, b: usize) -> (usize, bool) {
    for (e, &(ea, eb)) in TET_EDGES.iter().enumerate() {
        if (ea, eb) == (a, b) {
            return (e, false);
        }
        if (ea, eb) == (b, a) {
            return (e, true);
        }
    }
    unreachable!("({}, {}) is not a tetrahedron edge", a, b)
}

/// Exact integrals of the triangle mode set over the reference triangle,
/// evaluated with a Duffy-mapped Gauss grid well beyond the mode degree.
fn tri_mode_integrals(order: usize) -> Vec<f64> {
    let g = gauss_legendre(10);
    let count = tri_modes(order, 0.0, 0.0).len();
    let mut out = vec![0.0; count];
    for &(x1, w1) in &g {
        for &(x2, w2) in &g {
            let u = (1.0 + x1) / 2.0;
            let v = (1.0 + x2) / 2.0 * (1.0 - u);
            let r = 2.0 * u - 1.0;
            let s = 2.0 * v - 1.0;
            let scale = w1 * w2 * (1.0 - u);
            for (k, m) in tri_modes(order, r, s).iter().enumerate() {
                out[k] += scale * m;
            }
        }
    }
    out
}

/// Gauss-Legendre nodes and weights on [-1, 1] by Newton iteration.
pub(crate) fn gauss_legendre(n: usize) -> Vec<(f64, f64)> {
    use crate::polynomial::legendre_and_derivative;
    let mut out = Vec::with_capacity(n);
    for i in 1..=n {
        let mut x = (std::f64::consts::PI * (i as f64 - 0.25) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_and_derivative(n, x);
        out.push((x, 2.0 / ((1.0 - x * x) * dp * dp)));
    }
    out
}
