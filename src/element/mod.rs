//! Per-element operator application.
//!
//! An [`Element`] binds the immutable reference tables to one concrete
//! geometry (vertex coordinates) and its vertex material parameters, and
//! exposes the operator set the physics kernels are built from: gradient,
//! apply-grad-test-and-integrate, apply-test-and-integrate (volume and
//! side), delta-function coefficients, parameter interpolation, and the
//! dense pre-formed stiffness matrix for simplices.
//!
//! Tensor shapes (quad/hex) evaluate everything with sum-factorized 1D
//! contractions and never materialize an operator matrix. Simplices apply
//! their dense reference derivative tables through the cached affine
//! Jacobian.

mod simplex;
mod tensor;

use std::collections::BTreeMap;
use std::sync::Arc;

use faer::Mat;

use crate::error::{EngineError, Result};
use crate::reference::{face_closure_nodes, Shape, Tables};
use crate::shape;

/// Cached constant Jacobian data of an affine (simplex) element.
pub(crate) struct AffineCache {
    /// inv[i][k] = ∂ξ_k/∂x_i (upper-left dim×dim block is meaningful).
    pub inv: [[f64; 3]; 3],
    pub det: f64,
}

/// One concrete element: geometry + materials + reference tables.
pub struct Element {
    pub index: usize,
    pub shape: Shape,
    pub tables: Arc<Tables>,
    pub vtx: Vec<[f64; 3]>,
    pub centroid: [f64; 3],
    params: BTreeMap<String, Vec<f64>>,
    pub(crate) affine: Option<AffineCache>,
    /// Sideset name → local side ids, filled by `set_boundary_conditions`.
    pub boundary_faces: BTreeMap<String, Vec<usize>>,
}

impl Element {
    /// Bind tables to vertex coordinates. Fails with a `GeometryError`
    /// when the Jacobian is non-positive anywhere on the element.
    pub fn new(index: usize, tables: Arc<Tables>, vtx: Vec<[f64; 3]>) -> Result<Self> {
        let shape = tables.shape;
        if vtx.len() != shape.num_vertices() {
            return Err(EngineError::Geometry {
                element: index,
                message: format!(
                    "{} vertices given for a {}",
                    vtx.len(),
                    shape.name()
                ),
            });
        }
        let mut centroid = [0.0; 3];
        for v in &vtx {
            for d in 0..3 {
                centroid[d] += v[d];
            }
        }
        for c in &mut centroid {
            *c /= vtx.len() as f64;
        }

        let affine = match shape {
            Shape::Tri => {
                let (inv2, det) = shape::tri::inverse_jacobian(&vtx, index)?;
                let mut inv = [[0.0; 3]; 3];
                for i in 0..2 {
                    for k in 0..2 {
                        inv[i][k] = inv2[i][k];
                    }
                }
                Some(AffineCache { inv, det })
            }
            Shape::Tet => {
                let (inv, det) = shape::tet::inverse_jacobian(&vtx, index)?;
                Some(AffineCache { inv, det })
            }
            _ => None,
        };

        let el = Element {
            index,
            shape,
            tables,
            vtx,
            centroid,
            params: BTreeMap::new(),
            affine,
            boundary_faces: BTreeMap::new(),
        };
        if shape.is_tensor() {
            // Probe every integration point once so degenerate geometry
            // fails at construction rather than inside the time loop.
            tensor::validate_geometry(&el)?;
        }
        Ok(el)
    }

    /// Attach a named material parameter sampled at the vertices.
    pub fn attach_material(&mut self, name: &str, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.shape.num_vertices());
        self.params.insert(name.to_string(), values);
    }

    pub fn has_material(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Interpolate a vertex parameter to every integration point.
    pub fn param_at_int_pts(&self, name: &str) -> Result<Vec<f64>> {
        let vals = self.params.get(name).ok_or_else(|| {
            EngineError::Config(format!(
                "element {} has no material parameter '{}'",
                self.index, name
            ))
        })?;
        let n = self.tables.num_points;
        let mut out = Vec::with_capacity(n);
        for q in 0..n {
            let xi = self.tables.node_coords(q);
            let w = shape::interpolate_at(self.shape, &xi);
            out.push(w.iter().zip(vals.iter()).map(|(a, b)| a * b).sum());
        }
        Ok(out)
    }

    /// Physical gradient of a nodal field at every integration point.
    pub fn compute_gradient(&self, f: &[f64]) -> Vec<[f64; 3]> {
        match self.shape {
            Shape::Quad | Shape::Hex => tensor::gradient(self, f),
            Shape::Tri | Shape::Tet => simplex::gradient(self, f),
        }
    }

    /// ∫ ∇φ_i · F dΩ for a vector field F given at the integration points.
    pub fn apply_grad_test_and_integrate(&self, f: &[[f64; 3]]) -> Vec<f64> {
        match self.shape {
            Shape::Quad | Shape::Hex => tensor::apply_grad_test_and_integrate(self, f),
            Shape::Tri | Shape::Tet => simplex::apply_grad_test_and_integrate(self, f),
        }
    }

    /// ∫ φ_i f dΩ: r_i = w_i det J_i f_i for the collocated rules.
    pub fn apply_test_and_integrate(&self, f: &[f64]) -> Vec<f64> {
        let n = self.tables.num_points;
        let mut out = vec![0.0; n];
        for q in 0..n {
            out[q] = f[q] * self.tables.weight(q) * self.det_jac_at(q);
        }
        out
    }

    /// Surface integral over one side (edge in 2D, face in 3D): the
    /// result is supported on the side's nodes only.
    pub fn apply_test_and_integrate_side(&self, f: &[f64], side: usize) -> Vec<f64> {
        match self.shape {
            Shape::Quad | Shape::Hex => tensor::apply_test_and_integrate_side(self, f, side),
            Shape::Tri | Shape::Tet => simplex::apply_test_and_integrate_side(self, f, side),
        }
    }

    /// Coefficients c_i = ℓ_i(ξ)/(w_i det J_i) turning a point source at
    /// ξ into an equivalent nodal forcing under the quadrature.
    pub fn delta_coefficients(&self, xi: &[f64]) -> Vec<f64> {
        let mut c = self.tables.interp(xi);
        for (q, v) in c.iter_mut().enumerate() {
            *v /= self.tables.weight(q) * self.det_jac_at(q);
        }
        c
    }

    /// Dense stiffness matrix K_ij = ∫ c ∇ℓ_i · ∇ℓ_j dΩ with the nodal
    /// coefficient field c. Simplices only; tensor shapes apply their
    /// stiffness sum-factorized and never form K.
    pub fn build_stiffness_matrix(&self, c: &[f64]) -> Result<Mat<f64>> {
        match self.shape {
            Shape::Tri | Shape::Tet => Ok(simplex::build_stiffness_matrix(self, c)),
            _ => Err(EngineError::UnsupportedShape(format!(
                "dense stiffness is only pre-formed on simplices, not {}",
                self.shape.name()
            ))),
        }
    }

    /// Physical coordinates of every integration point.
    pub fn build_nodal_points(&self) -> Vec<[f64; 3]> {
        let n = self.tables.num_points;
        let nv = self.shape.num_vertices();
        let mut out = Vec::with_capacity(n);
        for q in 0..n {
            let xi = self.tables.node_coords(q);
            let w = shape::interpolate_at(self.shape, &xi);
            let mut p = [0.0; 3];
            for a in 0..nv {
                for d in 0..3 {
                    p[d] += w[a] * self.vtx[a][d];
                }
            }
            out.push(p);
        }
        out
    }

    /// det J at integration point `q` (tensor order).
    pub fn det_jac_at(&self, q: usize) -> f64 {
        if let Some(aff) = &self.affine {
            return aff.det;
        }
        tensor::det_jac_at(self, q)
    }

    /// Does the physical point lie inside (or on the boundary of) this
    /// element's hull?
    pub fn contains(&self, x: &[f64; 3]) -> bool {
        match self.shape {
            Shape::Quad => shape::quad::check_hull(x[0], x[1], &self.vtx),
            Shape::Hex => shape::hex::check_hull(x[0], x[1], x[2], &self.vtx),
            Shape::Tri => shape::tri::check_hull(x[0], x[1], &self.vtx),
            Shape::Tet => shape::tet::check_hull(x[0], x[1], x[2], &self.vtx),
        }
    }

    /// Reference coordinates of a physical point inside the element.
    pub fn inverse_map(&self, x: &[f64; 3]) -> Option<Vec<f64>> {
        match self.shape {
            Shape::Quad => shape::quad::inverse_map(x[0], x[1], &self.vtx).map(|v| v.to_vec()),
            Shape::Hex => {
                shape::hex::inverse_map(x[0], x[1], x[2], &self.vtx).map(|v| v.to_vec())
            }
            Shape::Tri => shape::tri::inverse_map(x[0], x[1], &self.vtx).map(|v| v.to_vec()),
            Shape::Tet => {
                shape::tet::inverse_map(x[0], x[1], x[2], &self.vtx).map(|v| v.to_vec())
            }
        }
    }

    /// CFL time-step estimate h_e / v_max (the Newmark-2 constant is 1).
    pub fn cfl_estimate(&self, v_max: f64) -> f64 {
        shape::min_edge_length(self.shape, &self.vtx) / v_max
    }

    /// Tensor-order node indices supported on a side.
    pub fn side_nodes(&self, side: usize) -> Vec<usize> {
        face_closure_nodes(&self.tables, side)
    }

    /// Record which of this element's sides lie on named boundaries.
    pub fn set_boundary_conditions(
        &mut self,
        boundary_faces: &BTreeMap<String, BTreeMap<usize, Vec<usize>>>,
    ) {
        for (name, elems) in boundary_faces {
            if let Some(sides) = elems.get(&self.index) {
                self.boundary_faces.insert(name.clone(), sides.clone());
            }
        }
    }

    pub fn is_boundary(&self) -> bool {
        !self.boundary_faces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_element(order: usize) -> Element {
        let tables = Tables::new(Shape::Quad, order).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        Element::new(0, tables, vtx).unwrap()
    }

    #[test]
    fn test_volume_by_quadrature() {
        // Σ w_i det J_i equals the element measure for every shape.
        let el = quad_element(4);
        let ones = vec![1.0; el.tables.num_points];
        let vol: f64 = el.apply_test_and_integrate(&ones).iter().sum();
        assert!((vol - 1.0).abs() < 1e-12, "quad volume {}", vol);

        let tables = Tables::new(Shape::Tri, 3).unwrap();
        let vtx = vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let el = Element::new(1, tables, vtx).unwrap();
        let ones = vec![1.0; el.tables.num_points];
        let vol: f64 = el.apply_test_and_integrate(&ones).iter().sum();
        assert!((vol - 1.0).abs() < 1e-12, "tri area {}", vol);

        let tables = Tables::new(Shape::Tet, 2).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let el = Element::new(2, tables, vtx).unwrap();
        let ones = vec![1.0; el.tables.num_points];
        let vol: f64 = el.apply_test_and_integrate(&ones).iter().sum();
        assert!((vol - 1.0 / 6.0).abs() < 1e-12, "tet volume {}", vol);
    }

    #[test]
    fn test_gradient_of_linear_field() {
        let el = quad_element(3);
        let pts = el.build_nodal_points();
        let f: Vec<f64> = pts.iter().map(|p| 2.0 * p[0] - 3.0 * p[1]).collect();
        for g in el.compute_gradient(&f) {
            assert!((g[0] - 2.0).abs() < 1e-11);
            assert!((g[1] + 3.0).abs() < 1e-11);
        }
    }

    #[test]
    fn test_delta_coefficients_reproduce_unity() {
        // apply_test_and_integrate(delta_coefficients(ξ)) sums to 1.
        for (shape, order, xi) in [
            (Shape::Quad, 3, vec![0.21, -0.43]),
            (Shape::Tri, 3, vec![-0.21, -0.43]),
            (Shape::Hex, 3, vec![0.21, -0.43, 0.17]),
            (Shape::Tet, 3, vec![-0.41, -0.43, -0.17]),
        ] {
            let tables = Tables::new(shape, order).unwrap();
            let vtx: Vec<[f64; 3]> = match shape {
                Shape::Quad => vec![
                    [0.0, 0.0, 0.0],
                    [1.3, 0.1, 0.0],
                    [1.4, 1.2, 0.0],
                    [-0.1, 1.0, 0.0],
                ],
                Shape::Tri => vec![[0.0, 0.0, 0.0], [1.5, 0.2, 0.0], [0.3, 1.1, 0.0]],
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
                    [1.0, 0.1, 0.0],
                    [0.0, 1.2, 0.1],
                    [0.1, 0.0, 0.9],
                ],
            };
            let el = Element::new(0, tables, vtx).unwrap();
            let c = el.delta_coefficients(&xi);
            let total: f64 = el.apply_test_and_integrate(&c).iter().sum();
            assert!(
                (total - 1.0).abs() < 1e-10,
                "{:?}: delta sum {}",
                shape,
                total
            );
        }
    }

    #[test]
    fn test_param_interpolation_linear() {
        let mut el = quad_element(2);
        // A parameter linear in x interpolates exactly.
        el.attach_material("VP", vec![1.0, 2.0, 2.0, 1.0]);
        let pts = el.build_nodal_points();
        let vals = el.param_at_int_pts("VP").unwrap();
        for (p, v) in pts.iter().zip(vals.iter()) {
            assert!((v - (1.0 + p[0])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_material_is_error() {
        let el = quad_element(2);
        assert!(el.param_at_int_pts("VS").is_err());
    }
}
