//! Isotropic elastic kernel in 2D (plane strain).
//!
//! Pulls {ux, uy}, pushes {ax, ay}. Lamé parameters derive from the
//! seismic velocities: μ = ρ VS², λ = ρ (VP² − 2 VS²); stress follows
//! Hooke's law and K·u is assembled component-wise from the shared shape
//! operators.

use crate::element::Element;
use crate::error::Result;

pub struct Elastic2dKernel {
    rho: Vec<f64>,
    lambda: Vec<f64>,
    mu: Vec<f64>,
    pub v_max: f64,
}

impl Elastic2dKernel {
    pub fn new(element: &Element) -> Result<Elastic2dKernel> {
        let vp = element.param_at_int_pts("VP")?;
        let vs = element.param_at_int_pts("VS")?;
        let rho = element.param_at_int_pts("RHO")?;
        let v_max = vp.iter().cloned().fold(0.0, f64::max);
        let n = vp.len();
        let mut lambda = Vec::with_capacity(n);
        let mut mu = Vec::with_capacity(n);
        for q in 0..n {
            mu.push(rho[q] * vs[q] * vs[q]);
            lambda.push(rho[q] * (vp[q] * vp[q] - 2.0 * vs[q] * vs[q]));
        }
        Ok(Elastic2dKernel {
            rho,
            lambda,
            mu,
            v_max,
        })
    }

    pub fn assemble_mass(&self, element: &Element) -> Vec<f64> {
        element.apply_test_and_integrate(&self.rho)
    }

    pub fn stiffness_term(&self, element: &Element, u: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let grad_ux = element.compute_gradient(&u[0]);
        let grad_uy = element.compute_gradient(&u[1]);
        let n = grad_ux.len();
        let mut sxx = vec![0.0; n];
        let mut syy = vec![0.0; n];
        let mut sxy = vec![0.0; n];
        for q in 0..n {
            let exx = grad_ux[q][0];
            let eyy = grad_uy[q][1];
            let gxy = grad_ux[q][1] + grad_uy[q][0];
            let trace = self.lambda[q] * (exx + eyy);
            sxx[q] = trace + 2.0 * self.mu[q] * exx;
            syy[q] = trace + 2.0 * self.mu[q] * eyy;
            sxy[q] = self.mu[q] * gxy;
        }
        let fx: Vec<[f64; 3]> = (0..n).map(|q| [sxx[q], sxy[q], 0.0]).collect();
        let fy: Vec<[f64; 3]> = (0..n).map(|q| [sxy[q], syy[q], 0.0]).collect();
        vec![
            element.apply_grad_test_and_integrate(&fx),
            element.apply_grad_test_and_integrate(&fy),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Shape, Tables};

    fn element(shape: Shape) -> Element {
        let tables = Tables::new(shape, 3).unwrap();
        let vtx: Vec<[f64; 3]> = match shape {
            Shape::Quad => vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            Shape::Tri => vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            _ => unreachable!(),
        };
        let nv = shape.num_vertices();
        let mut el = Element::new(0, tables, vtx).unwrap();
        el.attach_material("VP", vec![2.0; nv]);
        el.attach_material("VS", vec![1.0; nv]);
        el.attach_material("RHO", vec![1.5; nv]);
        el
    }

    #[test]
    fn test_mass_uses_density() {
        let el = element(Shape::Quad);
        let k = Elastic2dKernel::new(&el).unwrap();
        let sum: f64 = k.assemble_mass(&el).iter().sum();
        // ∫ ρ over the unit square.
        assert!((sum - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rigid_translation_has_no_force() {
        for shape in [Shape::Quad, Shape::Tri] {
            let el = element(shape);
            let k = Elastic2dKernel::new(&el).unwrap();
            let np = el.tables.num_points;
            let u = vec![vec![0.7; np], vec![-0.3; np]];
            let r = k.stiffness_term(&el, &u);
            for comp in &r {
                for v in comp {
                    assert!(v.abs() < 1e-10, "{:?}: {}", shape, v);
                }
            }
        }
    }

    #[test]
    fn test_lame_parameters() {
        let el = element(Shape::Quad);
        let k = Elastic2dKernel::new(&el).unwrap();
        // μ = ρ VS² = 1.5, λ = ρ(VP² − 2VS²) = 1.5·2 = 3.
        assert!((k.mu[0] - 1.5).abs() < 1e-12);
        assert!((k.lambda[0] - 3.0).abs() < 1e-12);
    }
}
