//! Scalar acoustic kernel: M ü = −∫ ∇φ · (c² ∇u) + f.
//!
//! Pulls {u}, pushes {a}. In the pressure formulation the mass integrand
//! is 1. Tensor shapes apply the stiffness operator sum-factorized with
//! c² = VP² interpolated to the nodes; simplices pre-form the dense K
//! once and apply it as a mat-vec thereafter.

use faer::Mat;

use crate::element::Element;
use crate::error::Result;

pub struct AcousticKernel {
    /// VP² at the integration points (tensor shapes).
    c2: Vec<f64>,
    /// Pre-formed dense stiffness (simplices).
    stiffness: Option<Mat<f64>>,
    pub v_max: f64,
}

impl AcousticKernel {
    pub fn new(element: &Element) -> Result<AcousticKernel> {
        let vp = element.param_at_int_pts("VP")?;
        let v_max = vp.iter().cloned().fold(0.0, f64::max);
        let c2: Vec<f64> = vp.iter().map(|v| v * v).collect();
        let stiffness = if element.shape.is_tensor() {
            None
        } else {
            Some(element.build_stiffness_matrix(&c2)?)
        };
        Ok(AcousticKernel {
            c2,
            stiffness,
            v_max,
        })
    }

    pub fn assemble_mass(&self, element: &Element) -> Vec<f64> {
        let ones = vec![1.0; element.tables.num_points];
        element.apply_test_and_integrate(&ones)
    }

    pub fn stiffness_term(&self, element: &Element, u: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let field = &u[0];
        match &self.stiffness {
            Some(k) => {
                let n = field.len();
                let mut out = vec![0.0; n];
                for i in 0..n {
                    let mut acc = 0.0;
                    for j in 0..n {
                        acc += k[(i, j)] * field[j];
                    }
                    out[i] = acc;
                }
                vec![out]
            }
            None => {
                let mut grad = element.compute_gradient(field);
                for (g, &c2) in grad.iter_mut().zip(self.c2.iter()) {
                    g[0] *= c2;
                    g[1] *= c2;
                    g[2] *= c2;
                }
                vec![element.apply_grad_test_and_integrate(&grad)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{ElementKernel, PhysicsKind};
    use crate::reference::{Shape, Tables};

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
            _ => unreachable!(),
        };
        let mut el = Element::new(0, tables, vtx).unwrap();
        el.attach_material("VP", vec![2.0; shape.num_vertices()]);
        el
    }

    #[test]
    fn test_mass_is_positive_and_sums_to_measure() {
        for (shape, measure) in [(Shape::Quad, 1.0), (Shape::Tri, 0.5)] {
            let el = element(shape, 3);
            let k = AcousticKernel::new(&el).unwrap();
            let m = k.assemble_mass(&el);
            assert!(m.iter().all(|&v| v > 0.0));
            let sum: f64 = m.iter().sum();
            assert!((sum - measure).abs() < 1e-12, "{:?}: {}", shape, sum);
        }
    }

    #[test]
    fn test_stiffness_annihilates_constants() {
        for shape in [Shape::Quad, Shape::Tri] {
            let el = element(shape, 3);
            let k = AcousticKernel::new(&el).unwrap();
            let u = vec![vec![1.0; el.tables.num_points]];
            let r = k.stiffness_term(&el, &u);
            for v in &r[0] {
                assert!(v.abs() < 1e-10, "{:?}: {}", shape, v);
            }
        }
    }

    #[test]
    fn test_stiffness_symmetry_operator() {
        // u·(K v) = v·(K u) for the assembled operator.
        let el = element(Shape::Quad, 3);
        let kern = AcousticKernel::new(&el).unwrap();
        let np = el.tables.num_points;
        let u: Vec<f64> = (0..np).map(|i| (i as f64 * 0.37).sin()).collect();
        let v: Vec<f64> = (0..np).map(|i| (i as f64 * 0.71).cos()).collect();
        let ku = &kern.stiffness_term(&el, &[u.clone()])[0];
        let kv = &kern.stiffness_term(&el, &[v.clone()])[0];
        let ukv: f64 = u.iter().zip(kv.iter()).map(|(a, b)| a * b).sum();
        let vku: f64 = v.iter().zip(ku.iter()).map(|(a, b)| a * b).sum();
        assert!((ukv - vku).abs() < 1e-10 * ukv.abs().max(1.0));
    }

    #[test]
    fn test_source_term_integrates_to_fire_value() {
        use crate::source::{LocalizedSource, Source, SourceTimeFunction};
        let el = element(Shape::Quad, 3);
        let kernel = ElementKernel::new(PhysicsKind::Acoustic, &el).unwrap();
        let src = LocalizedSource {
            source: Source {
                name: "s".into(),
                location: [0.4, 0.6, 0.0],
                num_components: 1,
                direction: vec![1.0],
                stf: SourceTimeFunction::Ricker {
                    amplitude: 3.0,
                    center_freq: 1.0,
                    time_delay: 0.0,
                },
            },
            element: 0,
            xi: el.inverse_map(&[0.4, 0.6, 0.0]).unwrap(),
        };
        let f = kernel.source_term(&el, &[&src], 0.0);
        // ∫ f dΩ = fire(0) since the delta coefficients integrate to 1.
        let total: f64 = el.apply_test_and_integrate(&f[0]).iter().sum();
        assert!((total - 3.0).abs() < 1e-10, "{}", total);
    }
}
