//! Transversely isotropic (VTI) elastic kernel in 3D.
//!
//! Pulls {ux, uy, uz}, pushes {ax, ay, az}. The 6×6 stiffness tensor in
//! Voigt order (xx, yy, zz, yz, xz, xy) has the entries
//!
//!   c11 = c22 = ρ VPH², c33 = ρ VPV², c44 = c55 = ρ VSV²,
//!   c66 = ρ VSH², c12 = c11 − 2 c66, c13 = c23 = η (c11 − 2 c44).

use crate::element::Element;
use crate::error::Result;

pub struct Elastic3dKernel {
    rho: Vec<f64>,
    c11: Vec<f64>,
    c12: Vec<f64>,
    c13: Vec<f64>,
    c33: Vec<f64>,
    c44: Vec<f64>,
    c66: Vec<f64>,
    pub v_max: f64,
}

impl Elastic3dKernel {
    pub fn new(element: &Element) -> Result<Elastic3dKernel> {
        let rho = element.param_at_int_pts("RHO")?;
        let vpv = element.param_at_int_pts("VPV")?;
        let vph = element.param_at_int_pts("VPH")?;
        let vsv = element.param_at_int_pts("VSV")?;
        let vsh = element.param_at_int_pts("VSH")?;
        let eta = element.param_at_int_pts("ETA")?;
        let n = rho.len();
        let mut c11 = Vec::with_capacity(n);
        let mut c12 = Vec::with_capacity(n);
        let mut c13 = Vec::with_capacity(n);
        let mut c33 = Vec::with_capacity(n);
        let mut c44 = Vec::with_capacity(n);
        let mut c66 = Vec::with_capacity(n);
        let mut v_max = 0.0_f64;
        for q in 0..n {
            v_max = v_max.max(vpv[q]).max(vph[q]);
            let a11 = rho[q] * vph[q] * vph[q];
            let a33 = rho[q] * vpv[q] * vpv[q];
            let a44 = rho[q] * vsv[q] * vsv[q];
            let a66 = rho[q] * vsh[q] * vsh[q];
            c11.push(a11);
            c33.push(a33);
            c44.push(a44);
            c66.push(a66);
            c12.push(a11 - 2.0 * a66);
            c13.push(eta[q] * (a11 - 2.0 * a44));
        }
        Ok(Elastic3dKernel {
            rho,
            c11,
            c12,
            c13,
            c33,
            c44,
            c66,
            v_max,
        })
    }

    pub fn assemble_mass(&self, element: &Element) -> Vec<f64> {
        element.apply_test_and_integrate(&self.rho)
    }

    pub fn stiffness_term(&self, element: &Element, u: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let gx = element.compute_gradient(&u[0]);
        let gy = element.compute_gradient(&u[1]);
        let gz = element.compute_gradient(&u[2]);
        let n = gx.len();
        // Voigt stress at each node: (xx, yy, zz, yz, xz, xy).
        let mut fx = vec![[0.0; 3]; n];
        let mut fy = vec![[0.0; 3]; n];
        let mut fz = vec![[0.0; 3]; n];
        for q in 0..n {
            let exx = gx[q][0];
            let eyy = gy[q][1];
            let ezz = gz[q][2];
            let eyz = gy[q][2] + gz[q][1];
            let exz = gx[q][2] + gz[q][0];
            let exy = gx[q][1] + gy[q][0];
            let sxx = self.c11[q] * exx + self.c12[q] * eyy + self.c13[q] * ezz;
            let syy = self.c12[q] * exx + self.c11[q] * eyy + self.c13[q] * ezz;
            let szz = self.c13[q] * exx + self.c13[q] * eyy + self.c33[q] * ezz;
            let syz = self.c44[q] * eyz;
            let sxz = self.c44[q] * exz;
            let sxy = self.c66[q] * exy;
            fx[q] = [sxx, sxy, sxz];
            fy[q] = [sxy, syy, syz];
            fz[q] = [sxz, syz, szz];
        }
        vec![
            element.apply_grad_test_and_integrate(&fx),
            element.apply_grad_test_and_integrate(&fy),
            element.apply_grad_test_and_integrate(&fz),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Shape, Tables};

    fn element(shape: Shape) -> Element {
        let tables = Tables::new(shape, 2).unwrap();
        let vtx: Vec<[f64; 3]> = match shape {
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
            _ => unreachable!(),
        };
        let nv = shape.num_vertices();
        let mut el = Element::new(0, tables, vtx).unwrap();
        el.attach_material("RHO", vec![2.0; nv]);
        el.attach_material("VPV", vec![3.0; nv]);
        el.attach_material("VPH", vec![3.0; nv]);
        el.attach_material("VSV", vec![1.5; nv]);
        el.attach_material("VSH", vec![1.5; nv]);
        el.attach_material("ETA", vec![1.0; nv]);
        el
    }

    #[test]
    fn test_isotropic_limit_cij() {
        // With VPV = VPH, VSV = VSH, η = 1 the tensor degenerates to the
        // isotropic λ, μ form: c13 = c12 = λ, c44 = c66 = μ.
        let el = element(Shape::Hex);
        let k = Elastic3dKernel::new(&el).unwrap();
        assert!((k.c11[0] - 18.0).abs() < 1e-12);
        assert!((k.c33[0] - 18.0).abs() < 1e-12);
        assert!((k.c44[0] - 4.5).abs() < 1e-12);
        assert!((k.c66[0] - 4.5).abs() < 1e-12);
        assert!((k.c12[0] - 9.0).abs() < 1e-12);
        assert!((k.c13[0] - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_rigid_translation_has_no_force() {
        for shape in [Shape::Hex, Shape::Tet] {
            let el = element(shape);
            let k = Elastic3dKernel::new(&el).unwrap();
            let np = el.tables.num_points;
            let u = vec![vec![1.0; np], vec![2.0; np], vec![-1.0; np]];
            for comp in k.stiffness_term(&el, &u) {
                for v in comp {
                    assert!(v.abs() < 1e-9, "{:?}: {}", shape, v);
                }
            }
        }
    }

    #[test]
    fn test_mass_scales_with_density() {
        let el = element(Shape::Hex);
        let k = Elastic3dKernel::new(&el).unwrap();
        let sum: f64 = k.assemble_mass(&el).iter().sum();
        assert!((sum - 2.0).abs() < 1e-12);
    }
}
