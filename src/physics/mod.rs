//! Physics kernels: constitutive laws on top of the element operators.
//!
//! Each kernel declares the fields it pulls from and pushes into the
//! global DoF vectors, wraps one element, and turns element operators
//! into K·u, the source term, and the elemental mass. The shape × physics
//! combinations are dispatched through the [`ElementKernel`] enum; the
//! hot loops are written once per shape family.

mod acoustic;
mod dirichlet;
mod elastic2d;
mod elastic3d;

pub use acoustic::AcousticKernel;
pub use dirichlet::HomogeneousDirichlet;
pub use elastic2d::Elastic2dKernel;
pub use elastic3d::Elastic3dKernel;

use crate::element::Element;
use crate::error::{EngineError, Result};
use crate::source::LocalizedSource;

/// The supported physics systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsKind {
    Acoustic,
    Elastic2d,
    Elastic3dVti,
}

impl PhysicsKind {
    pub fn parse(name: &str, dim: usize) -> Result<PhysicsKind> {
        match (name, dim) {
            ("acoustic", _) | ("fluid", _) => Ok(PhysicsKind::Acoustic),
            ("elastic", 2) => Ok(PhysicsKind::Elastic2d),
            ("elastic", 3) => Ok(PhysicsKind::Elastic3dVti),
            _ => Err(EngineError::UnsupportedShape(format!(
                "physics '{}' in {}d",
                name, dim
            ))),
        }
    }

    /// The physics system tag used in field registration and logs.
    pub fn system_name(self) -> &'static str {
        match self {
            PhysicsKind::Acoustic => "fluid",
            PhysicsKind::Elastic2d => "2delastic",
            PhysicsKind::Elastic3dVti => "3delastic",
        }
    }

    pub fn components(self) -> usize {
        match self {
            PhysicsKind::Acoustic => 1,
            PhysicsKind::Elastic2d => 2,
            PhysicsKind::Elastic3dVti => 3,
        }
    }

    /// Fields read from the global vectors each step.
    pub fn pull_fields(self) -> &'static [&'static str] {
        match self {
            PhysicsKind::Acoustic => &["u"],
            PhysicsKind::Elastic2d => &["ux", "uy"],
            PhysicsKind::Elastic3dVti => &["ux", "uy", "uz"],
        }
    }

    /// Fields summed into the global vectors each step.
    pub fn push_fields(self) -> &'static [&'static str] {
        match self {
            PhysicsKind::Acoustic => &["a"],
            PhysicsKind::Elastic2d => &["ax", "ay"],
            PhysicsKind::Elastic3dVti => &["ax", "ay", "az"],
        }
    }
}

/// One element's physics kernel with its precomputed material state.
pub enum ElementKernel {
    Acoustic(AcousticKernel),
    Elastic2d(Elastic2dKernel),
    Elastic3d(Elastic3dKernel),
}

impl ElementKernel {
    pub fn new(kind: PhysicsKind, element: &Element) -> Result<ElementKernel> {
        match kind {
            PhysicsKind::Acoustic => Ok(ElementKernel::Acoustic(AcousticKernel::new(element)?)),
            PhysicsKind::Elastic2d => {
                Ok(ElementKernel::Elastic2d(Elastic2dKernel::new(element)?))
            }
            PhysicsKind::Elastic3dVti => {
                Ok(ElementKernel::Elastic3d(Elastic3dKernel::new(element)?))
            }
        }
    }

    pub fn kind(&self) -> PhysicsKind {
        match self {
            ElementKernel::Acoustic(_) => PhysicsKind::Acoustic,
            ElementKernel::Elastic2d(_) => PhysicsKind::Elastic2d,
            ElementKernel::Elastic3d(_) => PhysicsKind::Elastic3dVti,
        }
    }

    /// Diagonal elemental mass in tensor order.
    pub fn assemble_mass(&self, element: &Element) -> Vec<f64> {
        match self {
            ElementKernel::Acoustic(k) => k.assemble_mass(element),
            ElementKernel::Elastic2d(k) => k.assemble_mass(element),
            ElementKernel::Elastic3d(k) => k.assemble_mass(element),
        }
    }

    /// K·u for the pulled displacement components (one Vec per component).
    pub fn stiffness_term(&self, element: &Element, u: &[Vec<f64>]) -> Vec<Vec<f64>> {
        match self {
            ElementKernel::Acoustic(k) => k.stiffness_term(element, u),
            ElementKernel::Elastic2d(k) => k.stiffness_term(element, u),
            ElementKernel::Elastic3d(k) => k.stiffness_term(element, u),
        }
    }

    /// Nodal forcing from the sources owned by this element.
    pub fn source_term(
        &self,
        element: &Element,
        sources: &[&LocalizedSource],
        time: f64,
    ) -> Vec<Vec<f64>> {
        let ncomp = self.kind().components();
        let np = element.tables.num_points;
        let mut out = vec![vec![0.0; np]; ncomp];
        for src in sources {
            let amplitude = src.source.stf.fire(time);
            if amplitude == 0.0 {
                continue;
            }
            let delta = element.delta_coefficients(&src.xi);
            for c in 0..ncomp {
                let dir = if src.source.direction.len() > c {
                    src.source.direction[c]
                } else if ncomp == 1 {
                    1.0
                } else {
                    0.0
                };
                if dir == 0.0 {
                    continue;
                }
                for (o, &d) in out[c].iter_mut().zip(delta.iter()) {
                    *o += amplitude * dir * d;
                }
            }
        }
        out
    }

    /// Largest wave speed on the element, for the CFL estimate.
    pub fn v_max(&self) -> f64 {
        match self {
            ElementKernel::Acoustic(k) => k.v_max,
            ElementKernel::Elastic2d(k) => k.v_max,
            ElementKernel::Elastic3d(k) => k.v_max,
        }
    }

    /// Stable-step estimate C h_e / v_max with C = 1 for Newmark-2.
    pub fn cfl_estimate(&self, element: &Element) -> f64 {
        element.cfl_estimate(self.v_max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Shape, Tables};

    fn quad_element() -> Element {
        let tables = Tables::new(Shape::Quad, 3).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let mut el = Element::new(0, tables, vtx).unwrap();
        el.attach_material("VP", vec![1.0; 4]);
        el
    }

    #[test]
    fn test_kind_fields() {
        assert_eq!(PhysicsKind::Acoustic.pull_fields(), &["u"]);
        assert_eq!(PhysicsKind::Elastic3dVti.push_fields(), &["ax", "ay", "az"]);
        assert_eq!(PhysicsKind::Elastic2d.components(), 2);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            PhysicsKind::parse("elastic", 3).unwrap(),
            PhysicsKind::Elastic3dVti
        );
        assert!(PhysicsKind::parse("magnetic", 2).is_err());
    }

    #[test]
    fn test_acoustic_kernel_missing_material() {
        let tables = Tables::new(Shape::Quad, 2).unwrap();
        let vtx = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let el = Element::new(0, tables, vtx).unwrap();
        assert!(ElementKernel::new(PhysicsKind::Acoustic, &el).is_err());
    }

    #[test]
    fn test_cfl_estimate() {
        let el = quad_element();
        let k = ElementKernel::new(PhysicsKind::Acoustic, &el).unwrap();
        assert!((k.cfl_estimate(&el) - 1.0).abs() < 1e-12);
    }
}
