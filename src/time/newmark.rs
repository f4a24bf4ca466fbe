//! Second-order explicit Newmark scheme.
//!
//! Per step, for every recognized (u, v, a, a_) quadruple and in this
//! fixed order:
//!
//!   v  ← v + ½Δt (a + a_)
//!   u  ← u + Δt v + ½Δt² a
//!   a_ ← a
//!
//! where a is the acceleration just produced by the mass solve and a_ is
//! the one from the previous step.

use crate::assembly::{Field, FieldDict, Section};
use crate::element::Element;
use crate::error::{EngineError, Result};
use crate::physics::{ElementKernel, PhysicsKind};

/// Global fields required by this scheme for a physics system.
pub fn physics_to_fields(kind: PhysicsKind) -> Vec<&'static str> {
    match kind {
        PhysicsKind::Acoustic => vec!["u", "v", "a", "a_"],
        PhysicsKind::Elastic2d => vec!["ux", "vx", "ax", "ax_", "uy", "vy", "ay", "ay_"],
        PhysicsKind::Elastic3dVti => vec![
            "ux", "vx", "ax", "ax_", "uy", "vy", "ay", "ay_", "uz", "vz", "az", "az_",
        ],
    }
}

/// Recognized component suffixes, scanned in a fixed order.
const COMPONENTS: [&str; 4] = ["", "x", "y", "z"];

pub struct Order2Newmark {
    pub dt: f64,
    pub duration: f64,
    pub num_steps: usize,
    pub time: f64,
    pub step: usize,
    pub blowup_sentinel: f64,
}

impl Order2Newmark {
    /// The time step is adjusted downward so the duration is an integer
    /// number of steps.
    pub fn new(duration: f64, dt: f64) -> Order2Newmark {
        let num_steps = (duration / dt).ceil() as usize;
        let dt = duration / num_steps as f64;
        Order2Newmark {
            dt,
            duration,
            num_steps,
            time: 0.0,
            step: 0,
            blowup_sentinel: 5.0,
        }
    }

    pub fn finished(&self) -> bool {
        self.step >= self.num_steps
    }

    /// Build the field dictionary: assemble the diagonal mass into `mi`,
    /// reciprocate it, and register the scheme's global fields.
    pub fn initialize_global_dofs(
        &self,
        elements: &[Element],
        kernels: &[ElementKernel],
        section: &Section,
        kind: PhysicsKind,
    ) -> Result<FieldDict> {
        let n = section.num_dofs;
        let mut fields = FieldDict::new();

        let mut mi = Field::new("mi", n);
        for (el, kernel) in elements.iter().zip(kernels.iter()) {
            let m = kernel.assemble_mass(el);
            section.closure_set_add(&mut mi.local, el.index, &m);
        }
        mi.local_to_global_add();
        // Component-wise reciprocal; a zero row means broken assembly.
        for (i, v) in mi.global.iter_mut().enumerate() {
            if *v <= 0.0 {
                return Err(EngineError::Geometry {
                    element: usize::MAX,
                    message: format!("assembled mass is {v:.3e} on DoF {i}"),
                });
            }
            *v = 1.0 / *v;
        }
        mi.global_to_local_insert();
        fields.insert("mi".to_string(), mi);

        for name in physics_to_fields(kind) {
            fields.insert(name.to_string(), Field::new(name, n));
        }
        Ok(fields)
    }

    /// a ← mi ⊙ a on the assembled global accelerations.
    pub fn apply_inverse_mass(&self, fields: &mut FieldDict, kind: PhysicsKind) {
        let mi = fields["mi"].global.clone();
        for name in kind.push_fields() {
            let a = fields.get_mut(*name).expect("push field registered");
            for (v, m) in a.global.iter_mut().zip(mi.iter()) {
                *v *= m;
            }
        }
    }

    /// Advance every recognized (u, v, a, a_) quadruple and the clock.
    pub fn take_time_step(&mut self, fields: &mut FieldDict) {
        let acl_factor = 0.5 * self.dt;
        let dsp_factor = 0.5 * self.dt * self.dt;
        for comp in COMPONENTS {
            let a_name = format!("a{comp}");
            if !fields.contains_key(&a_name) {
                continue;
            }
            let a = fields[&a_name].global.clone();
            let a_hist = fields[&format!("a{comp}_")].global.clone();

            let v = fields.get_mut(&format!("v{comp}")).expect("velocity field");
            for i in 0..a.len() {
                v.global[i] += acl_factor * (a[i] + a_hist[i]);
            }
            let v_now = v.global.clone();
            let u = fields
                .get_mut(&format!("u{comp}"))
                .expect("displacement field");
            for i in 0..a.len() {
                u.global[i] += self.dt * v_now[i] + dsp_factor * a[i];
            }
            let hist = fields.get_mut(&format!("a{comp}_")).expect("history field");
            hist.global.copy_from_slice(&a);
        }
        self.time += self.dt;
        self.step += 1;
    }

    /// Abort when any displacement DoF exceeds the sentinel.
    pub fn check_blowup(&self, fields: &FieldDict, kind: PhysicsKind) -> Result<()> {
        for name in kind.pull_fields() {
            let u = &fields[*name].global;
            for &v in u {
                if v.abs() > self.blowup_sentinel {
                    return Err(EngineError::NumericalBlowup {
                        value: v.abs(),
                        sentinel: self.blowup_sentinel,
                        time: self.time,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dt_adjustment() {
        let nm = Order2Newmark::new(0.7071067811865475, 0.003);
        assert_eq!(nm.num_steps, 236);
        assert!((nm.dt * 236.0 - 0.7071067811865475).abs() < 1e-15);
        assert!(nm.dt <= 0.003);
    }

    #[test]
    fn test_fields_for_physics() {
        assert_eq!(physics_to_fields(PhysicsKind::Acoustic), vec!["u", "v", "a", "a_"]);
        let f3 = physics_to_fields(PhysicsKind::Elastic3dVti);
        assert_eq!(f3.len(), 12);
        assert!(f3.contains(&"az_"));
    }

    #[test]
    fn test_harmonic_oscillator_converges() {
        // ü = -ω² u integrated with the exact scheme staging: second-order
        // phase accuracy over one period.
        let omega = 2.0;
        let period = std::f64::consts::TAU / omega;
        let mut nm = Order2Newmark::new(period, 1e-4);
        let mut fields = FieldDict::new();
        for name in ["u", "v", "a", "a_"] {
            fields.insert(name.to_string(), Field::new(name, 1));
        }
        fields.get_mut("u").unwrap().global[0] = 1.0;
        while !nm.finished() {
            let u = fields["u"].global[0];
            fields.get_mut("a").unwrap().global[0] = -omega * omega * u;
            nm.take_time_step(&mut fields);
        }
        // Back to the start after one period.
        assert!(
            (fields["u"].global[0] - 1.0).abs() < 1e-5,
            "u(T) = {}",
            fields["u"].global[0]
        );
    }

    #[test]
    fn test_blowup_detection() {
        let nm = Order2Newmark::new(1.0, 0.1);
        let mut fields = FieldDict::new();
        fields.insert("u".to_string(), Field::new("u", 2));
        fields.get_mut("u").unwrap().global[1] = 6.0;
        assert!(matches!(
            nm.check_blowup(&fields, PhysicsKind::Acoustic),
            Err(EngineError::NumericalBlowup { .. })
        ));
    }
}
