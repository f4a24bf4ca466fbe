//! Simulation assembly and the time loop.
//!
//! [`Simulation`] ties mesh, elements, physics kernels, the DoF section,
//! the field dictionary and the Newmark integrator into a runnable
//! problem. The per-step sequence is strict:
//! pull → zero → element kernels → assemble (ADD) → mass solve →
//! Dirichlet → Newmark update → receiver sampling → observer.

mod driver;

pub use driver::run;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{info, warn};

use crate::assembly::{FieldDict, Section};
use crate::element::Element;
use crate::error::{EngineError, Result};
use crate::mesh::Mesh;
use crate::physics::{ElementKernel, HomogeneousDirichlet, PhysicsKind};
use crate::reference::Tables;
use crate::source::{
    localize_receivers, localize_sources, LocalizedReceiver, LocalizedSource, Receiver, Source,
};
use crate::time::Order2Newmark;

/// Run statistics, reported by [`Simulation::run`].
#[derive(Clone, Debug)]
pub struct RunStatistics {
    pub final_time: f64,
    pub num_steps: usize,
    pub wall_time: f64,
}

pub struct Simulation {
    pub mesh: Mesh,
    pub tables: Arc<Tables>,
    pub section: Section,
    pub elements: Vec<Element>,
    pub kernels: Vec<ElementKernel>,
    pub fields: FieldDict,
    pub newmark: Order2Newmark,
    pub kind: PhysicsKind,
    pub dirichlet: Option<HomogeneousDirichlet>,
    pub sources: BTreeMap<usize, Vec<LocalizedSource>>,
    pub receivers: Vec<LocalizedReceiver>,
    strict_cfl: bool,
}

/// Everything needed to assemble a [`Simulation`].
pub struct SimulationBuilder {
    pub mesh: Mesh,
    pub order: usize,
    pub kind: PhysicsKind,
    pub duration: f64,
    pub dt: f64,
    pub dirichlet_boundaries: Vec<String>,
    pub sources: Vec<Source>,
    pub receivers: Vec<Receiver>,
    pub strict_cfl: bool,
}

impl SimulationBuilder {
    pub fn new(mesh: Mesh, order: usize, kind: PhysicsKind, duration: f64, dt: f64) -> Self {
        SimulationBuilder {
            mesh,
            order,
            kind,
            duration,
            dt,
            dirichlet_boundaries: Vec::new(),
            sources: Vec::new(),
            receivers: Vec::new(),
            strict_cfl: false,
        }
    }

    pub fn with_dirichlet(mut self, names: Vec<String>) -> Self {
        self.dirichlet_boundaries = names;
        self
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_receivers(mut self, receivers: Vec<Receiver>) -> Self {
        self.receivers = receivers;
        self
    }

    pub fn strict_cfl(mut self, strict: bool) -> Self {
        self.strict_cfl = strict;
        self
    }

    pub fn build(self) -> Result<Simulation> {
        let tables = Tables::new(self.mesh.data.shape, self.order)?;
        let section = Section::build(&self.mesh, &tables)?;

        let mut elements = Vec::with_capacity(self.mesh.num_cells());
        for cell in 0..self.mesh.num_cells() {
            let mut el = Element::new(cell, tables.clone(), self.mesh.cell_vertices(cell))?;
            for name in self.mesh.material_names() {
                let name = name.to_string();
                if let Some(vals) = self.mesh.cell_material(cell, &name) {
                    el.attach_material(&name, vals);
                }
            }
            el.set_boundary_conditions(&self.mesh.boundary_faces);
            elements.push(el);
        }

        let mut kernels = Vec::with_capacity(elements.len());
        for el in &elements {
            kernels.push(ElementKernel::new(self.kind, el)?);
        }

        let newmark = Order2Newmark::new(self.duration, self.dt);

        // CFL report: warn on violation, abort under strict mode.
        let mut cfl_min = f64::INFINITY;
        for (el, kernel) in elements.iter().zip(kernels.iter()) {
            cfl_min = cfl_min.min(kernel.cfl_estimate(el));
        }
        if newmark.dt > cfl_min {
            if self.strict_cfl {
                return Err(EngineError::CflViolation {
                    dt: newmark.dt,
                    limit: cfl_min,
                });
            }
            warn!(
                "time step {:.3e} exceeds the CFL estimate {:.3e}",
                newmark.dt, cfl_min
            );
        }

        let fields = newmark.initialize_global_dofs(&elements, &kernels, &section, self.kind)?;

        let dirichlet = if self.dirichlet_boundaries.is_empty() {
            None
        } else {
            let bc =
                HomogeneousDirichlet::new(&self.dirichlet_boundaries, &self.mesh, &section, &tables);
            info!("pinning {} boundary DoFs", bc.num_pinned());
            Some(bc)
        };

        let mut sources: BTreeMap<usize, Vec<LocalizedSource>> = BTreeMap::new();
        for src in localize_sources(self.sources, &elements) {
            sources.entry(src.element).or_default().push(src);
        }
        let receivers = localize_receivers(self.receivers, &elements);

        Ok(Simulation {
            mesh: self.mesh,
            tables,
            section,
            elements,
            kernels,
            fields,
            newmark,
            kind: self.kind,
            dirichlet,
            sources,
            receivers,
            strict_cfl: self.strict_cfl,
        })
    }
}

impl Simulation {
    /// Set a global field from a function of the nodal coordinates
    /// (insert semantics; shared DoFs are simply overwritten with the
    /// same value).
    pub fn set_initial_condition<F>(&mut self, field: &str, f: F)
    where
        F: Fn(&[f64; 3]) -> f64,
    {
        let section = &self.section;
        let field = self.fields.get_mut(field).expect("field registered");
        for el in &self.elements {
            let pts = el.build_nodal_points();
            let values: Vec<f64> = pts.iter().map(&f).collect();
            section.closure_set_insert(&mut field.global, el.index, &values);
        }
        field.global_to_local_insert();
    }

    /// f − K·u for one element, gathered from the local pull fields.
    fn element_residual(&self, el: &Element, kernel: &ElementKernel) -> Vec<Vec<f64>> {
        let pull = self.kind.pull_fields();
        let ncomp = self.kind.components();
        let mut u = Vec::with_capacity(ncomp);
        for name in pull {
            u.push(self.section.closure_get(&self.fields[*name].local, el.index));
        }
        let mut ku = kernel.stiffness_term(el, &u);
        if let Some(srcs) = self.sources.get(&el.index) {
            let handles: Vec<&LocalizedSource> = srcs.iter().collect();
            let f = kernel.source_term(el, &handles, self.newmark.time);
            for c in 0..ncomp {
                for (kv, fv) in ku[c].iter_mut().zip(f[c].iter()) {
                    *kv = fv - *kv;
                }
            }
        } else {
            for comp in ku.iter_mut() {
                for kv in comp.iter_mut() {
                    *kv = -*kv;
                }
            }
        }
        ku
    }

    /// One full Newmark step.
    pub fn step(&mut self) -> Result<()> {
        let kind = self.kind;
        let pull = kind.pull_fields();
        let push = kind.push_fields();

        // 1. Pull the displacement fields into the local partitions.
        for name in pull {
            self.fields
                .get_mut(*name)
                .expect("pull field")
                .global_to_local_insert();
        }
        // 2. Zero the fields we sum into.
        for name in push {
            self.fields.get_mut(*name).expect("push field").zero_local();
        }

        // 3. Element kernels: f − K·u, summed into the local partition.
        // The kernel order never affects results beyond floating-point
        // associativity; the scatter-add itself stays serial.
        #[cfg(feature = "parallel")]
        let residuals: Vec<Vec<Vec<f64>>> = {
            use rayon::prelude::*;
            self.elements
                .par_iter()
                .zip(self.kernels.par_iter())
                .map(|(el, kernel)| self.element_residual(el, kernel))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let residuals: Vec<Vec<Vec<f64>>> = self
            .elements
            .iter()
            .zip(self.kernels.iter())
            .map(|(el, kernel)| self.element_residual(el, kernel))
            .collect();

        for (el, res) in self.elements.iter().zip(residuals.iter()) {
            for (c, name) in push.iter().enumerate() {
                let field = self.fields.get_mut(*name).expect("push field");
                self.section.closure_set_add(&mut field.local, el.index, &res[c]);
            }
        }

        // 4. Assemble into the global partitions.
        for name in push {
            let field = self.fields.get_mut(*name).expect("push field");
            field.zero_global();
            field.local_to_global_add();
        }

        // 5./6. Mass solve, then pin the Dirichlet DoFs.
        self.newmark.apply_inverse_mass(&mut self.fields, kind);
        if let Some(bc) = &self.dirichlet {
            for name in push {
                bc.apply(&mut self.fields.get_mut(*name).expect("push field").global);
            }
        }

        // 7. Newmark update and clock.
        self.newmark.take_time_step(&mut self.fields);
        self.newmark.check_blowup(&self.fields, kind)?;

        // 8. Sample receivers from the updated displacements.
        self.sample_receivers();
        Ok(())
    }

    fn sample_receivers(&mut self) {
        let pull = self.kind.pull_fields();
        for rec in &mut self.receivers {
            for name in pull {
                let u = &self.fields[*name].global;
                let closure = &self.section.closure_maps[rec.element];
                let mut v = 0.0;
                for (t, &dof) in closure.iter().enumerate() {
                    v += rec.interp[t] * u[dof];
                }
                rec.trace.push(v);
            }
        }
    }

    /// Run to completion, invoking the observer before every step (the
    /// observer sees the state at the current time, pre-update).
    pub fn run_with_observer<F>(&mut self, mut observer: F) -> Result<RunStatistics>
    where
        F: FnMut(&Simulation),
    {
        let start = std::time::Instant::now();
        while !self.newmark.finished() {
            observer(self);
            self.step()?;
        }
        let stats = RunStatistics {
            final_time: self.newmark.time,
            num_steps: self.newmark.step,
            wall_time: start.elapsed().as_secs_f64(),
        };
        info!(
            "simulation finished: {} steps to t = {:.6} in {:.2}s",
            stats.num_steps, stats.final_time, stats.wall_time
        );
        Ok(stats)
    }

    pub fn run(&mut self) -> Result<RunStatistics> {
        self.run_with_observer(|_| {})
    }

    /// Max |u| over the global displacement DoFs (diagnostics).
    pub fn displacement_max(&self) -> f64 {
        let mut m = 0.0_f64;
        for name in self.kind.pull_fields() {
            for &v in &self.fields[*name].global {
                m = m.max(v.abs());
            }
        }
        m
    }

    pub fn strict_cfl(&self) -> bool {
        self.strict_cfl
    }
}
