//! # semwave
//!
//! A spectral-element time-domain engine for linear acoustic and elastic
//! wave propagation on unstructured meshes of triangles, quadrilaterals,
//! tetrahedra and hexahedra.
//!
//! This crate provides the building blocks of the method:
//! - Gauss-Lobatto-Legendre nodal bases and mass-lumped simplex bases
//! - Reference-element tables (nodes, weights, derivatives, closures)
//! - Shape-layer geometry (Jacobians, hull tests, inverse maps)
//! - Per-element operators (sum-factorized on quads/hexes, dense tables
//!   on simplices)
//! - Acoustic and elastic (2D isotropic, 3D VTI) physics kernels
//! - Global DoF section, element-closure scatter and mass lumping
//! - The explicit second-order Newmark time integrator
//! - Point sources (Ricker, tabulated), receivers and seismogram output

pub mod assembly;
pub mod basis;
pub mod config;
pub mod element;
pub mod error;
pub mod io;
pub mod mesh;
pub mod physics;
pub mod polynomial;
pub mod reference;
pub mod shape;
pub mod simulation;
pub mod source;
pub mod time;

// Re-export the main types for convenience.
pub use assembly::{Field, FieldDict, Section};
pub use config::Options;
pub use element::Element;
pub use error::{EngineError, Result};
pub use mesh::{uniform_hex, uniform_quad, uniform_tet, uniform_tri, Mesh, MeshData};
pub use physics::{
    AcousticKernel, Elastic2dKernel, Elastic3dKernel, ElementKernel, HomogeneousDirichlet,
    PhysicsKind,
};
pub use reference::{Shape, Tables};
pub use simulation::{RunStatistics, Simulation, SimulationBuilder};
pub use source::{LocalizedReceiver, LocalizedSource, Receiver, Source, SourceTimeFunction};
pub use time::Order2Newmark;
