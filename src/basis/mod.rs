//! Nodal basis representations.
//!
//! This module provides:
//! - Barycentric Lagrange interpolation and differentiation on 1D node
//!   sets (consumed as tensor products by quadrilaterals and hexahedra)
//! - Mass-lumped nodal bases on the reference triangle and tetrahedron,
//!   built from generalized Vandermonde matrices over enriched
//!   polynomial spaces

mod lagrange;
mod simplex;

pub use lagrange::{lagrange_derivative_matrix, lagrange_values};
pub use simplex::{
    SimplexBasis, TET_EDGES, TET_FACES, TET_MAX_ORDER, TRI_EDGES, TRI_MAX_ORDER,
};
