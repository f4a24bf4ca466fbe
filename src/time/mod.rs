//! Time integration.
//!
//! One scheme is provided: the explicit second-order Newmark
//! predictor-corrector (γ = 1/2, β = 0) used throughout the engine.

mod newmark;

pub use newmark::{physics_to_fields, Order2Newmark};
