//! Engine-wide error types.
//!
//! Library layers report typed failures; the driver converts fatal ones
//! into a nonzero process exit. Source/receiver localization failures are
//! the only non-fatal kind and are handled (logged and dropped) before
//! they reach the driver.

use thiserror::Error;

/// Fatal and non-fatal failure kinds of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed configuration (CLI flags, source catalog).
    #[error("configuration error: {0}")]
    Config(String),

    /// Polynomial order outside the supported range for a shape.
    #[error("polynomial order {order} not supported for {shape} (valid range 1..={max})")]
    UnsupportedOrder {
        shape: &'static str,
        order: usize,
        max: usize,
    },

    /// Shape/physics combination that is not implemented.
    #[error("unsupported shape or physics: {0}")]
    UnsupportedShape(String),

    /// Degenerate geometry: non-positive Jacobian or collapsed vertices.
    #[error("geometry error on element {element}: {message}")]
    Geometry { element: usize, message: String },

    /// A source or receiver fell outside the mesh. Non-fatal: the caller
    /// drops the object with a warning.
    #[error("could not localize {kind} '{name}' in the mesh")]
    Localization { kind: &'static str, name: String },

    /// Input file failure (mesh, model, source catalog).
    #[error("i/o error: {0}")]
    Io(String),

    /// The solution exceeded the blowup sentinel.
    #[error("solution magnitude {value:.3e} exceeded sentinel {sentinel} at t = {time:.6}; reduce the time step")]
    NumericalBlowup {
        value: f64,
        sentinel: f64,
        time: f64,
    },

    /// CFL violation under --strict-cfl.
    #[error("time step {dt:.3e} exceeds the CFL limit {limit:.3e}")]
    CflViolation { dt: f64, limit: f64 },
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
