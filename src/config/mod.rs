//! Run configuration.
//!
//! One clap option per engine flag. Mandatory-flag validation is
//! suppressed under `--testing true` so unit tests can construct partial
//! configurations without tripping the startup checks.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{EngineError, Result};
use crate::source::{Receiver, Source, SourceTimeFunction};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "semwave",
    about = "Spectral-element time-domain engine for acoustic and elastic waves",
    allow_negative_numbers = true
)]
pub struct Options {
    /// Exodus mesh input.
    #[arg(long = "mesh-file")]
    pub mesh_file: Option<PathBuf>,

    /// Exodus material model (usually the same file as the mesh).
    #[arg(long = "model-file")]
    pub model_file: Option<PathBuf>,

    /// Spectral polynomial order.
    #[arg(long = "polynomial-order")]
    pub polynomial_order: Option<usize>,

    /// Ambient dimension (2 or 3).
    #[arg(long = "dimension")]
    pub dimension: Option<usize>,

    /// Physics system: acoustic or elastic.
    #[arg(long = "physics-system", default_value = "acoustic")]
    pub physics_system: String,

    /// Simulated duration in seconds.
    #[arg(long = "duration")]
    pub duration: Option<f64>,

    /// Newmark time step in seconds (adjusted down to divide the
    /// duration evenly).
    #[arg(long = "time-step")]
    pub time_step: Option<f64>,

    /// Comma-separated side-set names pinned to zero.
    #[arg(long = "homogeneous-dirichlet", value_delimiter = ',')]
    pub homogeneous_dirichlet: Vec<String>,

    /// Snapshot output toggle.
    #[arg(long = "save-movie")]
    pub save_movie: Option<bool>,

    #[arg(long = "movie-file-name")]
    pub movie_file_name: Option<PathBuf>,

    /// Field to dump into the movie file.
    #[arg(long = "movie-field")]
    pub movie_field: Option<String>,

    /// Snapshot cadence in steps.
    #[arg(long = "save-frame-every")]
    pub save_frame_every: Option<usize>,

    /// HDF5 source catalog; overrides the inline source flags.
    #[arg(long = "source-file-name")]
    pub source_file_name: Option<PathBuf>,

    #[arg(long = "number-of-sources")]
    pub number_of_sources: Option<usize>,

    /// ricker or file.
    #[arg(long = "source-type")]
    pub source_type: Option<String>,

    #[arg(long = "source-location-x", value_delimiter = ',')]
    pub source_location_x: Vec<f64>,

    #[arg(long = "source-location-y", value_delimiter = ',')]
    pub source_location_y: Vec<f64>,

    #[arg(long = "source-location-z", value_delimiter = ',')]
    pub source_location_z: Vec<f64>,

    #[arg(long = "ricker-amplitude", value_delimiter = ',')]
    pub ricker_amplitude: Vec<f64>,

    #[arg(long = "ricker-center-freq", value_delimiter = ',')]
    pub ricker_center_freq: Vec<f64>,

    #[arg(long = "ricker-time-delay", value_delimiter = ',')]
    pub ricker_time_delay: Vec<f64>,

    #[arg(long = "source-num-components", value_delimiter = ',')]
    pub source_num_components: Vec<usize>,

    #[arg(long = "number-of-receivers")]
    pub number_of_receivers: Option<usize>,

    #[arg(long = "receiver-file-name")]
    pub receiver_file_name: Option<PathBuf>,

    #[arg(long = "receiver-names", value_delimiter = ',')]
    pub receiver_names: Vec<String>,

    #[arg(long = "receiver-location-x", value_delimiter = ',')]
    pub receiver_location_x: Vec<f64>,

    #[arg(long = "receiver-location-y", value_delimiter = ',')]
    pub receiver_location_y: Vec<f64>,

    #[arg(long = "receiver-location-z", value_delimiter = ',')]
    pub receiver_location_z: Vec<f64>,

    /// Suppress mandatory-flag errors (unit testing).
    #[arg(long = "testing")]
    pub testing: Option<bool>,

    /// Raise the log level.
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Abort instead of warning when Δt exceeds the CFL estimate.
    #[arg(long = "strict-cfl")]
    pub strict_cfl: bool,

    /// Blowup sentinel on |u| (default 5).
    #[arg(long = "blowup-sentinel", default_value_t = 5.0)]
    pub blowup_sentinel: f64,
}

impl Options {
    pub fn is_testing(&self) -> bool {
        self.testing.unwrap_or(false)
    }

    /// Check that the mandatory flags are present (unless testing).
    pub fn validate(&self) -> Result<()> {
        if self.is_testing() {
            return Ok(());
        }
        let missing = |flag: &str| {
            EngineError::Config(format!("critical option --{flag} not set"))
        };
        if self.mesh_file.is_none() {
            return Err(missing("mesh-file"));
        }
        if self.model_file.is_none() {
            return Err(missing("model-file"));
        }
        if self.polynomial_order.is_none() {
            return Err(missing("polynomial-order"));
        }
        if self.dimension.is_none() {
            return Err(missing("dimension"));
        }
        if self.duration.is_none() {
            return Err(missing("duration"));
        }
        if self.time_step.is_none() {
            return Err(missing("time-step"));
        }
        if self.save_movie.unwrap_or(false) {
            if self.movie_file_name.is_none() {
                return Err(EngineError::Config(
                    "movie requested, but --movie-file-name is not set".into(),
                ));
            }
            if self.movie_field.is_none() {
                return Err(EngineError::Config(
                    "movie requested, but --movie-field is not set".into(),
                ));
            }
        }
        Ok(())
    }

    /// Sources from the inline flags. The catalog file, when given,
    /// takes precedence and is parsed by the I/O layer instead.
    pub fn inline_sources(&self) -> Result<Vec<Source>> {
        let n = self.number_of_sources.unwrap_or(0);
        if n == 0 {
            return Ok(Vec::new());
        }
        let dim = self.dimension.unwrap_or(2);
        let kind = self.source_type.as_deref().ok_or_else(|| {
            EngineError::Config(
                "sources were requested but --source-type is not set (possibilities: ricker)"
                    .into(),
            )
        })?;
        if kind != "ricker" {
            return Err(EngineError::Config(format!(
                "source type '{kind}' is not recognized for inline sources"
            )));
        }
        let check = |name: &str, len: usize| -> Result<()> {
            if len != n {
                return Err(EngineError::Config(format!(
                    "incorrect number of source parameters: {name} has {len}, expected {n}"
                )));
            }
            Ok(())
        };
        check("--source-location-x", self.source_location_x.len())?;
        check("--source-location-y", self.source_location_y.len())?;
        if dim == 3 {
            check("--source-location-z", self.source_location_z.len())?;
        }
        check("--source-num-components", self.source_num_components.len())?;
        check("--ricker-amplitude", self.ricker_amplitude.len())?;
        check("--ricker-center-freq", self.ricker_center_freq.len())?;
        check("--ricker-time-delay", self.ricker_time_delay.len())?;

        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let ncomp = self.source_num_components[i];
            // Directivity for multi-component inline sources is not a
            // command-line option; force along the first component.
            if ncomp > 1 {
                log::warn!(
                    "directivity for multi-component inline sources is not supported; \
                     source {i} fires along the first component"
                );
            }
            let mut direction = vec![0.0; ncomp.max(1)];
            direction[0] = 1.0;
            let z = if dim == 3 { self.source_location_z[i] } else { 0.0 };
            out.push(Source {
                name: format!("source-{i}"),
                location: [self.source_location_x[i], self.source_location_y[i], z],
                num_components: ncomp,
                direction,
                stf: SourceTimeFunction::Ricker {
                    amplitude: self.ricker_amplitude[i],
                    center_freq: self.ricker_center_freq[i],
                    time_delay: self.ricker_time_delay[i],
                },
            });
        }
        Ok(out)
    }

    /// Receivers from the inline flags.
    pub fn inline_receivers(&self) -> Result<Vec<Receiver>> {
        let n = self.number_of_receivers.unwrap_or(0);
        if n == 0 {
            return Ok(Vec::new());
        }
        if !self.is_testing() && self.receiver_file_name.is_none() {
            return Err(EngineError::Config(
                "receivers were requested but no output file was specified".into(),
            ));
        }
        let dim = self.dimension.unwrap_or(2);
        let check = |name: &str, len: usize| -> Result<()> {
            if len != n {
                return Err(EngineError::Config(format!(
                    "incorrect number of receiver parameters: {name} has {len}, expected {n}"
                )));
            }
            Ok(())
        };
        check("--receiver-names", self.receiver_names.len())?;
        check("--receiver-location-x", self.receiver_location_x.len())?;
        check("--receiver-location-y", self.receiver_location_y.len())?;
        if dim == 3 {
            check("--receiver-location-z", self.receiver_location_z.len())?;
        }
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let z = if dim == 3 { self.receiver_location_z[i] } else { 0.0 };
            out.push(Receiver {
                name: self.receiver_names[i].clone(),
                location: [
                    self.receiver_location_x[i],
                    self.receiver_location_y[i],
                    z,
                ],
            });
        }
        Ok(out)
    }
}
