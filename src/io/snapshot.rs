//! HDF5 snapshot output and source catalog input.
//!
//! The movie file carries one dataset per saved field per saved step
//! (`<field>/frame-<n>`, each of length n_global_dofs) plus a `times`
//! vector. Frame write failures are logged and skipped; catalog read
//! failures are fatal.
//!
//! Source catalog layout: a root attribute `type` ∈ {"ricker", "file"},
//! one group per source (the group name is the source id) with
//! attributes `location` (length d) and `num-components`, plus the
//! Ricker attributes or the tabulated `data` / `sample-interval` pair.

use std::path::Path;

use log::warn;

use crate::error::{EngineError, Result};
use crate::source::{Source, SourceTimeFunction};

fn io_err<E: std::fmt::Display>(context: &str) -> impl Fn(E) -> EngineError + '_ {
    move |e| EngineError::Io(format!("{context}: {e}"))
}

pub struct MovieWriter {
    file: hdf5::File,
    field: String,
    times: Vec<f64>,
}

impl MovieWriter {
    pub fn create<P: AsRef<Path>>(path: P, field: &str) -> Result<MovieWriter> {
        let file = hdf5::File::create(path.as_ref()).map_err(io_err("creating movie file"))?;
        file.create_group(field).map_err(io_err("movie group"))?;
        Ok(MovieWriter {
            file,
            field: field.to_string(),
            times: Vec::new(),
        })
    }

    /// Dump one frame; failures are logged and the run continues.
    pub fn write_frame(&mut self, time: f64, data: &[f64]) {
        let name = format!("{}/frame-{}", self.field, self.times.len());
        let res = self
            .file
            .new_dataset::<f64>()
            .shape(data.len())
            .create(name.as_str())
            .and_then(|ds| ds.write(data));
        match res {
            Ok(()) => self.times.push(time),
            Err(e) => warn!("skipping movie frame at t = {time:.6}: {e}"),
        }
    }

    /// Write the time vector and close the file.
    pub fn finalize(self) -> Result<()> {
        self.file
            .new_dataset::<f64>()
            .shape(self.times.len())
            .create("times")
            .and_then(|ds| ds.write(&self.times))
            .map_err(io_err("finalizing movie"))?;
        Ok(())
    }
}

fn attr_f64(group: &hdf5::Group, name: &str) -> Result<f64> {
    group
        .attr(name)
        .and_then(|a| a.read_scalar::<f64>())
        .map_err(io_err(name))
}

/// Read a source catalog.
pub fn read_source_catalog<P: AsRef<Path>>(path: P, dim: usize) -> Result<Vec<Source>> {
    let file = hdf5::File::open(path.as_ref())
        .map_err(|e| EngineError::Io(format!("can't open source file: {e}")))?;
    let kind: String = file
        .attr("type")
        .and_then(|a| a.read_scalar::<hdf5::types::VarLenUnicode>())
        .map(|s| s.to_string())
        .map_err(io_err("reading 'type' attribute"))?;
    if kind != "ricker" && kind != "file" {
        return Err(EngineError::Config(format!(
            "source type '{kind}' not recognized; expected ricker or file"
        )));
    }

    let mut out = Vec::new();
    for name in file.member_names().map_err(io_err("listing sources"))? {
        let group = file.group(&name).map_err(io_err("opening source group"))?;
        let loc: Vec<f64> = group
            .attr("location")
            .and_then(|a| a.read_raw::<f64>())
            .map_err(io_err("location"))?;
        if loc.len() < dim {
            return Err(EngineError::Config(format!(
                "source '{name}' has a {}-component location in {dim}d",
                loc.len()
            )));
        }
        let mut location = [0.0; 3];
        location[..dim].copy_from_slice(&loc[..dim]);
        let num_components: i64 = group
            .attr("num-components")
            .and_then(|a| a.read_scalar())
            .map_err(io_err("num-components"))?;
        let num_components = num_components as usize;

        let direction = if num_components > 1 {
            group
                .attr("ricker-direction")
                .and_then(|a| a.read_raw::<f64>())
                .map_err(io_err("ricker-direction"))?
        } else {
            vec![1.0]
        };

        let stf = if kind == "ricker" {
            SourceTimeFunction::Ricker {
                amplitude: attr_f64(&group, "ricker-amplitude")?,
                center_freq: attr_f64(&group, "ricker-center-freq")?,
                time_delay: attr_f64(&group, "ricker-time-delay")?,
            }
        } else {
            let samples: Vec<f64> = group
                .dataset("data")
                .and_then(|d| d.read_raw::<f64>())
                .map_err(io_err("data"))?;
            SourceTimeFunction::File {
                sample_interval: attr_f64(&group, "sample-interval")?,
                samples,
            }
        };

        out.push(Source {
            name,
            location,
            num_components,
            direction,
            stf,
        });
    }
    Ok(out)
}
