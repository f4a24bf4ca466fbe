//! Top-level driver: configuration → mesh → simulation → outputs.

use log::info;

use crate::config::Options;
use crate::error::{EngineError, Result};
use crate::mesh::Mesh;
use crate::physics::PhysicsKind;
use crate::simulation::SimulationBuilder;
use crate::source::Source;

/// Run a full simulation from parsed options.
pub fn run(options: &Options) -> Result<()> {
    options.validate()?;

    let dim = options.dimension.unwrap_or(2);
    let kind = PhysicsKind::parse(&options.physics_system, dim)?;

    let mesh_data = load_mesh(options, dim)?;
    let mesh = Mesh::build(mesh_data)?;
    info!(
        "mesh: {} cells, {} vertices, {} side sets",
        mesh.num_cells(),
        mesh.num_vertices(),
        mesh.boundary_faces.len()
    );

    let sources = load_sources(options, dim)?;
    let receivers = options.inline_receivers()?;

    let mut sim = SimulationBuilder::new(
        mesh,
        options
            .polynomial_order
            .ok_or_else(|| EngineError::Config("critical option --polynomial-order not set".into()))?,
        kind,
        options
            .duration
            .ok_or_else(|| EngineError::Config("critical option --duration not set".into()))?,
        options
            .time_step
            .ok_or_else(|| EngineError::Config("critical option --time-step not set".into()))?,
    )
    .with_dirichlet(options.homogeneous_dirichlet.clone())
    .with_sources(sources)
    .with_receivers(receivers)
    .strict_cfl(options.strict_cfl)
    .build()?;
    sim.newmark.blowup_sentinel = options.blowup_sentinel;

    let save_movie = options.save_movie.unwrap_or(false);
    let stats = if save_movie {
        run_with_movie(&mut sim, options)?
    } else {
        sim.run()?
    };
    info!(
        "{} steps, final time {:.6}, wall time {:.2}s",
        stats.num_steps, stats.final_time, stats.wall_time
    );

    if let Some(path) = &options.receiver_file_name {
        if !sim.receivers.is_empty() {
            crate::io::write_traces(path, &sim.receivers, sim.newmark.dt, kind.components())?;
            info!("wrote {} receiver traces to {}", sim.receivers.len(), path.display());
        }
    }
    Ok(())
}

fn load_mesh(options: &Options, dim: usize) -> Result<crate::mesh::MeshData> {
    let mesh_file = options
        .mesh_file
        .as_ref()
        .ok_or_else(|| EngineError::Config("critical option --mesh-file not set".into()))?;
    let model_file = options.model_file.as_ref().unwrap_or(mesh_file);
    read_exodus(mesh_file, model_file, dim)
}

#[cfg(feature = "exodus")]
fn read_exodus(
    mesh: &std::path::PathBuf,
    model: &std::path::PathBuf,
    dim: usize,
) -> Result<crate::mesh::MeshData> {
    crate::io::exodus::read_exodus(mesh, model, dim)
}

#[cfg(not(feature = "exodus"))]
fn read_exodus(
    _mesh: &std::path::PathBuf,
    _model: &std::path::PathBuf,
    _dim: usize,
) -> Result<crate::mesh::MeshData> {
    Err(EngineError::Io(
        "this build has no Exodus reader; rebuild with --features exodus".into(),
    ))
}

fn load_sources(options: &Options, dim: usize) -> Result<Vec<Source>> {
    if let Some(path) = &options.source_file_name {
        #[cfg(feature = "hdf5-io")]
        {
            return crate::io::snapshot::read_source_catalog(path, dim);
        }
        #[cfg(not(feature = "hdf5-io"))]
        {
            let _ = (path, dim);
            return Err(EngineError::Io(
                "this build has no HDF5 reader; rebuild with --features hdf5-io".into(),
            ));
        }
    }
    options.inline_sources()
}

#[cfg(feature = "hdf5-io")]
fn run_with_movie(
    sim: &mut crate::simulation::Simulation,
    options: &Options,
) -> Result<crate::simulation::RunStatistics> {
    let path = options
        .movie_file_name
        .as_ref()
        .ok_or_else(|| EngineError::Config("movie requested without --movie-file-name".into()))?;
    let field = options.movie_field.as_deref().unwrap_or("u").to_string();
    let every = options.save_frame_every.unwrap_or(10);
    let mut writer = crate::io::snapshot::MovieWriter::create(path, &field)?;
    let start = std::time::Instant::now();
    while !sim.newmark.finished() {
        if sim.newmark.step % every == 0 {
            if let Some(f) = sim.fields.get(&field) {
                writer.write_frame(sim.newmark.time, &f.global);
            }
        }
        sim.step()?;
    }
    writer.finalize()?;
    Ok(crate::simulation::RunStatistics {
        final_time: sim.newmark.time,
        num_steps: sim.newmark.step,
        wall_time: start.elapsed().as_secs_f64(),
    })
}

#[cfg(not(feature = "hdf5-io"))]
fn run_with_movie(
    sim: &mut crate::simulation::Simulation,
    _options: &Options,
) -> Result<crate::simulation::RunStatistics> {
    log::warn!("this build has no HDF5 writer; running without snapshots");
    sim.run()
}
