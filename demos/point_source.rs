//! Minimal acoustic shot gather: one Ricker source, a line of receivers,
//! traces written to a CSV.
//!
//! Run with: cargo run --example point_source

use semwave::io::write_traces;
use semwave::mesh::{uniform_quad, Mesh};
use semwave::physics::PhysicsKind;
use semwave::simulation::SimulationBuilder;
use semwave::source::{Receiver, Source, SourceTimeFunction};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mesh = Mesh::build(
        uniform_quad(0.0, 2000.0, 0.0, 2000.0, 20, 20).with_constant_material("VP", 1500.0),
    )?;

    let source = Source {
        name: "shot".into(),
        location: [1000.0, 1000.0, 0.0],
        num_components: 1,
        direction: vec![1.0],
        stf: SourceTimeFunction::Ricker {
            amplitude: 1.0,
            center_freq: 10.0,
            time_delay: 0.1,
        },
    };
    let receivers: Vec<Receiver> = (0..9)
        .map(|i| Receiver {
            name: format!("rec-{i}"),
            location: [200.0 + 200.0 * i as f64, 1400.0, 0.0],
        })
        .collect();

    let mut sim = SimulationBuilder::new(mesh, 4, PhysicsKind::Acoustic, 1.0, 5e-4)
        .with_dirichlet(vec!["x0".into(), "x1".into(), "y0".into(), "y1".into()])
        .with_sources(vec![source])
        .with_receivers(receivers)
        .build()?;

    let stats = sim.run()?;
    println!(
        "{} steps to t = {:.3}s in {:.2}s wall time",
        stats.num_steps, stats.final_time, stats.wall_time
    );

    write_traces("shot_gather.csv", &sim.receivers, sim.newmark.dt, 1)?;
    println!("wrote shot_gather.csv");
    Ok(())
}
