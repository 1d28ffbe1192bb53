use pbf_simulator::{PbfParameters, PbfSimulation, SimulationStatistics, Vec3};

use structopt::StructOpt;
use tracing::info;

#[derive(StructOpt, Debug)]
#[structopt(name = "pbf_solver")]
struct Opt {
    /// JSON file of simulation parameters; defaults are used when omitted.
    #[structopt(short, long)]
    params: Option<std::path::PathBuf>,
    /// Directory to write per-frame render data into, as MessagePack.
    #[structopt(short, long)]
    output_dir: Option<std::path::PathBuf>,
    #[structopt(short, long, default_value = "600")]
    frames: usize,
    /// Number of particles along each axis of the seeded block.
    #[structopt(short, long, default_value = "10")]
    block_size: usize,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = Opt::from_args();

    use eyre::WrapErr;

    let params: PbfParameters = match &opt.params {
        Some(path) => std::fs::read(path)
            .wrap_err_with(|| format!("Failed to read JSON settings file: {:?}", path))
            .and_then(|json| {
                serde_json::from_slice(&json).wrap_err("Serde failed to deserialize JSON.")
            })?,
        None => PbfParameters::default(),
    };

    let mut sim = PbfSimulation::new(params);
    seed_block(&mut sim, opt.block_size);
    info!(particles = sim.particles.len(), "seeded dam-break block");

    let dt = sim.params.delta_time;
    for frame in 0..opt.frames {
        sim.advance_time(dt);

        info!(
            frame,
            time = sim.total_time(),
            energy = sim.total_energy(),
            volume = sim.total_volume(),
            "stepped"
        );

        if let Some(dir) = &opt.output_dir {
            let mut path = dir.clone();
            path.push(format!("{:03}.dat", frame));
            let mut writer = std::fs::File::create(&path)
                .wrap_err_with(|| format!("Failed to create frame file: {:?}", path))?;
            rmp_serde::encode::write(&mut writer, &sim.render_data())?;
        }
    }

    Ok(())
}

/// Seeds a cube of particles in the lower corner of the domain, the canonical
/// dam-break setup. Spacing is half the kernel radius, so every interior
/// particle starts with a full neighborhood.
fn seed_block(sim: &mut PbfSimulation, per_axis: usize) {
    let spacing = 0.5 * sim.params.h;
    let corner = Vec3::new(0.05, 0.05, 0.05);

    for i in 0..per_axis {
        for j in 0..per_axis {
            for k in 0..per_axis {
                sim.create_particle(
                    corner + spacing * Vec3::new(i as f64, j as f64, k as f64),
                );
            }
        }
    }
}
