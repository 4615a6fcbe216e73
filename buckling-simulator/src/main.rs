use anyhow::Result;
use buckling_simulator::{Config, DeflectionVisualiser};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file; the fingerprint-buckling constants are used without one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of descent steps
    #[arg(long)]
    steps: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the output directory for plots
    #[arg(long)]
    output: Option<PathBuf>,

    /// Skip rendering
    #[arg(long, default_value_t = false)]
    no_plots: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::paper_defaults(),
    };
    if let Some(steps) = args.steps {
        config.simulation.steps = steps;
    }
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }
    config.log_summary();

    let mut sim = config.build_simulator()?;
    let steps = config.simulation.steps;
    let trace = match config.simulation.seed {
        Some(seed) => sim.run_seeded(steps, seed),
        None => sim.run(steps),
    };

    if let (Some(first), Some(last)) = (trace.initial_energy(), trace.final_energy()) {
        info!("Energy: {:.6e} -> {:.6e}", first, last);
    }
    info!(
        "Accepted {}/{} proposals ({:.1}%), max |w| = {:.4e}, rms w = {:.4e}",
        trace.accepted_count(),
        trace.len(),
        100.0 * trace.acceptance_rate(),
        sim.fields().max_deflection(),
        sim.fields().rms_deflection()
    );

    if !args.no_plots {
        let output_dir = args
            .output
            .unwrap_or_else(|| PathBuf::from(&config.visualization.output_dir));
        let visualiser = DeflectionVisualiser::from_config(&output_dir, &config.visualization)?;
        visualiser.render_deflection(&sim, "deflection.png")?;
        visualiser.render_energy_trace(&trace, "energy.png")?;
        info!("Plots saved to {}", visualiser.output_dir().display());
    }

    Ok(())
}
