//! Hybrid MC / well-tempered metadynamics on a Langevin double well.
//!
//! Usage:
//!   cargo run --release -- --config config.yml
//!
//! Set `RUST_LOG=debug` for per-hill output.

use clap::Parser;
use hmc_metad::{
    mean_radius, mean_x, read_run_config, restore_checkpoint, DoubleWellLangevin, HmcMetad, MetadError,
    RunConfig,
};

/// Hybrid Monte Carlo metadynamics driver
#[derive(Parser, Debug)]
#[command(version, about = "Well-tempered metadynamics with Metropolis trial moves")]
struct Args {
    /// YAML run configuration
    #[arg(short, long, default_value = "config.yml")]
    config: String,

    /// Override the number of timesteps from the configuration
    #[arg(short = 'n', long)]
    steps: Option<u64>,
}

fn run(config: RunConfig) -> Result<(), MetadError> {
    let mut host = DoubleWellLangevin::new(config.system.clone())?;
    println!("Double well: minima at {:?}, barrier {:.4}", host.minima(), host.barrier_height());

    let mut metad = config.metad.clone();
    if metad.restart {
        let timestep = restore_checkpoint(&mut host, &mut metad, &config.configuration_fn)?;
        println!("Resuming at step {} from {}", timestep, config.configuration_fn);
    }

    let mut sampler = HmcMetad::new(host, mean_x, mean_radius, metad)?;
    let mut log = sampler.log_writer(&config.log_fn, config.log_stride)?;

    sampler.run(config.n_steps, Some(&mut log))?;
    sampler.save_history(&config.history_fn)?;
    sampler.save_configuration(&config.configuration_fn)?;

    println!();
    println!("Hybrid MC metadynamics results");
    println!("------------------------------");
    println!("Final timestep:      {}", sampler.timestep());
    println!("Acceptance ratio:    {:.4}", sampler.acceptance_ratio());
    println!("Hills deposited:     {}", sampler.history().len());
    println!("Current CV:          {:.6}", sampler.collective_variable());
    if config.metad.bias_mode {
        println!("Current bias:        {:.6}", sampler.bias_potential());
        println!("Reweighting factor:  {:.6e}", sampler.ebetac()?);
    }
    println!("Log written to {}", config.log_fn);
    println!("History written to {}", config.history_fn);
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let result = read_run_config(&args.config).and_then(|mut config| {
        if let Some(steps) = args.steps {
            config.n_steps = steps;
        }
        run(config)
    });

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
