//! `drift validate`: check a run file without running it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, info_span};

use super::build_model;
use crate::run_file::LoadedRun;

/// Arguments of `drift validate`.
#[derive(Args)]
pub struct ValidateArgs {
    /// Run file (JSON)
    pub config: PathBuf,
}

/// Validate the configuration, then open every input the run needs:
/// grid, forcing coverage, release table and warm-start source.
pub fn execute(args: ValidateArgs) -> Result<()> {
    let run = LoadedRun::load(&args.config)?;
    run.model_config()?
        .validate()
        .context("invalid configuration")?;
    info!("configuration values are valid");

    let span = info_span!("drift", run = %args.config.display());
    let model = build_model(&run, false, &span)?;

    let clock = model.clock();
    let forcing = model.forcing();
    println!("=== {} is valid ===", args.config.display());
    println!("window:     {} .. {}", clock.start(), clock.stop());
    println!("steps:      {} x {} s", clock.nsteps(), clock.dt_seconds());
    println!(
        "forcing:    {} frames, fields [{}]",
        forcing.frame_index().len(),
        forcing.registered_fields().join(", ")
    );
    println!("warm start: {} particles", model.state().len());
    match model.scheduler() {
        Some(s) => println!(
            "releases:   {} particles over {} steps",
            s.total_particle_count(),
            s.steps().len()
        ),
        None => println!("releases:   none"),
    }
    Ok(())
}
