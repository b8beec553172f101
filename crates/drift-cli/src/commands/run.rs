//! `drift run`: execute a simulation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{debug, info, info_span};

use super::build_model;
use crate::run_file::LoadedRun;

/// Arguments of `drift run`.
#[derive(Args)]
pub struct RunArgs {
    /// Run file (JSON)
    pub config: PathBuf,

    /// Log per-step metrics at info level instead of debug
    #[arg(long)]
    pub progress: bool,
}

/// Execute the run described by the run file.
pub fn execute(args: RunArgs) -> Result<()> {
    let run = LoadedRun::load(&args.config)?;
    let span = info_span!("drift", run = %args.config.display());
    let mut model = build_model(&run, true, &span)?;

    while !model.is_finished() {
        let m = model.step()?;
        if args.progress {
            info!(
                parent: &span,
                step = m.step,
                released = m.released,
                remaining = m.remaining,
                killed = m.killed,
                step_ms = m.total_us as f64 / 1000.0,
                "step"
            );
        } else {
            debug!(
                parent: &span,
                step = m.step,
                released = m.released,
                remaining = m.remaining,
                killed = m.killed,
                step_us = m.total_us,
                "step"
            );
        }
    }
    let summary = model.run()?;

    println!("=== drift run complete ===");
    println!("steps:      {}", model.clock().nsteps() + 1);
    println!("released:   {}", summary.released);
    println!("frames:     {}", summary.frames);
    println!("remaining:  {}", summary.remaining);
    if let Some(path) = run.output_path() {
        println!("output:     {}", path.display());
    }
    Ok(())
}
