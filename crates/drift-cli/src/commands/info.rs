//! `drift info`: describe forcing files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use drift_forcing::ForcingFile;

/// Arguments of `drift info`.
#[derive(Args)]
pub struct InfoArgs {
    /// Forcing files
    #[arg(required = true)]
    pub forcing: Vec<PathBuf>,

    /// List every frame time
    #[arg(long)]
    pub frames: bool,
}

/// Print the layout and time coverage of each forcing file.
pub fn execute(args: InfoArgs) -> Result<()> {
    for path in &args.forcing {
        let file = ForcingFile::open_path(path)
            .with_context(|| format!("cannot open forcing file {}", path.display()))?;
        let layout = file.layout();
        let times = file.times();

        println!("=== {} ===", path.display());
        println!(
            "grid:    {} x {} x {} layers",
            layout.imax, layout.jmax, layout.layers
        );
        println!("scalars: [{}]", layout.scalars.join(", "));
        match (times.first(), times.last()) {
            (Some(first), Some(last)) => {
                println!("frames:  {} from {first} to {last}", times.len())
            }
            _ => println!("frames:  none"),
        }
        if args.frames {
            for (k, t) in times.iter().enumerate() {
                println!("  {k:>5}  {t}");
            }
        }
    }
    Ok(())
}
