//! Workflow init step.
use super::GlobalOptions;
use crate::cli::InitArgs;
use crate::config::{write_config, PipelineConfig};
use anyhow::{anyhow, Result};

/// Write the default pipeline config.
pub(super) fn run_init(globals: &GlobalOptions, args: &InitArgs) -> Result<()> {
    let path = globals.config_path();
    if path.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    write_config(&path, &PipelineConfig::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}
