//! One step per subcommand.
//!
//! Each step resolves its inputs through `ReleasePaths`, calls into the
//! hashing and bundling modules, and reports to stdout/stderr. Errors go back
//! to `main`, which owns the exit code.
mod bundle;
mod check;
mod hash;
mod init;
mod provenance;

use crate::cli::{Command, RootArgs};
use crate::config::{load_config, CONFIG_REL};
use crate::paths::ReleasePaths;
use anyhow::Result;
use std::path::PathBuf;

/// Dispatch a parsed command line.
pub fn run(args: RootArgs) -> Result<()> {
    let globals = GlobalOptions {
        root: args.root,
        config: args.config,
    };
    match args.command {
        Command::Init(args) => init::run_init(&globals, &args),
        Command::Hash(args) => hash::run_hash(&globals.load_paths()?, &args),
        Command::Check(_) => check::run_check(&globals.load_paths()?),
        Command::Provenance(args) => provenance::run_provenance(&globals.load_paths()?, &args),
        Command::Bundle(args) => bundle::run_bundle(&globals, &args),
    }
}

/// Options shared by every command.
#[derive(Debug, Clone)]
struct GlobalOptions {
    root: PathBuf,
    config: Option<PathBuf>,
}

impl GlobalOptions {
    fn config_path(&self) -> PathBuf {
        match &self.config {
            Some(path) => path.clone(),
            None => self.root.join(CONFIG_REL),
        }
    }

    /// Load config (an explicit `--config` must exist) and resolve paths.
    fn load_paths(&self) -> Result<ReleasePaths> {
        let config = load_config(&self.config_path(), self.config.is_some())?;
        Ok(ReleasePaths::new(self.root.clone(), config))
    }
}
