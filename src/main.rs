use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod bundle;
mod canonical;
mod cli;
mod config;
mod content_hash;
mod context;
mod dataset;
mod paths;
mod provenance;
mod util;
mod workflow;

use cli::RootArgs;

fn main() -> ExitCode {
    let args = match RootArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help and --version land here too; only real parse errors fail.
            let code = if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = err.print();
            return code;
        }
    };
    init_tracing(args.verbose);

    match workflow::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
