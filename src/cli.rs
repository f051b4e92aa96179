//! CLI argument parsing for the release hashing workflow.
//!
//! The CLI is intentionally thin: parsing lives here, behavior lives in
//! `workflow` and the modules it calls.
use crate::bundle::GateStatus;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "gprov",
    version,
    about = "Content hashing, provenance, and promotion bundles for golden datasets",
    after_help = "Commands:\n  init                    Write a default release/config.json\n  hash [--update]         Verify (default) or stamp dataset/thresholds content hashes\n  check                   Check golden dataset ordering and canonical values\n  provenance              Write the provenance record\n  bundle <staging|production>  Assemble the promotion bundle\n\nExamples:\n  gprov hash\n  gprov hash --update\n  gprov provenance\n  gprov bundle staging --gate-ci passed --gate-policy passed --gate-parity passed\n  gprov bundle production --gate-parity skipped --parity-skip-ack \"runner outage\"",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Repository root that configured paths are relative to
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Pipeline config (default: <root>/release/config.json, optional)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Hash(HashArgs),
    Check(CheckArgs),
    Provenance(ProvenanceArgs),
    Bundle(BundleArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a default pipeline config")]
pub struct InitArgs {
    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Verify or update content hashes of the dataset and thresholds")]
pub struct HashArgs {
    /// Rewrite the stored contentHash instead of verifying it
    #[arg(long)]
    pub update: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Check golden dataset ordering and canonical-value invariants")]
pub struct CheckArgs {}

#[derive(Parser, Debug)]
#[command(about = "Write the provenance record for this run")]
pub struct ProvenanceArgs {
    /// Output path (default: configured provenance path)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Assemble a promotion bundle for a target environment")]
pub struct BundleArgs {
    /// Target environment: staging or production
    #[arg(value_name = "TARGET_ENV")]
    pub target: String,

    /// CI gate outcome
    #[arg(long, value_enum, value_name = "STATUS", default_value_t = GateStatus::Skipped)]
    pub gate_ci: GateStatus,

    /// Policy gate outcome
    #[arg(long, value_enum, value_name = "STATUS", default_value_t = GateStatus::Skipped)]
    pub gate_policy: GateStatus,

    /// Rehearsal gate outcome
    #[arg(long, value_enum, value_name = "STATUS", default_value_t = GateStatus::Skipped)]
    pub gate_rehearsal: GateStatus,

    /// Parity gate outcome
    #[arg(long, value_enum, value_name = "STATUS", default_value_t = GateStatus::Skipped)]
    pub gate_parity: GateStatus,

    /// Reason for promoting to production without a parity run
    #[arg(long, value_name = "TEXT")]
    pub parity_skip_ack: Option<String>,

    /// Commit sha (default: GITHUB_SHA, then git HEAD)
    #[arg(long)]
    pub sha: Option<String>,

    /// Triggering actor (default: GITHUB_ACTOR, then USER)
    #[arg(long, value_name = "WHO")]
    pub triggered_by: Option<String>,

    /// Run id (default: GITHUB_RUN_ID, then "local")
    #[arg(long, value_name = "ID")]
    pub run_id: Option<String>,

    /// Bundle output directory (default: configured bundle_dir)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}
