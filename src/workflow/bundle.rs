//! Workflow bundle step.
//!
//! Caller input (target environment, gate acknowledgement) is validated
//! before the config is loaded so a rejected run never touches the
//! filesystem.
use super::GlobalOptions;
use crate::bundle::{check_promotion, generate_bundle, BundleRequest, Gates, TargetEnvironment};
use crate::cli::BundleArgs;
use crate::context::RunContext;
use anyhow::Result;

/// Assemble the promotion bundle and print a summary.
pub(super) fn run_bundle(globals: &GlobalOptions, args: &BundleArgs) -> Result<()> {
    let target: TargetEnvironment = args.target.parse()?;
    let gates = Gates {
        ci: args.gate_ci,
        policy: args.gate_policy,
        rehearsal: args.gate_rehearsal,
        parity: args.gate_parity,
    };
    check_promotion(target, &gates, args.parity_skip_ack.as_deref())?;
    let paths = globals.load_paths()?;
    let ctx = RunContext::from_process_env();
    let request = BundleRequest {
        target,
        gates,
        parity_skip_ack: args.parity_skip_ack.clone(),
        sha: args
            .sha
            .clone()
            .unwrap_or_else(|| ctx.git_sha(paths.root())),
        triggered_by: args.triggered_by.clone().unwrap_or_else(|| ctx.actor()),
        run_id: args.run_id.clone().unwrap_or_else(|| ctx.run_id()),
        timestamp: ctx.timestamp(),
        out_dir: args
            .out
            .as_ref()
            .map(|out| paths.root().join(out))
            .unwrap_or_else(|| paths.bundle_dir()),
    };

    let output = generate_bundle(&paths, &request)?;
    let manifest = &output.manifest;
    println!(
        "Wrote {} bundle to {}",
        manifest.target_environment,
        paths.rel(&request.out_dir)
    );
    for artifact in &manifest.artifacts {
        println!("  {:<20} {}", artifact.name, artifact.hash);
    }
    if manifest.parity_skipped {
        println!("  parity gate skipped");
    }
    println!("bundleHash: {}", manifest.bundle_hash);
    println!("manifest:   {}", paths.rel(&output.manifest_path));
    println!("checksums:  {}", paths.rel(&output.checksums_path));
    Ok(())
}
