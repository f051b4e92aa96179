//! Workflow provenance step.
use crate::cli::ProvenanceArgs;
use crate::context::RunContext;
use crate::paths::ReleasePaths;
use crate::provenance::build_provenance;
use crate::util::write_json;
use anyhow::Result;

/// Build and write the provenance record.
pub(super) fn run_provenance(paths: &ReleasePaths, args: &ProvenanceArgs) -> Result<()> {
    let ctx = RunContext::from_process_env();
    let provenance = build_provenance(paths, &ctx)?;
    let out = args
        .out
        .as_ref()
        .map(|out| paths.root().join(out))
        .unwrap_or_else(|| paths.provenance_path());
    write_json(&out, &provenance)?;
    tracing::info!(path = %out.display(), "wrote provenance");
    println!("Wrote provenance to {}", out.display());
    println!("  dataset    {} {}", provenance.dataset_version, provenance.dataset_content_hash);
    println!(
        "  thresholds {} {}",
        provenance.thresholds_version, provenance.thresholds_content_hash
    );
    println!("  git        {} ({})", provenance.git_head_sha, provenance.git_branch);
    Ok(())
}
