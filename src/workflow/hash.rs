//! Workflow hash step.
//!
//! Verify mode fails when any document's stored hash is missing or stale;
//! update mode restamps them.
use crate::cli::HashArgs;
use crate::content_hash::{process_document, HashError, HashMode, UpdateOutcome};
use crate::paths::ReleasePaths;
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Verify or update the dataset and thresholds content hashes.
pub(super) fn run_hash(paths: &ReleasePaths, args: &HashArgs) -> Result<()> {
    let mode = if args.update {
        HashMode::Update
    } else {
        HashMode::Verify
    };
    let documents: [(&str, PathBuf); 2] = [
        ("dataset", paths.dataset_path()),
        ("thresholds", paths.thresholds_path()),
    ];

    // Both inputs are required; bail before hashing anything.
    for (_, path) in &documents {
        if !path.is_file() {
            return Err(HashError::Missing { path: path.clone() }.into());
        }
    }

    let mut failures = 0usize;
    for (label, path) in &documents {
        let rel = paths.rel(path);
        match process_document(path, mode) {
            Ok(UpdateOutcome::Unchanged(hash)) => match mode {
                HashMode::Verify => println!("{label}: {rel} ok {hash}"),
                HashMode::Update => println!("{label}: {rel} already up to date {hash}"),
            },
            Ok(UpdateOutcome::Stamped { previous, current }) => {
                let previous = previous.as_deref().unwrap_or("<none>");
                println!("{label}: {rel} updated {previous} -> {current}");
            }
            Err(HashError::HashMissing { expected, .. }) => {
                failures += 1;
                eprintln!("{label}: hash missing in {rel}");
                eprintln!("  expected: {expected}");
                eprintln!("  found:    <none>");
            }
            Err(HashError::HashMismatch {
                expected, found, ..
            }) => {
                failures += 1;
                eprintln!("{label}: hash mismatch in {rel}");
                eprintln!("  expected: {expected}");
                eprintln!("  found:    {found}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    if failures > 0 {
        return Err(anyhow!(
            "{failures} content hash check(s) failed; run `gprov hash --update` to restamp"
        ));
    }
    Ok(())
}
