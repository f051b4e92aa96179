//! Workflow check step.
use crate::dataset::check_dataset;
use crate::paths::ReleasePaths;
use crate::util::read_json;
use anyhow::{anyhow, Result};
use serde_json::Value;

/// Check dataset invariants and list every violation.
pub(super) fn run_check(paths: &ReleasePaths) -> Result<()> {
    let path = paths.dataset_path();
    if !path.is_file() {
        return Err(anyhow!("golden dataset not found: {}", path.display()));
    }
    let dataset: Value = read_json(&path)?;
    let violations = check_dataset(&dataset);
    let rel = paths.rel(&path);
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("{rel}#{violation}");
        }
        return Err(anyhow!(
            "{} dataset invariant violation(s) in {rel}",
            violations.len()
        ));
    }
    let count = |key: &str| dataset.get(key).and_then(Value::as_array).map_or(0, Vec::len);
    println!(
        "{rel}: ok ({} documents, {} rules)",
        count("documents"),
        count("rules")
    );
    Ok(())
}
