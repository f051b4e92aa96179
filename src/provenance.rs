//! Provenance record tying a CI run to exact dataset and thresholds content.
use crate::content_hash::{ContentHash, HashedDocument};
use crate::context::RunContext;
use crate::paths::ReleasePaths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Provenance written once per CI run.
///
/// The CI fields are informational; only the content hashes identify inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub generated_at: String,
    pub dataset_version: String,
    pub dataset_content_hash: ContentHash,
    pub thresholds_version: String,
    pub thresholds_content_hash: ContentHash,
    pub git_head_sha: String,
    pub git_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_run_url: Option<String>,
}

/// Build provenance from the current dataset and thresholds files.
///
/// Hashes are recomputed from content rather than trusted from the stored
/// `contentHash` fields.
pub fn build_provenance(paths: &ReleasePaths, ctx: &RunContext) -> Result<Provenance> {
    let dataset = HashedDocument::load(&paths.dataset_path()).context("load golden dataset")?;
    let thresholds =
        HashedDocument::load(&paths.thresholds_path()).context("load thresholds config")?;
    Ok(Provenance {
        generated_at: ctx.timestamp(),
        dataset_version: version_or_unknown(&dataset),
        dataset_content_hash: dataset.computed.clone(),
        thresholds_version: version_or_unknown(&thresholds),
        thresholds_content_hash: thresholds.computed.clone(),
        git_head_sha: ctx.git_sha(paths.root()),
        git_branch: ctx.git_branch(paths.root()),
        ci_run_id: ctx.ci_run_id(),
        ci_run_url: ctx.ci_run_url(),
    })
}

fn version_or_unknown(document: &HashedDocument) -> String {
    document.version().unwrap_or("unknown").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::content_hash::compute_content_hash;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::fs;

    fn fixture() -> (tempfile::TempDir, ReleasePaths) {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = ReleasePaths::new(dir.path().to_path_buf(), PipelineConfig::default());
        fs::create_dir_all(dir.path().join("golden")).expect("mkdir golden");
        fs::create_dir_all(dir.path().join("config")).expect("mkdir config");
        fs::write(
            paths.dataset_path(),
            json!({"version": "1.2", "documents": [], "rules": [], "reasonCodes": {}}).to_string(),
        )
        .expect("write dataset");
        fs::write(
            paths.thresholds_path(),
            json!({"version": "7", "contentHash": "sha256:stale", "minConfidence": 0.8})
                .to_string(),
        )
        .expect("write thresholds");
        (dir, paths)
    }

    fn ci_context(run_id: &str) -> RunContext {
        let vars: BTreeMap<String, String> = [
            ("GITHUB_SHA", "0123abcd"),
            ("GITHUB_REF_NAME", "main"),
            ("GITHUB_RUN_ID", run_id),
            ("GITHUB_SERVER_URL", "https://github.com"),
            ("GITHUB_REPOSITORY", "acme/audit"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let now = Utc
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("timestamp");
        RunContext::new(vars, now)
    }

    #[test]
    fn records_recomputed_hashes_and_ci_metadata() {
        let (_dir, paths) = fixture();
        let provenance = build_provenance(&paths, &ci_context("99")).expect("provenance");
        assert_eq!(provenance.dataset_version, "1.2");
        assert_eq!(provenance.thresholds_version, "7");
        assert_eq!(
            provenance.thresholds_content_hash,
            compute_content_hash(&json!({"version": "7", "minConfidence": 0.8}))
        );
        assert_eq!(provenance.git_head_sha, "0123abcd");
        assert_eq!(provenance.git_branch, "main");
        assert_eq!(provenance.ci_run_id.as_deref(), Some("99"));
        assert_eq!(
            provenance.ci_run_url.as_deref(),
            Some("https://github.com/acme/audit/actions/runs/99")
        );
        assert_eq!(provenance.generated_at, "2026-01-02T03:04:05.000Z");
    }

    #[test]
    fn ci_fields_do_not_affect_content_hashes() {
        let (_dir, paths) = fixture();
        let first = build_provenance(&paths, &ci_context("1")).expect("first");
        let second = build_provenance(&paths, &ci_context("2")).expect("second");
        assert_eq!(first.dataset_content_hash, second.dataset_content_hash);
        assert_eq!(first.thresholds_content_hash, second.thresholds_content_hash);
        assert_ne!(first.ci_run_id, second.ci_run_id);
    }

    #[test]
    fn serializes_camel_case_and_omits_absent_ci_fields() {
        let (_dir, paths) = fixture();
        let ctx = RunContext::new(BTreeMap::new(), Utc::now());
        let provenance = build_provenance(&paths, &ctx).expect("provenance");
        let value = serde_json::to_value(&provenance).expect("serialize");
        assert!(value.get("datasetContentHash").is_some());
        assert!(value.get("ciRunId").is_none());
        assert!(value.get("ciRunUrl").is_none());
    }

    #[test]
    fn missing_thresholds_is_fatal() {
        let (_dir, paths) = fixture();
        fs::remove_file(paths.thresholds_path()).expect("remove thresholds");
        let err = build_provenance(&paths, &ci_context("1")).expect_err("missing");
        assert!(format!("{err:#}").contains("required file not found"));
    }
}
