//! Release pipeline configuration.
//!
//! The config names every input and output location relative to the repo
//! root so hashing, provenance, and bundling agree on the same files.
use crate::util::{read_json, validate_relative_path, write_json};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current schema version for `release/config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Default location of the config under the repo root.
pub const CONFIG_REL: &str = "release/config.json";

/// Relative locations of pipeline inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub schema_version: u32,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default = "default_thresholds")]
    pub thresholds: String,
    #[serde(default = "default_provenance")]
    pub provenance: String,
    #[serde(default = "default_parity_report")]
    pub parity_report: String,
    #[serde(default = "default_baseline_comparison")]
    pub baseline_comparison: String,
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: String,
}

fn default_dataset() -> String {
    "golden/dataset.json".to_string()
}

fn default_thresholds() -> String {
    "config/thresholds.json".to_string()
}

fn default_provenance() -> String {
    "release/provenance.json".to_string()
}

fn default_parity_report() -> String {
    "reports/parity-report.json".to_string()
}

fn default_baseline_comparison() -> String {
    "reports/baseline-comparison.json".to_string()
}

fn default_bundle_dir() -> String {
    "release/promotion-bundle".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            dataset: default_dataset(),
            thresholds: default_thresholds(),
            provenance: default_provenance(),
            parity_report: default_parity_report(),
            baseline_comparison: default_baseline_comparison(),
            bundle_dir: default_bundle_dir(),
        }
    }
}

/// Load a config file, falling back to defaults when `required` is false and
/// the file does not exist.
pub fn load_config(path: &Path, required: bool) -> Result<PipelineConfig> {
    if !path.exists() {
        if required {
            return Err(anyhow!("config not found: {}", path.display()));
        }
        tracing::debug!(path = %path.display(), "config absent; using defaults");
        return Ok(PipelineConfig::default());
    }
    let config: PipelineConfig =
        read_json(path).with_context(|| format!("load config {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Persist a config in a stable JSON format.
pub fn write_config(path: &Path, config: &PipelineConfig) -> Result<()> {
    write_json(path, config)
}

/// Validate schema version and path shapes.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported release config schema_version {}",
            config.schema_version
        ));
    }
    for (label, rel) in [
        ("dataset", &config.dataset),
        ("thresholds", &config.thresholds),
        ("provenance", &config.provenance),
        ("parity_report", &config.parity_report),
        ("baseline_comparison", &config.baseline_comparison),
        ("bundle_dir", &config.bundle_dir),
    ] {
        validate_relative_path(rel, label)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&dir.path().join(CONFIG_REL), false).expect("defaults");
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn missing_required_config_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(load_config(&dir.path().join("custom.json"), true).is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_REL);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, r#"{"schema_version":1,"dataset":"data/golden.json"}"#)
            .expect("write");
        let config = load_config(&path, false).expect("load");
        assert_eq!(config.dataset, "data/golden.json");
        assert_eq!(config.thresholds, default_thresholds());
    }

    #[test]
    fn rejects_bad_schema_and_paths() {
        let mut config = PipelineConfig {
            schema_version: 9,
            ..PipelineConfig::default()
        };
        assert!(validate_config(&config).is_err());
        config.schema_version = CONFIG_SCHEMA_VERSION;
        config.bundle_dir = "../escape".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<PipelineConfig, _> =
            serde_json::from_str(r#"{"schema_version":1,"datset":"typo.json"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn write_then_load_is_stable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_REL);
        write_config(&path, &PipelineConfig::default()).expect("write");
        assert_eq!(
            load_config(&path, true).expect("load"),
            PipelineConfig::default()
        );
    }
}
