//! Typed paths into a release checkout.
//!
//! Centralizing path construction keeps hashing, provenance, and bundling
//! pointed at the same files.
use crate::config::PipelineConfig;
use std::path::{Path, PathBuf};

/// Bundle manifest file name.
pub const MANIFEST_FILE: &str = "promotion-manifest.json";
/// Bundle checksums file name.
pub const CHECKSUMS_FILE: &str = "checksums.txt";
/// Pointer record written in place of the dataset.
pub const DATASET_REFERENCE_FILE: &str = "dataset-reference.json";

/// Resolves configured relative paths under the repo root.
#[derive(Debug, Clone)]
pub struct ReleasePaths {
    root: PathBuf,
    config: PipelineConfig,
}

impl ReleasePaths {
    pub fn new(root: PathBuf, config: PipelineConfig) -> Self {
        Self { root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.root.join(&self.config.dataset)
    }

    pub fn thresholds_path(&self) -> PathBuf {
        self.root.join(&self.config.thresholds)
    }

    pub fn provenance_path(&self) -> PathBuf {
        self.root.join(&self.config.provenance)
    }

    pub fn parity_report_path(&self) -> PathBuf {
        self.root.join(&self.config.parity_report)
    }

    pub fn baseline_comparison_path(&self) -> PathBuf {
        self.root.join(&self.config.baseline_comparison)
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.root.join(&self.config.bundle_dir)
    }

    /// Path relative to the root for display and pointer records.
    pub fn rel(&self, path: &Path) -> String {
        crate::util::display_path(path, Some(&self.root))
    }
}
