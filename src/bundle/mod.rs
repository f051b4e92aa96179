//! Promotion bundle assembly.
//!
//! A bundle is a directory holding the release artifacts, a manifest, and a
//! checksums listing. The bundle hash depends only on artifact bytes: it is
//! computed from the collected artifacts before any run metadata is
//! attached to the manifest.
mod artifacts;
mod manifest;

pub use artifacts::{collect_artifacts, plan_artifacts};
pub use manifest::{
    compute_bundle_hash, render_checksums, GateStatus, Gates, PromotionManifest,
    TargetEnvironment, MANIFEST_SCHEMA_VERSION, MANIFEST_VERSION,
};

use crate::paths::{ReleasePaths, CHECKSUMS_FILE, MANIFEST_FILE};
use crate::util::{to_pretty_json, write_atomic};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("invalid target environment {0:?} (expected \"staging\" or \"production\")")]
    InvalidTarget(String),
    #[error(
        "parity gate was skipped for a production promotion; \
         pass --parity-skip-ack <reason> to acknowledge"
    )]
    ParityAckRequired,
    #[error("artifact source has no file name: {}", .0.display())]
    BadSource(PathBuf),
    #[error("artifacts {first} and {second} would both be written as {file_name:?}")]
    NameCollision {
        first: &'static str,
        second: &'static str,
        file_name: String,
    },
    #[error("artifact {artifact} would be written as {file_name:?}, which the bundle reserves")]
    ReservedName {
        artifact: &'static str,
        file_name: String,
    },
    #[error(
        "bundle output would overwrite the {artifact} source {}; choose a different --out",
        path.display()
    )]
    OverwritesSource {
        artifact: &'static str,
        path: PathBuf,
    },
    #[error("{action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize bundle output: {0}")]
    Serialize(String),
}

impl BundleError {
    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        BundleError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Caller-supplied inputs for one promotion attempt.
///
/// Everything except `target`, `gates`, and `out_dir` is descriptive run
/// metadata that never reaches the bundle hash.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub target: TargetEnvironment,
    pub gates: Gates,
    pub parity_skip_ack: Option<String>,
    pub sha: String,
    pub triggered_by: String,
    pub run_id: String,
    pub timestamp: String,
    pub out_dir: PathBuf,
}

impl BundleRequest {
    /// Reject requests that must not produce a bundle. Runs before any I/O.
    pub fn validate(&self) -> Result<(), BundleError> {
        check_promotion(self.target, &self.gates, self.parity_skip_ack.as_deref())
    }
}

/// Promotion rules that depend only on caller input.
///
/// A production promotion with the parity gate skipped must carry a
/// non-blank acknowledgement.
pub fn check_promotion(
    target: TargetEnvironment,
    gates: &Gates,
    parity_skip_ack: Option<&str>,
) -> Result<(), BundleError> {
    let acknowledged = parity_skip_ack.is_some_and(|ack| !ack.trim().is_empty());
    if target == TargetEnvironment::Production
        && gates.parity == GateStatus::Skipped
        && !acknowledged
    {
        return Err(BundleError::ParityAckRequired);
    }
    Ok(())
}

/// Paths written by a bundle run.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub manifest: PromotionManifest,
    pub manifest_path: PathBuf,
    pub checksums_path: PathBuf,
}

/// Assemble, hash, and persist a promotion bundle.
pub fn generate_bundle(
    paths: &ReleasePaths,
    request: &BundleRequest,
) -> Result<BundleOutput, BundleError> {
    request.validate()?;
    let bundle_dir = &request.out_dir;
    let plan = plan_artifacts(paths, bundle_dir)?;
    fs::create_dir_all(bundle_dir).map_err(|err| BundleError::io("create", bundle_dir, err))?;

    let mut artifacts = collect_artifacts(paths, &plan, bundle_dir)?;
    artifacts.sort_by(|left, right| left.name.cmp(&right.name));
    let bundle_hash = compute_bundle_hash(&artifacts);
    if artifacts.is_empty() {
        tracing::warn!("no artifacts found; bundle hash covers an empty set");
    }

    let parity_skipped = request.gates.parity == GateStatus::Skipped;
    let manifest = PromotionManifest {
        version: MANIFEST_VERSION.to_string(),
        schema_version: MANIFEST_SCHEMA_VERSION,
        timestamp: request.timestamp.clone(),
        sha: request.sha.clone(),
        target_environment: request.target,
        triggered_by: request.triggered_by.clone(),
        run_id: request.run_id.clone(),
        gates: request.gates,
        parity_skipped,
        parity_skip_acknowledgement: if parity_skipped {
            request.parity_skip_ack.clone()
        } else {
            None
        },
        artifacts,
        bundle_hash,
    };

    let manifest_path = bundle_dir.join(MANIFEST_FILE);
    let text =
        to_pretty_json(&manifest).map_err(|err| BundleError::Serialize(err.to_string()))?;
    write_atomic(&manifest_path, text.as_bytes())
        .map_err(|err| BundleError::io("write", &manifest_path, err))?;

    let checksums_path = bundle_dir.join(CHECKSUMS_FILE);
    write_atomic(
        &checksums_path,
        render_checksums(&manifest.artifacts).as_bytes(),
    )
    .map_err(|err| BundleError::io("write", &checksums_path, err))?;

    tracing::info!(
        target_environment = %manifest.target_environment,
        artifacts = manifest.artifacts.len(),
        bundle_hash = %manifest.bundle_hash,
        "wrote promotion bundle"
    );
    Ok(BundleOutput {
        manifest,
        manifest_path,
        checksums_path,
    })
}
