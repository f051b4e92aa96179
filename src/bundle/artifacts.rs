//! The fixed set of release artifacts and how each one enters the bundle.
use super::manifest::Artifact;
use super::BundleError;
use crate::content_hash::{file_hash, ContentHash};
use crate::paths::{ReleasePaths, CHECKSUMS_FILE, DATASET_REFERENCE_FILE, MANIFEST_FILE};
use crate::util::{to_pretty_json, write_atomic};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// How a source file is carried into the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Copied byte-for-byte under its own file name.
    Copy,
    /// Replaced by a small pointer record naming the file and its hash.
    Pointer,
}

/// One row of the artifact table.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactSpec {
    pub name: &'static str,
    pub kind: ArtifactKind,
    source: fn(&ReleasePaths) -> PathBuf,
}

impl ArtifactSpec {
    pub fn source(&self, paths: &ReleasePaths) -> PathBuf {
        (self.source)(paths)
    }
}

/// Every candidate artifact. Absent sources are skipped, not errors.
pub static ARTIFACT_TABLE: [ArtifactSpec; 5] = [
    ArtifactSpec {
        name: "provenance",
        kind: ArtifactKind::Copy,
        source: ReleasePaths::provenance_path,
    },
    ArtifactSpec {
        name: "thresholds",
        kind: ArtifactKind::Copy,
        source: ReleasePaths::thresholds_path,
    },
    ArtifactSpec {
        name: "dataset-reference",
        kind: ArtifactKind::Pointer,
        source: ReleasePaths::dataset_path,
    },
    ArtifactSpec {
        name: "parity-report",
        kind: ArtifactKind::Copy,
        source: ReleasePaths::parity_report_path,
    },
    ArtifactSpec {
        name: "baseline-comparison",
        kind: ArtifactKind::Copy,
        source: ReleasePaths::baseline_comparison_path,
    },
];

/// Files the bundle writes itself.
const RESERVED_FILES: [&str; 3] = [MANIFEST_FILE, CHECKSUMS_FILE, DATASET_REFERENCE_FILE];

/// Pointer written instead of copying the golden dataset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetReference {
    path: String,
    file_hash: ContentHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
}

/// Where one table row lands in the bundle directory.
#[derive(Debug, Clone)]
pub struct PlannedArtifact {
    spec: &'static ArtifactSpec,
    source: PathBuf,
    file_name: String,
}

/// Resolve every destination name and reject layouts that would overwrite
/// an input. Runs before anything is written.
///
/// Destination names must be unique and must not shadow the manifest,
/// checksums, or dataset pointer files. No existing source may already sit
/// at a destination the bundle writes.
pub fn plan_artifacts(
    paths: &ReleasePaths,
    bundle_dir: &Path,
) -> Result<Vec<PlannedArtifact>, BundleError> {
    let mut plan: Vec<PlannedArtifact> = Vec::with_capacity(ARTIFACT_TABLE.len());
    for spec in &ARTIFACT_TABLE {
        let source = spec.source(paths);
        let file_name = bundle_file_name(spec, &source)?;
        if spec.kind == ArtifactKind::Copy && RESERVED_FILES.contains(&file_name.as_str()) {
            return Err(BundleError::ReservedName {
                artifact: spec.name,
                file_name,
            });
        }
        if let Some(other) = plan.iter().find(|planned| planned.file_name == file_name) {
            return Err(BundleError::NameCollision {
                first: other.spec.name,
                second: spec.name,
                file_name,
            });
        }
        plan.push(PlannedArtifact {
            spec,
            source,
            file_name,
        });
    }

    let destinations = plan
        .iter()
        .map(|planned| bundle_dir.join(&planned.file_name))
        .chain(RESERVED_FILES.iter().map(|name| bundle_dir.join(name)));
    for dest in destinations {
        for planned in &plan {
            if same_file(&planned.source, &dest)? {
                return Err(BundleError::OverwritesSource {
                    artifact: planned.spec.name,
                    path: planned.source.clone(),
                });
            }
        }
    }
    Ok(plan)
}

/// Carry every present source into `bundle_dir`, in table order.
pub fn collect_artifacts(
    paths: &ReleasePaths,
    plan: &[PlannedArtifact],
    bundle_dir: &Path,
) -> Result<Vec<Artifact>, BundleError> {
    let mut artifacts = Vec::new();
    for planned in plan {
        let PlannedArtifact {
            spec,
            source,
            file_name,
        } = planned;
        let dest = bundle_dir.join(file_name);
        if !source_exists(source)? {
            tracing::debug!(artifact = spec.name, source = %source.display(), "artifact source absent; skipping");
            remove_stale(&dest)?;
            continue;
        }
        match spec.kind {
            ArtifactKind::Copy => {
                fs::copy(source, &dest).map_err(|err| BundleError::io("copy", source, err))?;
            }
            ArtifactKind::Pointer => write_dataset_reference(paths, source, &dest)?,
        }
        let hash = file_hash(&dest).map_err(|err| BundleError::io("hash", &dest, err))?;
        tracing::info!(artifact = spec.name, %hash, "collected artifact");
        artifacts.push(Artifact {
            name: spec.name.to_string(),
            path: file_name.clone(),
            hash,
        });
    }
    Ok(artifacts)
}

fn bundle_file_name(spec: &ArtifactSpec, source: &Path) -> Result<String, BundleError> {
    if spec.kind == ArtifactKind::Pointer {
        return Ok(DATASET_REFERENCE_FILE.to_string());
    }
    source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| BundleError::BadSource(source.to_path_buf()))
}

/// Both paths exist and resolve to the same file.
fn same_file(left: &Path, right: &Path) -> Result<bool, BundleError> {
    let resolve = |path: &Path| match fs::canonicalize(path) {
        Ok(resolved) => Ok(Some(resolved)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(BundleError::io("resolve", path, err)),
    };
    match (resolve(left)?, resolve(right)?) {
        (Some(left), Some(right)) => Ok(left == right),
        _ => Ok(false),
    }
}

fn source_exists(path: &Path) -> Result<bool, BundleError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(BundleError::io("inspect", path, err)),
    }
}

fn remove_stale(dest: &Path) -> Result<(), BundleError> {
    match fs::remove_file(dest) {
        Ok(()) => {
            tracing::info!(path = %dest.display(), "removed stale bundle artifact");
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(BundleError::io("remove", dest, err)),
    }
}

fn write_dataset_reference(
    paths: &ReleasePaths,
    dataset: &Path,
    dest: &Path,
) -> Result<(), BundleError> {
    let bytes = fs::read(dataset).map_err(|err| BundleError::io("read", dataset, err))?;
    let parsed: Value = serde_json::from_slice(&bytes).map_err(|source| BundleError::Parse {
        path: dataset.to_path_buf(),
        source,
    })?;
    let reference = DatasetReference {
        path: paths.rel(dataset),
        file_hash: ContentHash::of_bytes(&bytes),
        version: parsed
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string),
        content_hash: parsed
            .get("contentHash")
            .and_then(Value::as_str)
            .map(str::to_string),
    };
    let text = to_pretty_json(&reference).map_err(|err| BundleError::Serialize(err.to_string()))?;
    write_atomic(dest, text.as_bytes()).map_err(|err| BundleError::io("write", dest, err))
}
