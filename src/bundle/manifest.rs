//! Promotion manifest schema and the bundle hash.
use crate::content_hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::BundleError;

/// Current value of the manifest `version` field.
pub const MANIFEST_VERSION: &str = "1.0.0";
/// Current schema version for `promotion-manifest.json`.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Environments a bundle may be promoted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetEnvironment {
    Staging,
    Production,
}

impl TargetEnvironment {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetEnvironment::Staging => "staging",
            TargetEnvironment::Production => "production",
        }
    }
}

impl fmt::Display for TargetEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetEnvironment {
    type Err = BundleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "staging" => Ok(TargetEnvironment::Staging),
            "production" => Ok(TargetEnvironment::Production),
            other => Err(BundleError::InvalidTarget(other.to_string())),
        }
    }
}

/// Outcome of one upstream gate, as reported by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Passed,
    Failed,
    #[default]
    Skipped,
}

/// Gate outcomes recorded in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Gates {
    pub ci: GateStatus,
    pub policy: GateStatus,
    pub rehearsal: GateStatus,
    pub parity: GateStatus,
}

/// One hashed file in the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    /// Path relative to the bundle directory.
    pub path: String,
    pub hash: ContentHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionManifest {
    pub version: String,
    pub schema_version: u32,
    pub timestamp: String,
    pub sha: String,
    pub target_environment: TargetEnvironment,
    pub triggered_by: String,
    pub run_id: String,
    pub gates: Gates,
    pub parity_skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parity_skip_acknowledgement: Option<String>,
    pub artifacts: Vec<Artifact>,
    pub bundle_hash: ContentHash,
}

/// Aggregate hash over the multiset of artifact hashes.
///
/// Hash strings are sorted on their own, so neither artifact names nor the
/// order artifacts were collected in can change the result.
pub fn compute_bundle_hash(artifacts: &[Artifact]) -> ContentHash {
    let mut hashes: Vec<&str> = artifacts
        .iter()
        .map(|artifact| artifact.hash.as_str())
        .collect();
    hashes.sort_unstable();
    ContentHash::of_bytes(hashes.join(":").as_bytes())
}

/// `<hash>  <path>` lines in manifest order.
pub fn render_checksums(artifacts: &[Artifact]) -> String {
    artifacts
        .iter()
        .map(|artifact| format!("{}  {}\n", artifact.hash, artifact.path))
        .collect()
}
