//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch repository checkout with the default pipeline layout.
pub struct Repo {
    dir: TempDir,
}

/// Captured run of the `gprov` binary.
pub struct Run {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Run {
    fn from_output(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    #[track_caller]
    pub fn assert_success(&self) {
        assert_eq!(
            self.code,
            Some(0),
            "expected success\nstdout:\n{}\nstderr:\n{}",
            self.stdout,
            self.stderr
        );
    }

    #[track_caller]
    pub fn assert_failure(&self) {
        assert_eq!(
            self.code,
            Some(1),
            "expected exit 1\nstdout:\n{}\nstderr:\n{}",
            self.stdout,
            self.stderr
        );
    }
}

pub const DATASET_REL: &str = "golden/dataset.json";
pub const THRESHOLDS_REL: &str = "config/thresholds.json";
/// Default bundle directory (used by bundle_cli tests).
#[allow(dead_code)]
pub const BUNDLE_REL: &str = "release/promotion-bundle";

pub const SAMPLE_DATASET: &str = r#"{
  "version": "1.0",
  "documents": [
    {
      "id": "doc-001",
      "validatedFields": [{"ruleId": "R001", "status": "fail", "reasonCode": "MISSING_SIGNATURE"}],
      "findings": [{"id": "f-001", "severity": "major", "reasonCode": "MISSING_SIGNATURE"}]
    }
  ],
  "rules": [{"ruleId": "R001", "severity": "major"}],
  "reasonCodes": {"MISSING_SIGNATURE": "Signature block is empty"}
}
"#;

pub const SAMPLE_THRESHOLDS: &str = r#"{
  "version": "2",
  "minFieldConfidence": 0.85,
  "maxCriticalFindings": 0
}
"#;

impl Repo {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Repo with the sample dataset and thresholds, unstamped.
    pub fn with_sample_inputs() -> Self {
        let repo = Self::new();
        repo.write(DATASET_REL, SAMPLE_DATASET);
        repo.write(THRESHOLDS_REL, SAMPLE_THRESHOLDS);
        repo
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    #[allow(dead_code)]
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(path, contents.as_bytes()).expect("write file");
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root().join(rel)).expect("read file")
    }

    pub fn read_json(&self, rel: &str) -> serde_json::Value {
        serde_json::from_str(&self.read(rel)).expect("parse JSON")
    }

    /// Run `gprov --root <repo> <args...>` with CI variables cleared.
    pub fn gprov(&self, args: &[&str]) -> Run {
        self.gprov_with_env(args, &[])
    }

    pub fn gprov_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Run {
        let mut command = Command::new(env!("CARGO_BIN_EXE_gprov"));
        command.arg("--root").arg(self.root()).args(args);
        for key in [
            "GITHUB_SHA",
            "GITHUB_REF_NAME",
            "GITHUB_ACTOR",
            "GITHUB_RUN_ID",
            "GITHUB_SERVER_URL",
            "GITHUB_REPOSITORY",
            "RUST_LOG",
        ] {
            command.env_remove(key);
        }
        for (key, value) in env {
            command.env(key, value);
        }
        Run::from_output(command.output().expect("run gprov"))
    }
}
