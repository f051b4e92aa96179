//! Run metadata supplied by the CI environment or the local checkout.
//!
//! Nothing here feeds a hash. Environment access goes through a captured
//! snapshot so tests construct their own context instead of mutating the
//! process environment.
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Environment keys consulted for run metadata.
pub const CONTEXT_ENV_KEYS: [&str; 8] = [
    "GITHUB_SHA",
    "GITHUB_REF_NAME",
    "GITHUB_ACTOR",
    "GITHUB_RUN_ID",
    "GITHUB_SERVER_URL",
    "GITHUB_REPOSITORY",
    "USER",
    "USERNAME",
];

const UNKNOWN: &str = "unknown";

/// Captured environment plus a fixed clock reading.
#[derive(Debug, Clone)]
pub struct RunContext {
    vars: BTreeMap<String, String>,
    now: DateTime<Utc>,
}

impl RunContext {
    /// Snapshot the process environment and clock.
    pub fn from_process_env() -> Self {
        let vars = CONTEXT_ENV_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::new(vars, Utc::now())
    }

    pub fn new(vars: BTreeMap<String, String>, now: DateTime<Utc>) -> Self {
        Self { vars, now }
    }

    fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// RFC 3339 UTC timestamp with millisecond precision.
    pub fn timestamp(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Commit under test: `GITHUB_SHA`, else `git rev-parse HEAD`.
    pub fn git_sha(&self, root: &Path) -> String {
        self.var("GITHUB_SHA")
            .map(str::to_string)
            .or_else(|| git_output(root, &["rev-parse", "HEAD"]))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Branch name: `GITHUB_REF_NAME`, else the checked-out branch.
    pub fn git_branch(&self, root: &Path) -> String {
        self.var("GITHUB_REF_NAME")
            .map(str::to_string)
            .or_else(|| git_output(root, &["rev-parse", "--abbrev-ref", "HEAD"]))
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Who triggered the run.
    pub fn actor(&self) -> String {
        self.var("GITHUB_ACTOR")
            .or_else(|| self.var("USER"))
            .or_else(|| self.var("USERNAME"))
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    /// CI run id, or `local` outside CI.
    pub fn run_id(&self) -> String {
        self.ci_run_id().unwrap_or_else(|| "local".to_string())
    }

    pub fn ci_run_id(&self) -> Option<String> {
        self.var("GITHUB_RUN_ID").map(str::to_string)
    }

    pub fn ci_run_url(&self) -> Option<String> {
        let server = self.var("GITHUB_SERVER_URL")?;
        let repository = self.var("GITHUB_REPOSITORY")?;
        let run_id = self.var("GITHUB_RUN_ID")?;
        Some(format!(
            "{}/{repository}/actions/runs/{run_id}",
            server.trim_end_matches('/')
        ))
    }
}

fn git_output(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(?args, "git query failed");
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn context(pairs: &[(&str, &str)]) -> RunContext {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 15, 9, 26)
            .single()
            .expect("valid timestamp");
        RunContext::new(vars, now)
    }

    #[test]
    fn ci_variables_take_precedence() {
        let ctx = context(&[
            ("GITHUB_SHA", "abc123"),
            ("GITHUB_REF_NAME", "main"),
            ("GITHUB_ACTOR", "release-bot"),
            ("USER", "someone"),
            ("GITHUB_RUN_ID", "42"),
            ("GITHUB_SERVER_URL", "https://github.com/"),
            ("GITHUB_REPOSITORY", "acme/audit"),
        ]);
        let root = Path::new(".");
        assert_eq!(ctx.git_sha(root), "abc123");
        assert_eq!(ctx.git_branch(root), "main");
        assert_eq!(ctx.actor(), "release-bot");
        assert_eq!(ctx.run_id(), "42");
        assert_eq!(
            ctx.ci_run_url().as_deref(),
            Some("https://github.com/acme/audit/actions/runs/42")
        );
    }

    #[test]
    fn local_defaults() {
        let ctx = context(&[("USER", "dev"), ("GITHUB_ACTOR", "  ")]);
        assert_eq!(ctx.actor(), "dev");
        assert_eq!(ctx.run_id(), "local");
        assert!(ctx.ci_run_id().is_none());
        assert!(ctx.ci_run_url().is_none());
    }

    #[test]
    fn git_fallback_outside_a_repo_is_unknown() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ctx = context(&[]);
        assert_eq!(ctx.git_sha(dir.path()), UNKNOWN);
        assert_eq!(ctx.actor(), UNKNOWN);
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        assert_eq!(context(&[]).timestamp(), "2026-03-14T15:09:26.000Z");
    }
}
