//! Versioned content hashes and the verify/update workflow for hashable
//! JSON documents (the golden dataset and the thresholds config).
//!
//! A document's hash is `sha256:` + the hex SHA-256 of its canonical form.
//! Because the canonical form drops `contentHash`, the stored hash never
//! feeds into its own computation.
use crate::canonical::{canonicalize, CONTENT_HASH_KEY};
use crate::util::{sha256_hex, write_atomic};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Algorithm prefix carried by every hash string.
pub const CONTENT_HASH_PREFIX: &str = "sha256:";

static CONTENT_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sha256:[a-f0-9]{64}$").expect("valid content hash regex"));

/// A `sha256:<64 lowercase hex>` digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

/// Rejected hash string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid content hash {0:?} (expected sha256:<64 lowercase hex>)")]
pub struct InvalidContentHash(pub String);

impl ContentHash {
    /// Hash raw bytes as-is.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{CONTENT_HASH_PREFIX}{}", sha256_hex(bytes)))
    }

    pub fn parse(text: &str) -> Result<Self, InvalidContentHash> {
        if CONTENT_HASH_RE.is_match(text) {
            Ok(Self(text.to_string()))
        } else {
            Err(InvalidContentHash(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = InvalidContentHash;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Hash of the canonical form of `value`.
pub fn compute_content_hash(value: &Value) -> ContentHash {
    ContentHash::of_bytes(canonicalize(value).as_bytes())
}

/// Hash of a file's raw bytes, no canonicalization.
pub fn file_hash(path: &Path) -> io::Result<ContentHash> {
    let bytes = fs::read(path)?;
    Ok(ContentHash::of_bytes(&bytes))
}

/// Whether the caller wants to check or rewrite the stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    Verify,
    Update,
}

#[derive(Debug, Error)]
pub enum HashError {
    #[error("required file not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("hash missing in {}: expected {expected}, found <none>", path.display())]
    HashMissing { path: PathBuf, expected: ContentHash },
    #[error("hash mismatch in {}: expected {expected}, found {found}", path.display())]
    HashMismatch {
        path: PathBuf,
        expected: ContentHash,
        found: String,
    },
    #[error("{} must contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },
    #[error("read {}", path.display())]
    Read {
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
    #[error("write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serialize {}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A parsed document plus its stored and recomputed hashes.
#[derive(Debug, Clone)]
pub struct HashedDocument {
    pub path: PathBuf,
    pub value: Value,
    pub computed: ContentHash,
}

impl HashedDocument {
    /// Load and hash a JSON object document.
    pub fn load(path: &Path) -> Result<Self, HashError> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => HashError::Missing {
                path: path.to_path_buf(),
            },
            _ => HashError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|source| HashError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if !value.is_object() {
            return Err(HashError::NotAnObject {
                path: path.to_path_buf(),
            });
        }
        let computed = compute_content_hash(&value);
        tracing::debug!(path = %path.display(), hash = %computed, "computed content hash");
        Ok(Self {
            path: path.to_path_buf(),
            value,
            computed,
        })
    }

    /// The stored `contentHash` field, if any.
    pub fn stored(&self) -> Option<&Value> {
        self.value.get(CONTENT_HASH_KEY)
    }

    /// Top-level `version` string, if present.
    pub fn version(&self) -> Option<&str> {
        self.value.get("version").and_then(Value::as_str)
    }

    fn stored_matches(&self) -> bool {
        self.stored().and_then(Value::as_str) == Some(self.computed.as_str())
    }

    /// Compare the stored hash against the recomputed one.
    pub fn verify(&self) -> Result<&ContentHash, HashError> {
        match self.stored() {
            None => Err(HashError::HashMissing {
                path: self.path.clone(),
                expected: self.computed.clone(),
            }),
            Some(_) if self.stored_matches() => Ok(&self.computed),
            Some(stored) => Err(HashError::HashMismatch {
                path: self.path.clone(),
                expected: self.computed.clone(),
                found: render_stored(stored),
            }),
        }
    }
}

fn render_stored(stored: &Value) -> String {
    match stored {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Result of an update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Stored hash already matched; the file was not touched.
    Unchanged(ContentHash),
    /// The file was rewritten with a new hash.
    Stamped {
        previous: Option<String>,
        current: ContentHash,
    },
}

#[cfg(test)]
impl UpdateOutcome {
    pub fn hash(&self) -> &ContentHash {
        match self {
            UpdateOutcome::Unchanged(hash) => hash,
            UpdateOutcome::Stamped { current, .. } => current,
        }
    }
}

/// Load, recompute, and compare a document's stored hash.
pub fn verify_document(path: &Path) -> Result<ContentHash, HashError> {
    let document = HashedDocument::load(path)?;
    document.verify().cloned()
}

/// Stamp a document with its recomputed hash, rewriting it in place.
pub fn update_document(path: &Path) -> Result<UpdateOutcome, HashError> {
    let mut document = HashedDocument::load(path)?;
    if document.stored_matches() {
        return Ok(UpdateOutcome::Unchanged(document.computed));
    }
    let previous = document.stored().map(render_stored);
    let current = document.computed.clone();
    if let Value::Object(map) = &mut document.value {
        map.insert(
            CONTENT_HASH_KEY.to_string(),
            Value::String(current.to_string()),
        );
    }
    let mut text =
        serde_json::to_string_pretty(&document.value).map_err(|source| HashError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    text.push('\n');
    write_atomic(path, text.as_bytes()).map_err(|source| HashError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), hash = %current, "stamped content hash");
    Ok(UpdateOutcome::Stamped { previous, current })
}

/// Run either mode against one document.
pub fn process_document(path: &Path, mode: HashMode) -> Result<UpdateOutcome, HashError> {
    match mode {
        HashMode::Verify => verify_document(path).map(UpdateOutcome::Unchanged),
        HashMode::Update => update_document(path),
    }
}

#[cfg(test)]
#[path = "content_hash_tests.rs"]
mod tests;
