//! Artifact lock maintenance for built packs.
//!
//! The lock records a content digest for every `*.gtpack` in the dist
//! directory. Other tools annotate entries (and the document) with their own
//! fields, so a refresh only ever rewrites `name`, `file` and `digest`.
use crate::provenance::{format_timestamp, Provenance};
use crate::util::{read_json_if_exists, sha256_file, write_json_pretty};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Version stamp for a lock that has never been written.
pub const INITIAL_LOCK_VERSION: &str = "0.0.0";
/// Extension of built pack artifacts.
pub const PACK_ARTIFACT_EXTENSION: &str = "gtpack";
/// Algorithm tag prefixed to every digest.
pub const DIGEST_ALGORITHM: &str = "sha256";

fn initial_lock_version() -> String {
    INITIAL_LOCK_VERSION.to_string()
}

/// Keep whatever another tool recorded, `null` included; only absence is `None`.
fn recorded<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// `packs.lock.json` contents; unknown top-level fields round-trip via `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockDocument {
    #[serde(default = "initial_lock_version")]
    pub version: String,
    #[serde(
        default,
        deserialize_with = "recorded",
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_at: Option<Value>,
    #[serde(
        default,
        deserialize_with = "recorded",
        skip_serializing_if = "Option::is_none"
    )]
    pub git_sha: Option<Value>,
    #[serde(default)]
    pub packs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for LockDocument {
    fn default() -> Self {
        Self {
            version: initial_lock_version(),
            generated_at: None,
            git_sha: None,
            packs: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl LockDocument {
    /// Prior entries keyed by `name`; entries without a string name are not indexed.
    fn entries_by_name(&self) -> HashMap<String, Map<String, Value>> {
        self.packs
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?;
                Some((name.to_string(), entry.clone()))
            })
            .collect()
    }
}

/// Result of a lock refresh.
#[derive(Debug)]
pub struct LockSummary {
    pub lock_path: PathBuf,
    pub entries: usize,
}

/// Load the lock, treating an absent file as a fresh document.
pub fn load_lock(lock_path: &Path) -> Result<LockDocument> {
    Ok(read_json_if_exists(lock_path)?.unwrap_or_default())
}

/// Built artifacts directly inside `dist_dir`, sorted by file name.
pub fn list_artifacts(dist_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    for entry in fs::read_dir(dist_dir).with_context(|| format!("read {}", dist_dir.display()))? {
        let entry = entry.with_context(|| format!("read {}", dist_dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension() == Some(OsStr::new(PACK_ARTIFACT_EXTENSION)) {
            artifacts.push(path);
        }
    }
    artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(artifacts)
}

/// Lock entry for one artifact, layered over its previous entry.
fn lock_entry(artifact: &Path, previous: Option<&Map<String, Value>>) -> Result<Map<String, Value>> {
    let name = artifact
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("artifact has no file name: {}", artifact.display()))?;
    let digest = sha256_file(artifact)?;
    let mut entry = previous.cloned().unwrap_or_default();
    entry.insert("name".to_string(), Value::String(name));
    entry.insert(
        "file".to_string(),
        Value::String(artifact.display().to_string()),
    );
    entry.insert(
        "digest".to_string(),
        Value::String(format!("{DIGEST_ALGORITHM}:{digest}")),
    );
    Ok(entry)
}

/// Refresh the lock from the artifacts currently in `dist_dir`.
///
/// Entries for artifacts no longer on disk are dropped.
pub fn update_lock(
    dist_dir: &Path,
    lock_path: &Path,
    provenance: &dyn Provenance,
) -> Result<LockSummary> {
    if !dist_dir.is_dir() {
        return Err(anyhow!("dist dir not found: {}", dist_dir.display()));
    }
    let mut lock = load_lock(lock_path)?;
    let previous = lock.entries_by_name();
    let artifacts = list_artifacts(dist_dir)?;

    let mut packs = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let name = artifact.file_stem().map(|stem| stem.to_string_lossy());
        let prior = name.as_deref().and_then(|name| previous.get(name));
        let entry = lock_entry(artifact, prior)?;
        tracing::debug!(
            artifact = %artifact.display(),
            digest = ?entry.get("digest"),
            preserved = prior.is_some(),
            "locked artifact"
        );
        packs.push(Value::Object(entry));
    }
    let dropped = previous
        .keys()
        .filter(|name| {
            !artifacts
                .iter()
                .any(|artifact| artifact.file_stem() == Some(OsStr::new(name.as_str())))
        })
        .count();
    if dropped > 0 {
        tracing::debug!(dropped, "pruned lock entries for missing artifacts");
    }

    lock.packs = packs;
    lock.generated_at = Some(Value::String(format_timestamp(provenance.now_utc())?));
    if let Some(revision) = provenance.short_revision() {
        lock.git_sha = Some(Value::String(revision));
    }

    write_json_pretty(lock_path, &lock)?;
    Ok(LockSummary {
        lock_path: lock_path.to_path_buf(),
        entries: lock.packs.len(),
    })
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
