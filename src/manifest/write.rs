//! Manifest and secret-bridge serialization.
use crate::secrets::{bridge_requirements, SecretRequirement};
use crate::util::write_json_pretty;
use anyhow::Result;
use serde_json::{Map, Value};
use std::path::Path;

/// Write the assembled manifest as indented JSON.
pub fn write_manifest(path: &Path, manifest: &Map<String, Value>) -> Result<()> {
    write_json_pretty(path, manifest)
}

/// Write the bridge document consumed by secret provisioning.
pub fn write_secret_bridge(path: &Path, requirements: &[SecretRequirement]) -> Result<()> {
    write_json_pretty(path, &bridge_requirements(requirements))
}
