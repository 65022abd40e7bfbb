//! Three-way merge of the prior manifest with the pack descriptor.
//!
//! The prior on-disk manifest supplies a default for every field. A descriptor
//! value replaces that default when it is present and non-empty:
//!
//! | field                               | descriptor source                        |
//! |-------------------------------------|------------------------------------------|
//! | `pack_id`, `publisher`, `kind`, `version` | matching scalar                    |
//! | `components`, `component_sources`   | `components` (partitioned)               |
//! | `flows`                             | `flows`                                  |
//! | `extensions`                        | `extensions`, then provider normalization|
//! | `config_schema.provider_config`     | first `kind: config` schema              |
//! | `config_schema.runtime_config`      | `runtime_config.schema_version`          |
//!
//! `secret_requirements`, `capabilities_cache` and the version override are
//! owned by the pipeline driver.
use crate::component::ComponentRegistry;
use crate::descriptor::{ComponentRef, PackDescriptor};
use crate::extensions::{normalize_provider_extension, Normalization};
use crate::paths::default_artifact_path;
use anyhow::{Context, Result};
use serde_json::{Map, Value};

/// Component lists derived from the descriptor's references.
#[derive(Debug, Default, PartialEq)]
pub struct ComponentPartition {
    /// Ids that are local and have a descriptor in the registry.
    pub local: Vec<String>,
    /// Every reference, with `wasm` defaulted.
    pub sources: Vec<ComponentRef>,
}

/// Split references into the legacy `components` list and `component_sources`.
pub fn partition_components(
    components: &[ComponentRef],
    registry: &ComponentRegistry,
) -> ComponentPartition {
    let mut partition = ComponentPartition::default();
    for component in components {
        if !component.is_remote() && registry.descriptor_exists(&component.id) {
            partition.local.push(component.id.clone());
        }
        let mut source = component.clone();
        if source.wasm.as_deref().is_none_or(str::is_empty) {
            source.wasm = Some(default_artifact_path(&component.id));
        }
        partition.sources.push(source);
    }
    partition
}

/// Merge `descriptor` over `existing`, returning the new manifest body.
pub fn merge_manifest(
    existing: Map<String, Value>,
    descriptor: &PackDescriptor,
    registry: &ComponentRegistry,
) -> Result<Map<String, Value>> {
    let mut manifest = existing;

    for (key, value) in [
        ("pack_id", &descriptor.pack_id),
        ("publisher", &descriptor.publisher),
        ("kind", &descriptor.kind),
        ("version", &descriptor.version),
    ] {
        if let Some(value) = value.as_deref().filter(|text| !text.is_empty()) {
            manifest.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    let components = descriptor.component_refs();
    if !components.is_empty() {
        let partition = partition_components(components, registry);
        manifest.insert(
            "components".to_string(),
            Value::Array(partition.local.into_iter().map(Value::String).collect()),
        );
        let sources =
            serde_json::to_value(&partition.sources).context("serialize component_sources")?;
        manifest.insert("component_sources".to_string(), sources);
    }

    if let Some(flows) = descriptor.flows.as_ref().filter(|flows| !flows.is_empty()) {
        manifest.insert("flows".to_string(), Value::Array(flows.clone()));
    }

    if let Some(extensions) = descriptor
        .extensions
        .as_ref()
        .filter(|extensions| !extensions.is_empty())
    {
        manifest.insert("extensions".to_string(), Value::Object(extensions.clone()));
    }
    if let Some(Value::Object(extensions)) = manifest.get_mut("extensions") {
        if let Normalization::Migrated { from, ignored } = normalize_provider_extension(extensions)
        {
            tracing::debug!(from = %from, "migrated legacy provider extension key");
            if !ignored.is_empty() {
                tracing::warn!(
                    used = %from,
                    ignored = ?ignored,
                    "multiple legacy provider extension keys; only the first was migrated"
                );
            }
        }
    }

    merge_config_schema(&mut manifest, descriptor);
    Ok(manifest)
}

fn merge_config_schema(manifest: &mut Map<String, Value>, descriptor: &PackDescriptor) {
    let provider_config = descriptor.provider_config_schema();
    let runtime_version = descriptor.runtime_schema_version();
    if provider_config.is_none() && runtime_version.is_none() {
        return;
    }
    let mut config_schema = match manifest.remove("config_schema") {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };
    if let Some(provider_config) = provider_config {
        config_schema.insert(
            "provider_config".to_string(),
            Value::Object(provider_config),
        );
    }
    if let Some(version) = runtime_version {
        let mut runtime = Map::new();
        runtime.insert("schema_version".to_string(), version.clone());
        config_schema.insert("runtime_config".to_string(), Value::Object(runtime));
    }
    manifest.insert("config_schema".to_string(), Value::Object(config_schema));
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
