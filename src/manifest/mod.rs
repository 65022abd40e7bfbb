//! Pack manifest aggregation.
//!
//! Loads the prior manifest and `pack.yaml`, reconciles secret requirements
//! across the component registry, merges everything into a fresh manifest and
//! writes it (plus the optional secret bridge). All inputs are read and merged
//! before anything is written, so a fatal input error leaves no partial output.
mod merge;
mod write;

pub use merge::merge_manifest;
pub use write::{write_manifest, write_secret_bridge};

use crate::capabilities::bundle_capabilities;
use crate::cli::ManifestArgs;
use crate::component::ComponentRegistry;
use crate::descriptor::{ComponentRef, PackDescriptor};
use crate::paths::PackPaths;
use crate::secrets::{collect_requirements, SecretRequirement};
use crate::util::read_json_if_exists;
use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Resolved inputs for one aggregation run.
#[derive(Debug, Clone)]
pub struct ManifestOptions {
    pub pack_dir: PathBuf,
    pub components_dir: PathBuf,
    pub version: Option<String>,
    pub output: PathBuf,
    pub secrets_out: Option<PathBuf>,
    pub include_capabilities_cache: bool,
}

impl ManifestOptions {
    /// Apply path defaults relative to the pack directory.
    pub fn from_args(args: &ManifestArgs) -> Self {
        let paths = PackPaths::new(args.pack_dir.clone());
        Self {
            pack_dir: args.pack_dir.clone(),
            components_dir: args
                .components_dir
                .clone()
                .unwrap_or_else(|| paths.default_registry()),
            version: args.version.clone(),
            output: args
                .output
                .clone()
                .unwrap_or_else(|| paths.manifest_path()),
            secrets_out: args.secrets_out.clone(),
            include_capabilities_cache: args.include_capabilities_cache,
        }
    }
}

/// Merged manifest plus the reconciled requirements it embeds.
#[derive(Debug)]
pub struct AssembledManifest {
    pub manifest: Map<String, Value>,
    pub secret_requirements: Vec<SecretRequirement>,
}

/// What a run wrote, for the CLI summary line.
#[derive(Debug)]
pub struct ManifestSummary {
    pub manifest_path: PathBuf,
    pub secret_requirements: usize,
    pub capabilities_cached: usize,
    pub bridge_path: Option<PathBuf>,
}

/// Where secret requirements are gathered from.
struct RequirementSources {
    components: Vec<ComponentRef>,
    inline: Vec<SecretRequirement>,
}

/// Aggregate and write the manifest for one pack.
pub fn run(options: &ManifestOptions) -> Result<ManifestSummary> {
    if !options.pack_dir.is_dir() {
        return Err(anyhow!(
            "pack directory not found: {}",
            options.pack_dir.display()
        ));
    }
    let paths = PackPaths::new(options.pack_dir.clone());
    let registry = ComponentRegistry::new(options.components_dir.clone());
    tracing::debug!(
        pack = %paths.root().display(),
        registry = %registry.root().display(),
        "aggregating pack manifest"
    );

    let AssembledManifest {
        mut manifest,
        secret_requirements,
    } = assemble(&paths, &registry)?;

    let mut capabilities_cached = 0;
    manifest.remove("capabilities_cache");
    if options.include_capabilities_cache {
        let components = local_component_ids(&manifest);
        let entries = bundle_capabilities(&components, &registry, &paths)?;
        capabilities_cached = entries.len();
        if !entries.is_empty() {
            let index = serde_json::to_value(&entries).context("serialize capabilities_cache")?;
            manifest.insert("capabilities_cache".to_string(), index);
        }
    }

    if let Some(version) = options.version.as_deref() {
        manifest.insert("version".to_string(), Value::String(version.to_string()));
    }

    write_manifest(&options.output, &manifest)?;
    if let Some(bridge_path) = options.secrets_out.as_deref() {
        write_secret_bridge(bridge_path, &secret_requirements)?;
    }

    Ok(ManifestSummary {
        manifest_path: options.output.clone(),
        secret_requirements: secret_requirements.len(),
        capabilities_cached,
        bridge_path: options.secrets_out.clone(),
    })
}

/// Build the manifest body and requirement set without writing anything.
pub fn assemble(paths: &PackPaths, registry: &ComponentRegistry) -> Result<AssembledManifest> {
    let manifest_path = paths.manifest_path();
    let prior = match read_json_if_exists::<Value>(&manifest_path)? {
        None => None,
        Some(Value::Object(prior)) => Some(prior),
        Some(_) => {
            return Err(anyhow!(
                "invalid manifest at {}: expected a JSON object",
                manifest_path.display()
            ))
        }
    };

    let descriptor_path = paths.descriptor_path();
    let (descriptor, sources) = if descriptor_path.is_file() {
        let descriptor = PackDescriptor::load(&descriptor_path)?;
        let sources = RequirementSources {
            components: descriptor.component_refs().to_vec(),
            inline: descriptor.inline_requirements().to_vec(),
        };
        (descriptor, sources)
    } else {
        let prior = prior.as_ref().ok_or_else(|| {
            anyhow!(
                "missing pack descriptor at {} and no manifest at {}",
                descriptor_path.display(),
                manifest_path.display()
            )
        })?;
        tracing::debug!("no pack.yaml; reading components from the prior manifest");
        (PackDescriptor::default(), legacy_sources(prior)?)
    };

    let secret_requirements =
        collect_requirements(&sources.components, &sources.inline, registry)?;
    let mut manifest = merge_manifest(prior.unwrap_or_default(), &descriptor, registry)?;
    manifest.insert(
        "secret_requirements".to_string(),
        serde_json::to_value(&secret_requirements).context("serialize secret_requirements")?,
    );
    Ok(AssembledManifest {
        manifest,
        secret_requirements,
    })
}

/// Manifest-only packs list component ids and static requirements directly.
fn legacy_sources(prior: &Map<String, Value>) -> Result<RequirementSources> {
    let components = local_component_ids(prior)
        .into_iter()
        .map(ComponentRef::local)
        .collect();
    let inline = match prior.get("secret_requirements") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())
            .context("parse secret_requirements in prior manifest")?,
    };
    Ok(RequirementSources { components, inline })
}

fn local_component_ids(manifest: &Map<String, Value>) -> Vec<String> {
    manifest
        .get("components")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
