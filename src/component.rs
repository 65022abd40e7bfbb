//! Component registry lookups.
//!
//! Each component publishes `component.manifest.json` (and optionally
//! `capabilities_v1.json`) under `<registry>/<id>/`. Missing descriptors are
//! soft misses; remote and namespaced components are expected to be absent.
use crate::descriptor::ComponentRef;
use crate::secrets::SecretRequirement;
use crate::util::read_json;
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Descriptor file name inside a component directory.
pub const COMPONENT_DESCRIPTOR_FILE: &str = "component.manifest.json";
/// Capability descriptor file name inside a component directory.
pub const CAPABILITIES_FILE: &str = "capabilities_v1.json";

/// Shared directory that serves every template-engine alias.
const TEMPLATES_COMPONENT: &str = "templates";
const TEMPLATE_ALIASES: [&str; 4] = [
    "templates",
    "component-templates",
    "greentic.templates",
    "ai.greentic.component-templates",
];
/// Separator used by composite ids such as `provider__ingress`.
const NAMESPACE_SEPARATOR: &str = "__";

/// The subset of `component.manifest.json` the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentDescriptor {
    #[serde(default)]
    pub secret_requirements: Option<Vec<SecretRequirement>>,
}

impl ComponentDescriptor {
    pub fn into_requirements(self) -> Vec<SecretRequirement> {
        self.secret_requirements.unwrap_or_default()
    }
}

/// Outcome of resolving one component reference.
#[derive(Debug)]
pub enum Lookup {
    Found(ComponentDescriptor),
    /// Descriptor absent; already reported as a warning.
    Missing,
    /// Remote or namespaced component that is never resolved locally.
    Skipped,
}

/// Root directory holding one subdirectory per component id.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    root: PathBuf,
}

impl ComponentRegistry {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn primary_descriptor_path(&self, id: &str) -> PathBuf {
        self.root.join(id).join(COMPONENT_DESCRIPTOR_FILE)
    }

    /// Existing descriptor path for `id`, applying the template alias fallback.
    pub fn descriptor_path(&self, id: &str) -> Option<PathBuf> {
        let primary = self.primary_descriptor_path(id);
        if primary.is_file() {
            return Some(primary);
        }
        if TEMPLATE_ALIASES.contains(&id) {
            let shared = self.primary_descriptor_path(TEMPLATES_COMPONENT);
            if shared.is_file() {
                return Some(shared);
            }
        }
        None
    }

    pub fn descriptor_exists(&self, id: &str) -> bool {
        self.descriptor_path(id).is_some()
    }

    /// Existing capability descriptor for `id`.
    pub fn capabilities_path(&self, id: &str) -> Option<PathBuf> {
        let path = self.root.join(id).join(CAPABILITIES_FILE);
        path.is_file().then_some(path)
    }

    /// Resolve a component reference to its descriptor.
    ///
    /// A descriptor that exists but does not parse is a hard error.
    pub fn lookup(&self, component: &ComponentRef) -> Result<Lookup> {
        if component.is_remote() {
            tracing::debug!(component = %component.id, "skipping remote component");
            return Ok(Lookup::Skipped);
        }
        let Some(path) = self.descriptor_path(&component.id) else {
            if component.id.contains(NAMESPACE_SEPARATOR) {
                tracing::debug!(component = %component.id, "no descriptor for namespaced component");
                return Ok(Lookup::Skipped);
            }
            tracing::warn!(
                component = %component.id,
                path = %self.primary_descriptor_path(&component.id).display(),
                "component descriptor not found; no secret requirements collected"
            );
            return Ok(Lookup::Missing);
        };
        let descriptor: ComponentDescriptor = read_json(&path)?;
        Ok(Lookup::Found(descriptor))
    }
}
