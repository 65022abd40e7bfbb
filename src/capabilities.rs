//! Capability descriptor bundling.
//!
//! Copies each component's `capabilities_v1.json` into the pack so consumers
//! can read capabilities without the component registry.
use crate::component::ComponentRegistry;
use crate::paths::{capability_cache_rel, PackPaths};
use crate::util::display_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Version tag recorded for every bundled capability descriptor.
pub const CAPABILITY_VERSION: &str = "v1";

/// Index entry written to `capabilities_cache` in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityCacheEntry {
    pub component: String,
    pub version: String,
    pub path: String,
}

/// Copy discoverable capability descriptors into the pack.
///
/// Components without a descriptor are skipped; an empty result means the
/// manifest should omit `capabilities_cache` entirely.
pub fn bundle_capabilities(
    components: &[String],
    registry: &ComponentRegistry,
    paths: &PackPaths,
) -> Result<Vec<CapabilityCacheEntry>> {
    let mut entries = Vec::new();
    for component in components {
        let Some(source) = registry.capabilities_path(component) else {
            continue;
        };
        let rel = capability_cache_rel(component);
        let dest = paths.root().join(&rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::copy(&source, &dest)
            .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
        tracing::debug!(
            component = %component,
            dest = %display_path(&dest, paths.root()),
            "bundled capability descriptor"
        );
        entries.push(CapabilityCacheEntry {
            component: component.clone(),
            version: CAPABILITY_VERSION.to_string(),
            path: rel,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::CAPABILITIES_FILE;
    use std::path::Path;

    fn write_capabilities(registry: &Path, id: &str, body: &str) {
        let dir = registry.join(id);
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join(CAPABILITIES_FILE), body).expect("write capabilities");
    }

    #[test]
    fn copies_descriptors_verbatim_and_indexes_them() {
        let registry_dir = tempfile::tempdir().expect("registry");
        let pack_dir = tempfile::tempdir().expect("pack");
        let body = "{\n  \"ops\": [\"send\"]\n}\n";
        write_capabilities(registry_dir.path(), "slack", body);

        let entries = bundle_capabilities(
            &["slack".to_string(), "no-caps".to_string()],
            &ComponentRegistry::new(registry_dir.path().to_path_buf()),
            &PackPaths::new(pack_dir.path().to_path_buf()),
        )
        .expect("bundle");

        assert_eq!(
            entries,
            vec![CapabilityCacheEntry {
                component: "slack".to_string(),
                version: "v1".to_string(),
                path: "components/slack-capabilities_v1.json".to_string(),
            }]
        );
        let copied = fs::read_to_string(pack_dir.path().join(&entries[0].path)).expect("copied");
        assert_eq!(copied, body);
    }

    #[test]
    fn nothing_discoverable_yields_empty_index() {
        let registry_dir = tempfile::tempdir().expect("registry");
        let pack_dir = tempfile::tempdir().expect("pack");
        let entries = bundle_capabilities(
            &["a".to_string()],
            &ComponentRegistry::new(registry_dir.path().to_path_buf()),
            &PackPaths::new(pack_dir.path().to_path_buf()),
        )
        .expect("bundle");
        assert!(entries.is_empty());
        assert!(!pack_dir.path().join("components").exists());
    }
}
