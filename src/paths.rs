//! Typed paths into a pack directory and its component registry.
//!
//! Centralizing path construction keeps the manifest pipeline and the CLI
//! defaults in agreement about where each file lives.
use std::path::{Path, PathBuf};

/// File name of the author-facing pack descriptor.
pub const PACK_DESCRIPTOR_FILE: &str = "pack.yaml";
/// File name of the derived, consumer-facing pack manifest.
pub const PACK_MANIFEST_FILE: &str = "pack.manifest.json";
/// Directory (relative to the pack) holding component artifacts and caches.
pub const PACK_COMPONENTS_DIR: &str = "components";

/// Convenience wrapper for locating common pack artifacts.
#[derive(Debug, Clone)]
pub struct PackPaths {
    root: PathBuf,
}

impl PackPaths {
    /// Create a new path helper rooted at the pack directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the pack root used for path derivation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `pack.yaml` path.
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(PACK_DESCRIPTOR_FILE)
    }

    /// Return the `pack.manifest.json` path.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(PACK_MANIFEST_FILE)
    }

    /// Default component registry: two levels above the pack, then `components/`.
    pub fn default_registry(&self) -> PathBuf {
        self.root.join("..").join("..").join("components")
    }
}

/// Relative artifact path synthesized for a component without an explicit one.
pub fn default_artifact_path(component_id: &str) -> String {
    format!("{PACK_COMPONENTS_DIR}/{component_id}.wasm")
}

/// Relative path of a bundled capability descriptor inside the pack.
pub fn capability_cache_rel(component_id: &str) -> String {
    format!("{PACK_COMPONENTS_DIR}/{component_id}-capabilities_v1.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_pack_dir() {
        let paths = PackPaths::new(PathBuf::from("packs/messaging-dummy"));
        assert_eq!(
            paths.manifest_path(),
            PathBuf::from("packs/messaging-dummy/pack.manifest.json")
        );
        assert_eq!(
            paths.descriptor_path(),
            PathBuf::from("packs/messaging-dummy/pack.yaml")
        );
        assert_eq!(
            paths.default_registry(),
            PathBuf::from("packs/messaging-dummy/../../components")
        );
    }

    #[test]
    fn derived_component_paths() {
        assert_eq!(default_artifact_path("slack"), "components/slack.wasm");
        assert_eq!(
            capability_cache_rel("slack"),
            "components/slack-capabilities_v1.json"
        );
    }
}
