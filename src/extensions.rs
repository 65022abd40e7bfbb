//! Provider extension key normalization.
//!
//! Older packs published the provider block under `greentic.ext.provider*`
//! keys. Consumers only understand the canonical id, so legacy keys are folded
//! onto it and the block's `kind` is pinned to that id.
use serde_json::{Map, Value};

/// Canonical provider extension id, also written to the block's `kind`.
pub const PROVIDER_EXTENSION_ID: &str = "greentic.provider-extension.v1";
/// Prefix shared by every legacy spelling of the provider extension key.
pub const LEGACY_PROVIDER_PREFIX: &str = "greentic.ext.provider";

/// What the normalizer did to an extension block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    /// Canonical key already present; only `kind` was pinned.
    Canonical,
    /// A legacy key was moved under the canonical id.
    Migrated {
        from: String,
        /// Further legacy keys left in place.
        ignored: Vec<String>,
    },
    Untouched,
}

/// Fold legacy provider keys onto [`PROVIDER_EXTENSION_ID`].
///
/// With several legacy keys present the lexically first one wins.
pub fn normalize_provider_extension(extensions: &mut Map<String, Value>) -> Normalization {
    if let Some(block) = extensions.get_mut(PROVIDER_EXTENSION_ID) {
        pin_kind(block);
        return Normalization::Canonical;
    }
    let mut legacy: Vec<String> = extensions
        .keys()
        .filter(|key| key.starts_with(LEGACY_PROVIDER_PREFIX))
        .cloned()
        .collect();
    legacy.sort();
    let Some(from) = legacy.first().cloned() else {
        return Normalization::Untouched;
    };
    let Some(mut block) = extensions.remove(&from) else {
        return Normalization::Untouched;
    };
    pin_kind(&mut block);
    extensions.insert(PROVIDER_EXTENSION_ID.to_string(), block);
    Normalization::Migrated {
        from,
        ignored: legacy.split_off(1),
    }
}

fn pin_kind(block: &mut Value) {
    if let Some(fields) = block.as_object_mut() {
        fields.insert(
            "kind".to_string(),
            Value::String(PROVIDER_EXTENSION_ID.to_string()),
        );
    }
}
