//! Author-facing pack descriptor (`pack.yaml`).
//!
//! Only the fields the manifest pipeline reads are modeled; everything else in
//! the descriptor is ignored.
use crate::secrets::SecretRequirement;
use crate::util::{read_yaml, scalar_string};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Schema declaration kind that feeds `config_schema.provider_config`.
pub const CONFIG_SCHEMA_KIND: &str = "config";

/// Parsed `pack.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackDescriptor {
    #[serde(default, deserialize_with = "scalar_string")]
    pub pack_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,
    pub components: Option<Vec<ComponentRef>>,
    pub schemas: Option<Vec<Value>>,
    pub flows: Option<Vec<Value>>,
    pub extensions: Option<Map<String, Value>>,
    pub runtime_config: Option<RuntimeConfig>,
    pub secret_requirements: Option<Vec<SecretRequirement>>,
}

/// `runtime_config` block; only its schema version is surfaced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeConfig {
    pub schema_version: Option<Value>,
}

/// A component referenced from the pack descriptor.
///
/// Accepts either a bare id string or a mapping with `id`, `oci`, `wasm`, and
/// any further keys (carried through to `component_sources`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ComponentRefRepr")]
pub struct ComponentRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oci: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ComponentRefRepr {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        oci: Option<String>,
        #[serde(default)]
        wasm: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<ComponentRefRepr> for ComponentRef {
    fn from(repr: ComponentRefRepr) -> Self {
        match repr {
            ComponentRefRepr::Id(id) => ComponentRef::local(id),
            ComponentRefRepr::Full {
                id,
                oci,
                wasm,
                extra,
            } => ComponentRef {
                id,
                oci,
                wasm,
                extra,
            },
        }
    }
}

impl ComponentRef {
    /// A plain local reference with no OCI coordinate or explicit artifact.
    pub fn local(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            oci: None,
            wasm: None,
            extra: Map::new(),
        }
    }

    /// True when the component is pulled from an OCI registry.
    pub fn is_remote(&self) -> bool {
        self.oci
            .as_deref()
            .is_some_and(|reference| !reference.trim().is_empty())
    }
}

impl PackDescriptor {
    /// Load and parse a descriptor from disk.
    pub fn load(path: &Path) -> Result<Self> {
        read_yaml(path)
    }

    /// Components listed by the descriptor, empty when the key is absent.
    pub fn component_refs(&self) -> &[ComponentRef] {
        self.components.as_deref().unwrap_or_default()
    }

    /// Inline secret requirements, empty when the key is absent.
    pub fn inline_requirements(&self) -> &[SecretRequirement] {
        self.secret_requirements.as_deref().unwrap_or_default()
    }

    /// First `kind: config` schema entry with its `kind` key stripped.
    pub fn provider_config_schema(&self) -> Option<Map<String, Value>> {
        self.schemas
            .iter()
            .flatten()
            .filter_map(Value::as_object)
            .find(|schema| schema.get("kind").and_then(Value::as_str) == Some(CONFIG_SCHEMA_KIND))
            .map(|schema| {
                let mut schema = schema.clone();
                schema.remove("kind");
                schema
            })
    }

    /// Runtime-config schema version, if the descriptor declares one.
    pub fn runtime_schema_version(&self) -> Option<&Value> {
        self.runtime_config
            .as_ref()
            .and_then(|config| config.schema_version.as_ref())
            .filter(|version| !version.is_null())
    }
}
