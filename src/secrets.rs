//! Secret requirement reconciliation and secret-bridge shaping.
//!
//! Requirements arrive from every component descriptor (in pack order) and
//! then from the pack descriptor itself. They collapse onto a `(name, scope)`
//! identity where the first non-empty `description` and `example` win and later
//! declarations can only fill fields that are still empty.
use crate::component::{ComponentRegistry, Lookup};
use crate::descriptor::ComponentRef;
use crate::util::scalar_string;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scope applied when a declaration omits one.
pub const DEFAULT_SCOPE: &str = "tenant";

const ENV_PLACEHOLDER: &str = "<env>";
const TENANT_PLACEHOLDER: &str = "<tenant>";
const TEAM_PLACEHOLDER: &str = "<team>";

/// A declared need for a named, scoped secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequirement {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub scope: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub example: Option<String>,
}

#[cfg(test)]
impl SecretRequirement {
    pub fn new(name: &str, scope: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            scope: Some(scope.to_string()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.example = Some(example.to_string());
        self
    }
}

impl SecretRequirement {
    /// Dedup identity, or `None` for nameless declarations.
    fn identity(&self) -> Option<(String, String)> {
        let name = non_empty(self.name.as_deref())?;
        let scope = non_empty(self.scope.as_deref()).unwrap_or(DEFAULT_SCOPE);
        Some((name.to_string(), scope.to_string()))
    }

    /// Scope with the default applied.
    pub fn effective_scope(&self) -> &str {
        non_empty(self.scope.as_deref()).unwrap_or(DEFAULT_SCOPE)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

/// Insertion-ordered set of requirements keyed by `(name, scope)`.
#[derive(Debug, Default)]
struct RequirementSet {
    entries: Vec<SecretRequirement>,
    index: HashMap<(String, String), usize>,
}

impl RequirementSet {
    /// Merge one declaration; nameless declarations are dropped.
    fn insert(&mut self, declared: &SecretRequirement) {
        let Some(identity) = declared.identity() else {
            return;
        };
        let description = non_empty(declared.description.as_deref());
        let example = non_empty(declared.example.as_deref());
        if let Some(&slot) = self.index.get(&identity) {
            let existing = &mut self.entries[slot];
            if existing.description.is_none() {
                existing.description = description.map(str::to_string);
            }
            if existing.example.is_none() {
                existing.example = example.map(str::to_string);
            }
            return;
        }
        let (name, scope) = identity.clone();
        self.index.insert(identity, self.entries.len());
        self.entries.push(SecretRequirement {
            name: Some(name),
            scope: Some(scope),
            description: description.map(str::to_string),
            example: example.map(str::to_string),
        });
    }

    fn into_vec(self) -> Vec<SecretRequirement> {
        self.entries
    }
}

/// Reconcile declarations into a deduplicated, first-seen ordered list.
pub fn reconcile<'a, I>(declarations: I) -> Vec<SecretRequirement>
where
    I: IntoIterator<Item = &'a SecretRequirement>,
{
    let mut set = RequirementSet::default();
    for declared in declarations {
        set.insert(declared);
    }
    set.into_vec()
}

/// Gather requirements from each local component, then from inline declarations.
pub fn collect_requirements(
    components: &[ComponentRef],
    inline: &[SecretRequirement],
    registry: &ComponentRegistry,
) -> Result<Vec<SecretRequirement>> {
    let mut declared = Vec::new();
    for component in components {
        if let Lookup::Found(descriptor) = registry.lookup(component)? {
            declared.extend(descriptor.into_requirements());
        }
    }
    declared.extend(inline.iter().cloned());
    let requirements = reconcile(&declared);
    tracing::debug!(
        declared = declared.len(),
        reconciled = requirements.len(),
        "secret requirements reconciled"
    );
    Ok(requirements)
}

/// Placeholder scope object consumed by the secret provisioning side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeScope {
    pub env: String,
    pub tenant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl BridgeScope {
    fn for_scope(scope: &str) -> Self {
        // env/environment and tenant share the same shape.
        let team = if scope.eq_ignore_ascii_case("team") {
            Some(TEAM_PLACEHOLDER.to_string())
        } else {
            None
        };
        Self {
            env: ENV_PLACEHOLDER.to_string(),
            tenant: TENANT_PLACEHOLDER.to_string(),
            team,
        }
    }
}

/// A requirement reshaped for the secret bridge document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgedRequirement {
    pub key: String,
    pub scope: BridgeScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Rename `name` to `key` and expand scope strings into placeholder objects.
pub fn bridge_requirements(requirements: &[SecretRequirement]) -> Vec<BridgedRequirement> {
    requirements
        .iter()
        .map(|requirement| BridgedRequirement {
            key: requirement.name.clone().unwrap_or_default(),
            scope: BridgeScope::for_scope(requirement.effective_scope()),
            description: requirement.description.clone(),
            example: requirement.example.clone(),
        })
        .collect()
}
