//! Directive resolution.
//!
//! Directive values come from three layers, applied left to right into one
//! mapping (lowest to highest precedence):
//!
//! 1. machine profile defaults
//! 2. user directives from the configuration document
//! 3. explicit per-invocation overrides (only non-null values)
//!
//! Only names declared in the catalog participate. Unknown keys are ignored.
//! Required directives are checked by the renderer, not here, because some of
//! them (`tasks_per_node`, `node_count`) can still be derived from the plan.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::catalog::DirectiveCatalog;

/// Name → value mapping supplied by one layer.
pub type DirectiveLayer = BTreeMap<String, String>;

/// Override layer. `None` values are treated as absent.
pub type OverrideLayer = BTreeMap<String, Option<String>>;

/// Which layer supplied a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSource {
    Machine,
    User,
    Override,
}

impl LayerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::User => "user",
            Self::Override => "override",
        }
    }
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    pub value: String,
    pub source: LayerSource,
}

/// Effective directive values, ordered by catalog declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedDirectives {
    entries: Vec<(String, ResolvedValue)>,
}

impl ResolvedDirectives {
    /// Names in catalog declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.value.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|v| v.value.as_str())
    }

    pub fn source(&self, name: &str) -> Option<LayerSource> {
        self.entry(name).map(|v| v.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&ResolvedValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Resolve directive values across the three layers.
pub fn resolve(
    catalog: &DirectiveCatalog,
    user: &DirectiveLayer,
    machine: &DirectiveLayer,
    overrides: &OverrideLayer,
) -> ResolvedDirectives {
    let overrides: DirectiveLayer = overrides
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| (k.clone(), v.clone())))
        .collect();

    let layers = [
        (LayerSource::Machine, machine),
        (LayerSource::User, user),
        (LayerSource::Override, &overrides),
    ];

    let mut merged: BTreeMap<&str, ResolvedValue> = BTreeMap::new();
    for (source, layer) in layers {
        for (name, value) in layer.iter() {
            if !catalog.contains(name) {
                tracing::debug!(%source, directive = %name, "ignoring key not declared in catalog");
                continue;
            }
            if let Some(prev) = merged.get(name.as_str()) {
                tracing::debug!(
                    directive = %name,
                    from = %prev.source,
                    to = %source,
                    "directive value overridden"
                );
            }
            merged.insert(
                name.as_str(),
                ResolvedValue {
                    value: value.clone(),
                    source,
                },
            );
        }
    }

    let entries = catalog
        .names()
        .filter_map(|n| merged.remove(n).map(|v| (n.to_string(), v)))
        .collect();

    ResolvedDirectives { entries }
}
