//! Directive catalog.
//!
//! The catalog declares every directive jobgen knows about: its description,
//! value type, whether it is required, and the syntax token each scheduler
//! dialect uses for it. It is loaded once and is read-only afterwards, so one
//! value can be shared by any number of generation requests.
//!
//! Lookup contract: `syntax_for(name, dialect)` returning `None` means the
//! directive is silently omitted for that dialect. This is how
//! dialect-specific directives are suppressed for the other scheduler.
//!
//! The reserved name `hash` maps each dialect to its directive comment prefix
//! (`#PBS`, `#SBATCH`). It is not a directive and never appears in `names()`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{JobgenError, JobgenResult};

/// Reserved catalog entry holding the per-dialect comment prefix.
pub const HASH: &str = "hash";

const BUILTIN_CATALOG: &str = include_str!("../data/directives.yaml");

/// Declared type of a directive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
}

impl ValueType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" | "str" => Some(Self::String),
            "int" | "integer" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }

    /// Returns true if `value` is a valid textual value of this type.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::String => true,
            Self::Int => value.trim().parse::<i64>().is_ok(),
            Self::Float => value.trim().parse::<f64>().is_ok(),
            Self::Bool => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "false"
            ),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static declaration of one directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectiveSpec {
    pub name: String,
    pub description: String,
    pub value_type: ValueType,
    pub required: bool,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    hash: BTreeMap<String, String>,
    #[serde(default)]
    directives: Vec<RawDirective>,
}

#[derive(Debug, Deserialize)]
struct RawDirective {
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    value_type: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    syntax: BTreeMap<String, String>,
}

/// The loaded, immutable directive table.
#[derive(Debug, Clone)]
pub struct DirectiveCatalog {
    specs: Vec<DirectiveSpec>,
    index: BTreeMap<String, usize>,
    syntax: BTreeMap<String, BTreeMap<String, String>>,
    hash: BTreeMap<String, String>,
}

impl DirectiveCatalog {
    /// Parse a catalog from YAML text.
    pub fn load(source: &str) -> JobgenResult<Self> {
        if source.trim().is_empty() {
            return Err(JobgenError::catalog("catalog source is empty"));
        }

        let raw: RawCatalog = serde_yaml::from_str(source)
            .map_err(|e| JobgenError::catalog(format!("failed to parse yaml: {e}")))?;

        Self::from_raw(raw)
    }

    /// The catalog embedded in this crate.
    pub fn builtin() -> JobgenResult<Self> {
        Self::load(BUILTIN_CATALOG)
    }

    fn from_raw(raw: RawCatalog) -> JobgenResult<Self> {
        if raw.directives.is_empty() {
            return Err(JobgenError::catalog("catalog declares no directives"));
        }

        for (dialect, prefix) in &raw.hash {
            if prefix.trim().is_empty() {
                return Err(JobgenError::catalog(format!(
                    "empty comment prefix for dialect {dialect}"
                )));
            }
        }

        let mut specs = Vec::with_capacity(raw.directives.len());
        let mut index = BTreeMap::new();
        let mut syntax = BTreeMap::new();

        for (i, d) in raw.directives.into_iter().enumerate() {
            let name = d
                .name
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| JobgenError::catalog(format!("directive #{i} has no name")))?;

            if name == HASH {
                return Err(JobgenError::catalog(format!(
                    "directive #{i} uses the reserved name {HASH}"
                )));
            }

            let ty = d
                .value_type
                .ok_or_else(|| JobgenError::catalog(format!("directive {name} has no type")))?;
            let value_type = ValueType::parse(&ty).ok_or_else(|| {
                JobgenError::catalog(format!("directive {name} has unknown type {ty:?}"))
            })?;

            for (dialect, token) in &d.syntax {
                if token.trim().is_empty() {
                    return Err(JobgenError::catalog(format!(
                        "directive {name} has an empty token for {dialect}"
                    )));
                }
                if !raw.hash.contains_key(dialect) {
                    return Err(JobgenError::catalog(format!(
                        "directive {name} references dialect {dialect} which has no {HASH} prefix"
                    )));
                }
            }

            if index.insert(name.clone(), specs.len()).is_some() {
                return Err(JobgenError::catalog(format!("duplicate directive: {name}")));
            }

            syntax.insert(name.clone(), d.syntax);
            specs.push(DirectiveSpec {
                name,
                description: d.description,
                value_type,
                required: d.required,
            });
        }

        tracing::debug!(directives = specs.len(), dialects = raw.hash.len(), "loaded directive catalog");

        Ok(Self {
            specs,
            index,
            syntax,
            hash: raw.hash,
        })
    }

    /// Directive names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn specs(&self) -> impl Iterator<Item = &DirectiveSpec> {
        self.specs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Syntax token for `name` under `dialect`. `None` means omit.
    ///
    /// `syntax_for(HASH, dialect)` returns the comment prefix.
    pub fn syntax_for(&self, name: &str, dialect: &str) -> Option<&str> {
        if name == HASH {
            return self.hash.get(dialect).map(|s| s.as_str());
        }
        self.syntax
            .get(name)
            .and_then(|m| m.get(dialect))
            .map(|s| s.as_str())
    }

    /// Dialects that have a comment prefix.
    pub fn dialects(&self) -> impl Iterator<Item = &str> {
        self.hash.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
