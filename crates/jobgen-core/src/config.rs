//! Configuration document model.
//!
//! This is the typed shape of the user's job configuration. The core crate
//! never reads files or environment variables: the host (CLI) loads the text
//! and hands it to [`JobConfig::from_yaml_str`], or builds the struct itself.
//!
//! ```yaml
//! scheduler:
//!   directives:
//!     - shell: /bin/bash
//!       job_name: model
//!   extraInfo:
//!     - exec: model.x
//!       redirect_stdout: out_%Y%m%d.log
//!       ulimit_s: unlimited
//! machine:
//!   XC50:
//!     max_cores_per_node: 40
//!     export:
//!       - OMP_STACKSIZE: 1G
//!     modules: [craype-haswell]
//!     commands: ["date"]
//!     directives:
//!       queue: pesq
//! ```
//!
//! `directives`, `extraInfo` and `export` accept either a mapping or a list of
//! mappings. For `directives` and `extraInfo` lists are merged in order with
//! later keys winning; `export` keeps every pair, repeated names included.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::errors::{JobgenError, JobgenResult};
use crate::render::RenderExtras;
use crate::resolve::DirectiveLayer;

/// Root of the configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub machine: BTreeMap<String, MachineProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerSection {
    #[serde(default)]
    pub directives: Option<Block>,
    #[serde(default, rename = "extraInfo", alias = "extra_info")]
    pub extra_info: Option<Block>,
}

/// Per-machine profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachineProfile {
    #[serde(default)]
    pub max_cores_per_node: Option<i64>,
    #[serde(default, alias = "exports")]
    pub export: Option<Block>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    /// Machine default directives (lowest precedence layer).
    #[serde(default)]
    pub directives: Option<Block>,
}

/// A mapping, or a list of mappings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Block {
    Map(Mapping),
    List(Vec<Mapping>),
}

impl Block {
    /// Key/value pairs in document order; a repeated key keeps its last value.
    /// Null values are skipped.
    pub fn pairs(&self, section: &str) -> JobgenResult<Vec<(String, String)>> {
        let mut out: Vec<(String, String)> = Vec::new();
        for (key, value) in self.entries(section)? {
            match out.iter_mut().find(|(k2, _)| *k2 == key) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }
        Ok(out)
    }

    /// Every key/value pair in document order, repeats included.
    /// Null values are skipped.
    pub fn entries(&self, section: &str) -> JobgenResult<Vec<(String, String)>> {
        let maps: Vec<&Mapping> = match self {
            Block::Map(m) => vec![m],
            Block::List(v) => v.iter().collect(),
        };

        let mut out = Vec::new();
        for m in maps {
            for (k, v) in m {
                let key = scalar_to_string(section, k)?.ok_or_else(|| {
                    JobgenError::invalid_config(format!("{section}: null key"))
                })?;
                if let Some(value) = scalar_to_string(&format!("{section}.{key}"), v)? {
                    out.push((key, value));
                }
            }
        }
        Ok(out)
    }
}

fn block_pairs(block: &Option<Block>, section: &str) -> JobgenResult<Vec<(String, String)>> {
    match block {
        Some(b) => b.pairs(section),
        None => Ok(Vec::new()),
    }
}

/// Normalize a scalar YAML value to text. `Ok(None)` for null.
pub fn scalar_to_string(field: &str, v: &Value) -> JobgenResult<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Tagged(t) => scalar_to_string(field, &t.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(JobgenError::invalid_config(format!(
            "{field}: expected a scalar value"
        ))),
    }
}

impl JobConfig {
    pub fn from_yaml_str(text: &str) -> JobgenResult<Self> {
        if text.trim().is_empty() {
            return Err(JobgenError::invalid_config("configuration document is empty"));
        }
        serde_yaml::from_str(text)
            .map_err(|e| JobgenError::invalid_config(format!("failed to parse yaml: {e}")))
    }

    pub fn machine(&self, name: &str) -> Option<&MachineProfile> {
        self.machine.get(name)
    }

    /// The `scheduler.directives` block as a resolver layer.
    pub fn user_directives(&self) -> JobgenResult<DirectiveLayer> {
        Ok(block_pairs(&self.scheduler.directives, "scheduler.directives")?
            .into_iter()
            .collect())
    }

    /// The `scheduler.extraInfo` block in document order.
    pub fn extra_info(&self) -> JobgenResult<Vec<(String, String)>> {
        block_pairs(&self.scheduler.extra_info, "scheduler.extraInfo")
    }

    /// Renderer extras for the given machine profile.
    pub fn extras(&self, machine: &MachineProfile) -> JobgenResult<RenderExtras> {
        Ok(RenderExtras {
            info: self.extra_info()?,
            exports: machine.exports()?,
            modules: machine.modules.clone(),
            commands: machine.commands.clone(),
        })
    }
}

impl MachineProfile {
    pub fn directive_layer(&self) -> JobgenResult<DirectiveLayer> {
        Ok(block_pairs(&self.directives, "machine.directives")?
            .into_iter()
            .collect())
    }

    /// Export pairs in declaration order. A name may repeat (e.g. successive
    /// `PATH` appends); every pair is kept.
    pub fn exports(&self) -> JobgenResult<Vec<(String, String)>> {
        match &self.export {
            Some(b) => b.entries("machine.export"),
            None => Ok(Vec::new()),
        }
    }
}
