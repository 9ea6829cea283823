use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use serde::Serialize;

use jobgen_core::catalog::HASH;
use jobgen_core::dialect::Dialect;

use crate::io::input;
use crate::output;

#[derive(Debug, Serialize)]
pub struct DirectiveRow {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub required: bool,
    pub syntax: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct DirectivesOut {
    pub prefixes: BTreeMap<String, String>,
    pub directives: Vec<DirectiveRow>,
}

impl fmt::Display for DirectivesOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (dialect, prefix) in &self.prefixes {
            writeln!(f, "{dialect}: {prefix}")?;
        }
        for d in &self.directives {
            let req = if d.required { " (required)" } else { "" };
            let tokens: Vec<String> = d.syntax.iter().map(|(k, v)| format!("{k}={v:?}")).collect();
            writeln!(f, "{:<16} {:<7} {}{}", d.name, d.value_type, d.description, req)?;
            if !tokens.is_empty() {
                writeln!(f, "{:<16} {}", "", tokens.join(" "))?;
            }
        }
        Ok(())
    }
}

pub fn run(catalog_path: Option<&str>, scheduler: Option<&str>) -> Result<()> {
    let catalog = input::read_catalog(catalog_path)?;

    let dialects: Vec<String> = match scheduler {
        Some(s) => vec![Dialect::parse(s)?.as_str().to_string()],
        None => catalog.dialects().map(str::to_string).collect(),
    };

    let prefixes = dialects
        .iter()
        .filter_map(|d| catalog.syntax_for(HASH, d).map(|p| (d.clone(), p.to_string())))
        .collect();

    let directives = catalog
        .specs()
        .filter_map(|spec| {
            let syntax: BTreeMap<String, String> = dialects
                .iter()
                .filter_map(|d| catalog.syntax_for(&spec.name, d).map(|t| (d.clone(), t.to_string())))
                .collect();
            if scheduler.is_some() && syntax.is_empty() {
                return None;
            }
            Some(DirectiveRow {
                name: spec.name.clone(),
                description: spec.description.clone(),
                value_type: spec.value_type.to_string(),
                required: spec.required,
                syntax,
            })
        })
        .collect();

    output::print(&DirectivesOut { prefixes, directives })
}
