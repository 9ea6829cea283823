//! Script renderer.
//!
//! Walks the resolved directives, the parallel plan and the machine extras and
//! emits the submission script for one dialect. Steps run in a fixed order:
//!
//! 1. shebang from the resolved `shell` (default `/bin/bash`)
//! 2. one directive line per resolved directive the dialect has a token for
//! 3. derived `tasks_per_node` / `node_count` lines unless already resolved
//! 4. `ulimit` lines from `ulimit_<resource>` extras
//! 5. environment exports (`setenv` for csh-family shells)
//! 6. `module load` lines
//! 7. raw shell commands
//! 8. executable invocation, with an optional date-masked stdout redirect
//! 9. working-directory change and the dialect's parallel launch line
//!
//! Rendering either returns a complete document or an error; nothing partial.

use std::fmt;

use serde::Serialize;

use crate::catalog::{DirectiveCatalog, HASH};
use crate::clock::Clock;
use crate::datemask;
use crate::dialect::Dialect;
use crate::errors::{JobgenError, JobgenResult};
use crate::parallel::ParallelPlan;
use crate::resolve::ResolvedDirectives;

pub const DEFAULT_SHELL: &str = "/bin/bash";

const TASKS_PER_NODE: &str = "tasks_per_node";
const NODE_COUNT: &str = "node_count";
const ULIMIT_PREFIX: &str = "ulimit_";

/// Machine and job extras consumed by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderExtras {
    /// The `extraInfo` block: `exec`, `redirect_stdout`, `ulimit_*`.
    pub info: Vec<(String, String)>,
    /// Environment exports in declaration order.
    pub exports: Vec<(String, String)>,
    pub modules: Vec<String>,
    pub commands: Vec<String>,
}

impl RenderExtras {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `(resource, value)` for every non-empty `ulimit_<resource>` entry.
    pub fn ulimits(&self) -> impl Iterator<Item = (&str, &str)> {
        self.info.iter().filter_map(|(k, v)| {
            let res = k.strip_prefix(ULIMIT_PREFIX)?;
            if res.is_empty() || v.is_empty() {
                return None;
            }
            Some((res, v.as_str()))
        })
    }
}

/// Rendered script lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptDocument {
    lines: Vec<String>,
}

impl ScriptDocument {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn section(&mut self, header: &str) {
        self.push("");
        self.push(header);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Full script text with a trailing newline.
    pub fn text(&self) -> String {
        let mut s = self.lines.join("\n");
        s.push('\n');
        s
    }
}

impl fmt::Display for ScriptDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Render a submission script for `dialect`.
pub fn render(
    catalog: &DirectiveCatalog,
    dialect: &str,
    resolved: &ResolvedDirectives,
    plan: &ParallelPlan,
    extras: &RenderExtras,
    clock: &dyn Clock,
) -> JobgenResult<ScriptDocument> {
    let dialect = Dialect::parse(dialect)?;
    let key = dialect.as_str();
    let hash = catalog.syntax_for(HASH, key).ok_or_else(|| {
        JobgenError::UnsupportedScheduler(format!("{key} (catalog has no {HASH} prefix)"))
    })?;

    let mut doc = ScriptDocument::default();

    let shell = resolved
        .get("shell")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SHELL);
    doc.push(format!("#!{shell}"));

    for (name, value) in resolved.iter() {
        if value.contains(['\n', '\r']) {
            return Err(JobgenError::InvalidDirectiveValue {
                name: name.to_string(),
                expected: "a single line".to_string(),
                value: value.to_string(),
            });
        }
        if let Some(spec) = catalog.get(name) {
            if !spec.value_type.accepts(value) {
                return Err(JobgenError::InvalidDirectiveValue {
                    name: name.to_string(),
                    expected: spec.value_type.to_string(),
                    value: value.to_string(),
                });
            }
        }
        if let Some(token) = catalog.syntax_for(name, key) {
            doc.push(directive_line(hash, token, value));
        }
    }

    let derived = [(TASKS_PER_NODE, plan.tasks_per_node), (NODE_COUNT, plan.nodes)];
    for (name, value) in derived {
        if resolved.contains(name) {
            continue;
        }
        if let Some(token) = catalog.syntax_for(name, key) {
            doc.push(directive_line(hash, token, &value.to_string()));
        }
    }

    for spec in catalog.specs().filter(|s| s.required) {
        let is_derived = derived.iter().any(|(n, _)| *n == spec.name);
        if !resolved.contains(&spec.name) && !is_derived {
            return Err(JobgenError::MissingRequiredDirective(spec.name.clone()));
        }
    }

    let mut ulimits = extras.ulimits().peekable();
    if ulimits.peek().is_some() {
        doc.section("# Extra information");
        for (res, value) in ulimits {
            doc.push(format!("ulimit -{res} {value}"));
        }
    }

    if !extras.exports.is_empty() {
        doc.section("# Set environment variables");
        let csh = is_csh_family(shell);
        for (name, value) in &extras.exports {
            if csh {
                doc.push(format!("setenv {name} {value}"));
            } else {
                doc.push(format!("export {name}={value}"));
            }
        }
    }

    if !extras.modules.is_empty() {
        doc.section("# Load necessary modules");
        for m in &extras.modules {
            doc.push(format!("module load {m}"));
        }
    }

    if !extras.commands.is_empty() {
        doc.section("# Custom commands");
        for c in &extras.commands {
            doc.push(c.clone());
        }
    }

    let invocation = invocation(extras, clock)?;

    doc.section("# Change to the working directory and execute the process.");
    doc.push(format!("cd {}", dialect.workdir_var()));
    doc.push(format!(
        "{} -n {} -N {} {} {} ./{}",
        dialect.launcher(),
        plan.pes,
        plan.tasks_per_node,
        dialect.threads_flag(),
        plan.threads_per_task,
        invocation
    ));

    tracing::debug!(dialect = key, lines = doc.lines.len(), "rendered script");
    Ok(doc)
}

/// `<exec>` or `<exec> > <redirect>` with date masks expanded.
fn invocation(extras: &RenderExtras, clock: &dyn Clock) -> JobgenResult<String> {
    let exec = extras
        .get("exec")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(JobgenError::MissingExecutable)?;

    match extras.get("redirect_stdout").filter(|s| !s.is_empty()) {
        Some(template) => {
            let path = if datemask::has_placeholder(template) {
                datemask::expand(template, clock.now())
            } else {
                template.to_string()
            };
            Ok(format!("{exec} > {path}"))
        }
        None => Ok(exec.to_string()),
    }
}

/// Tokens ending in `=` take the value without a separating space.
fn directive_line(hash: &str, token: &str, value: &str) -> String {
    if token.ends_with('=') {
        format!("{hash} {token}{value}")
    } else {
        format!("{hash} {token} {value}")
    }
}

/// True for `csh`/`tcsh`, including `/usr/bin/env tcsh` style shebangs.
fn is_csh_family(shell: &str) -> bool {
    let mut words = shell.split_whitespace();
    let mut prog = words.next().map(basename).unwrap_or_default();
    if prog == "env" {
        prog = words.next().map(basename).unwrap_or_default();
    }
    matches!(prog, "csh" | "tcsh")
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
