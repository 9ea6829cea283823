//! End-to-end script generation.
//!
//! Ties the pieces together for one request: pick the machine profile,
//! resolve directives across the three layers, compute the parallel plan and
//! render. Hosts (CLI, tests) call [`generate`] with an already-parsed
//! configuration and a catalog they loaded once.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::DirectiveCatalog;
use crate::clock::Clock;
use crate::config::{JobConfig, MachineProfile};
use crate::dialect::Dialect;
use crate::errors::{JobgenError, JobgenResult};
use crate::parallel::{compute_with_hint, ParallelPlan};
use crate::render::{render, ScriptDocument};
use crate::resolve::{resolve, OverrideLayer, ResolvedDirectives};

/// Per-invocation inputs (typically command-line values).
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub machine: String,
    pub scheduler: String,
    pub mpi_tasks: i64,
    pub threads_per_task: Option<i64>,
    /// Takes precedence over the machine profile's value.
    pub max_cores_per_node: Option<i64>,
    /// Highest-precedence directive layer.
    pub directive_overrides: OverrideLayer,
}

impl GenerateRequest {
    pub fn new(machine: impl Into<String>, scheduler: impl Into<String>, mpi_tasks: i64) -> Self {
        Self {
            machine: machine.into(),
            scheduler: scheduler.into(),
            mpi_tasks,
            ..Default::default()
        }
    }

    pub fn threads(mut self, threads: i64) -> Self {
        self.threads_per_task = Some(threads);
        self
    }

    pub fn max_cores(mut self, cores: i64) -> Self {
        self.max_cores_per_node = Some(cores);
        self
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.directive_overrides.insert(name.into(), Some(value.into()));
        self
    }
}

/// A generated script plus everything that went into it.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedScript {
    pub scheduler: String,
    pub filename: String,
    pub plan: ParallelPlan,
    pub resolved: ResolvedDirectives,
    pub document: ScriptDocument,
}

impl GeneratedScript {
    pub fn text(&self) -> String {
        self.document.text()
    }
}

/// Default output filename for a dialect.
pub fn default_filename(scheduler: &str) -> String {
    format!("{scheduler}_submission_script.sh")
}

pub fn generate(
    catalog: &DirectiveCatalog,
    config: &JobConfig,
    request: &GenerateRequest,
    clock: &dyn Clock,
) -> JobgenResult<GeneratedScript> {
    // Reject unknown dialects before any other work.
    let dialect = Dialect::parse(&request.scheduler)?;

    let empty = MachineProfile::default();
    let machine = match config.machine(&request.machine) {
        Some(m) => m,
        None => {
            tracing::warn!(machine = %request.machine, "machine not found in config; using an empty profile");
            &empty
        }
    };

    let resolved = resolve(
        catalog,
        &config.user_directives()?,
        &machine.directive_layer()?,
        &request.directive_overrides,
    );

    let max_cores = request
        .max_cores_per_node
        .or(machine.max_cores_per_node)
        .ok_or_else(|| {
            JobgenError::invalid_resource(
                "max_cores_per_node",
                format!("not given and not set for machine {}", request.machine),
            )
        })?;

    let hint = match (request.threads_per_task, resolved.get("tasks_per_node")) {
        (None, Some(v)) => Some(v.trim().parse::<i64>().map_err(|_| {
            JobgenError::InvalidDirectiveValue {
                name: "tasks_per_node".to_string(),
                expected: "int".to_string(),
                value: v.to_string(),
            }
        })?),
        _ => None,
    };

    let plan = compute_with_hint(max_cores, request.mpi_tasks, request.threads_per_task, hint)?;
    let extras = config.extras(machine)?;
    let document = render(catalog, dialect.as_str(), &resolved, &plan, &extras, clock)?;

    tracing::info!(
        scheduler = dialect.as_str(),
        machine = %request.machine,
        nodes = plan.nodes,
        pes = plan.pes,
        "generated submission script"
    );

    Ok(GeneratedScript {
        scheduler: dialect.as_str().to_string(),
        filename: default_filename(dialect.as_str()),
        plan,
        resolved,
        document,
    })
}

/// Parse `name=value` override pairs into an override layer.
///
/// An empty value (`name=`) is recorded as null and therefore ignored by the
/// resolver.
pub fn parse_overrides<I, S>(pairs: I) -> JobgenResult<OverrideLayer>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeMap::new();
    for p in pairs {
        let p = p.as_ref();
        let (k, v) = p.split_once('=').ok_or_else(|| {
            JobgenError::invalid_config(format!("override {p:?} must be name=value"))
        })?;
        let k = k.trim();
        if k.is_empty() {
            return Err(JobgenError::invalid_config(format!("override {p:?} has an empty name")));
        }
        let v = (!v.is_empty()).then(|| v.to_string());
        out.insert(k.to_string(), v);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::resolve::LayerSource;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    const CONFIG: &str = r#"
scheduler:
  directives:
    - shell: /bin/bash
      job_name: model
      queue: batch
  extraInfo:
    - exec: model.x
      redirect_stdout: out_%Y%m%d.log
      ulimit_s: unlimited
machine:
  XC50:
    max_cores_per_node: 64
    export:
      - OMP_STACKSIZE: 1G
    modules: [craype-haswell]
    directives:
      queue: pesq
      walltime: "02:00:00"
"#;

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    fn setup() -> (DirectiveCatalog, JobConfig) {
        (
            DirectiveCatalog::builtin().unwrap(),
            JobConfig::from_yaml_str(CONFIG).unwrap(),
        )
    }

    #[test]
    fn full_slurm_generation() {
        let (cat, cfg) = setup();
        let req = GenerateRequest::new("XC50", "SLURM", 128).threads(2);
        let out = generate(&cat, &cfg, &req, &clock()).unwrap();

        assert_eq!(out.filename, "SLURM_submission_script.sh");
        assert_eq!(out.plan.nodes, 4);
        assert_eq!(out.resolved.get("queue"), Some("batch"));
        assert_eq!(out.resolved.source("walltime"), Some(LayerSource::Machine));

        let expected = "\
#!/bin/bash
#SBATCH --job-name model
#SBATCH --partition batch
#SBATCH --time 02:00:00
#SBATCH --ntasks-per-node 32
#SBATCH --nodes 4

# Extra information
ulimit -s unlimited

# Set environment variables
export OMP_STACKSIZE=1G

# Load necessary modules
module load craype-haswell

# Change to the working directory and execute the process.
cd $SLURM_SUBMIT_DIR
srun -n 64 -N 32 -c 2 ./model.x > out_20240305.log
";
        assert_eq!(out.text(), expected);
    }

    #[test]
    fn overrides_take_precedence() {
        let (cat, cfg) = setup();
        let req = GenerateRequest::new("XC50", "PBS", 64)
            .threads(1)
            .set("queue", "debug")
            .set("not_a_directive", "x");
        let out = generate(&cat, &cfg, &req, &clock()).unwrap();
        assert_eq!(out.resolved.get("queue"), Some("debug"));
        assert!(out.text().contains("#PBS -q debug\n"));
        assert!(!out.text().contains("not_a_directive"));
    }

    #[test]
    fn cli_max_cores_beats_machine() {
        let (cat, cfg) = setup();
        let req = GenerateRequest::new("XC50", "SLURM", 128).threads(2).max_cores(32);
        let out = generate(&cat, &cfg, &req, &clock()).unwrap();
        assert_eq!(out.plan.tasks_per_node, 16);
        assert_eq!(out.plan.nodes, 8);
    }

    #[test]
    fn unknown_machine_needs_max_cores() {
        let (cat, cfg) = setup();
        let req = GenerateRequest::new("EGEON", "SLURM", 8);
        assert_matches!(
            generate(&cat, &cfg, &req, &clock()),
            Err(JobgenError::InvalidResourceSpec { field, .. }) if field == "max_cores_per_node"
        );

        let req = GenerateRequest::new("EGEON", "SLURM", 8).max_cores(4);
        let out = generate(&cat, &cfg, &req, &clock()).unwrap();
        assert!(!out.text().contains("module load"));
    }

    #[test]
    fn resolved_tasks_per_node_is_thread_hint() {
        let (cat, cfg) = setup();
        let req = GenerateRequest::new("XC50", "SLURM", 128).set("tasks_per_node", "16");
        let out = generate(&cat, &cfg, &req, &clock()).unwrap();
        assert_eq!(out.plan.threads_per_task, 4);
        assert!(out.text().contains("#SBATCH --ntasks-per-node 16\n"));
        assert!(out.text().contains("srun -n 32 -N 16 -c 4 "));
    }

    #[test]
    fn unsupported_scheduler_fails_first() {
        let (cat, cfg) = setup();
        let req = GenerateRequest::new("nowhere", "slurm", 0);
        assert_matches!(
            generate(&cat, &cfg, &req, &clock()),
            Err(JobgenError::UnsupportedScheduler(_))
        );
    }

    #[test]
    fn parse_overrides_pairs() {
        let o = parse_overrides(["queue=debug", "walltime=00:10:00", "account="]).unwrap();
        assert_eq!(o.get("queue"), Some(&Some("debug".to_string())));
        assert_eq!(o.get("walltime"), Some(&Some("00:10:00".to_string())));
        assert_eq!(o.get("account"), Some(&None));
        assert_matches!(parse_overrides(["nope"]), Err(JobgenError::InvalidConfig(_)));
        assert_matches!(parse_overrides(["=x"]), Err(JobgenError::InvalidConfig(_)));
    }
}
