use std::fmt;

use anyhow::Result;
use serde::Serialize;

use jobgen_core::clock::{Clock, FixedClock, SystemClock};
use jobgen_core::generate::{generate, parse_overrides, GenerateRequest};
use jobgen_core::parallel::ParallelPlan;

use crate::io::{export, input};
use crate::output;

pub struct Args {
    pub machine: String,
    pub scheduler: String,
    pub max_cores_per_node: Option<i64>,
    pub mpi_tasks: i64,
    pub threads_per_mpi_task: Option<i64>,
    pub config: String,
    pub catalog: Option<String>,
    pub overrides: Vec<String>,
    pub out: Option<String>,
    pub stdout: bool,
    pub now: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub machine: String,
    pub scheduler: String,
    pub path: String,
    pub sha256: String,
    pub plan: ParallelPlan,
}

impl fmt::Display for GenerateOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "script:    {}", self.path)?;
        writeln!(f, "scheduler: {} ({})", self.scheduler, self.machine)?;
        writeln!(
            f,
            "plan:      nodes={} tasks_per_node={} pes={} threads={}",
            self.plan.nodes, self.plan.tasks_per_node, self.plan.pes, self.plan.threads_per_task
        )?;
        writeln!(f, "sha256:    {}", self.sha256)
    }
}

pub fn run(args: Args) -> Result<()> {
    let catalog = input::read_catalog(args.catalog.as_deref())?;
    let config = input::read_config(&args.config)?;

    let request = GenerateRequest {
        machine: args.machine.clone(),
        scheduler: args.scheduler.clone(),
        mpi_tasks: args.mpi_tasks,
        threads_per_task: args.threads_per_mpi_task,
        max_cores_per_node: args.max_cores_per_node,
        directive_overrides: parse_overrides(&args.overrides)?,
    };

    let clock: Box<dyn Clock> = match args.now.as_deref() {
        Some(s) => Box::new(FixedClock(input::parse_now(s)?)),
        None => Box::new(SystemClock),
    };

    let script = generate(&catalog, &config, &request, clock.as_ref())?;
    let text = script.text();

    if args.stdout {
        print!("{text}");
        return Ok(());
    }

    let path = args.out.unwrap_or_else(|| script.filename.clone());
    export::write_script(&path, &text)?;
    output::status("Wrote", &path);

    output::print(&GenerateOut {
        machine: args.machine,
        scheduler: script.scheduler,
        path,
        sha256: export::sha256_hex(text.as_bytes()),
        plan: script.plan,
    })
}
