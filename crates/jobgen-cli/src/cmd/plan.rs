use std::fmt;

use anyhow::Result;
use serde::Serialize;

use jobgen_core::parallel::{compute_with_hint, ParallelPlan};

use crate::output;

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PlanOut(pub ParallelPlan);

impl fmt::Display for PlanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.0;
        writeln!(f, "max_cores_per_node  {}", p.max_cores_per_node)?;
        writeln!(f, "mpi_tasks           {}", p.mpi_tasks)?;
        writeln!(f, "threads_per_task    {}", p.threads_per_task)?;
        writeln!(f, "tasks_per_node      {}", p.tasks_per_node)?;
        writeln!(f, "pes                 {}", p.pes)?;
        writeln!(f, "nodes               {}", p.nodes)
    }
}

pub fn run(
    max_cores_per_node: i64,
    mpi_tasks: i64,
    threads_per_task: Option<i64>,
    tasks_per_node_hint: Option<i64>,
) -> Result<()> {
    let plan = compute_with_hint(max_cores_per_node, mpi_tasks, threads_per_task, tasks_per_node_hint)?;
    output::print(&PlanOut(plan))
}
