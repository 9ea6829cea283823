use anyhow::Result;

use crate::args::{Cli, Command};

mod directives;
mod generate;
mod plan;

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            machine,
            scheduler,
            max_cores_per_node,
            mpi_tasks,
            threads_per_mpi_task,
            config,
            catalog,
            overrides,
            out,
            stdout,
            now,
        } => generate::run(generate::Args {
            machine,
            scheduler,
            max_cores_per_node,
            mpi_tasks,
            threads_per_mpi_task,
            config,
            catalog,
            overrides,
            out,
            stdout,
            now,
        }),
        Command::Plan {
            max_cores_per_node,
            mpi_tasks,
            threads_per_mpi_task,
            tasks_per_node_hint,
        } => plan::run(max_cores_per_node, mpi_tasks, threads_per_mpi_task, tasks_per_node_hint),
        Command::Directives { catalog, scheduler } => {
            directives::run(catalog.as_deref(), scheduler.as_deref())
        }
    }
}
