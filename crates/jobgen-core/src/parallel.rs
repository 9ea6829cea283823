//! Parallel decomposition calculator.
//!
//! Turns (max cores per node, total MPI tasks, threads per task) into the
//! numbers a launcher needs:
//!
//! - `tasks_per_node = max_cores_per_node / threads_per_task` (floor)
//! - `pes = mpi_tasks / threads_per_task` (floor)
//! - `nodes = ceil(mpi_tasks / tasks_per_node)`
//!
//! When the thread count is omitted it is derived in two explicit steps:
//! a caller-supplied tasks-per-node hint gives
//! `threads = max_cores_per_node / hint`; without a hint the thread count is 1.

use serde::Serialize;

use crate::errors::{JobgenError, JobgenResult};

/// Derived decomposition for one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParallelPlan {
    pub max_cores_per_node: u32,
    pub mpi_tasks: u32,
    pub threads_per_task: u32,
    pub tasks_per_node: u32,
    pub pes: u32,
    pub nodes: u32,
}

/// Compute a plan. `threads_per_task = None` means one thread per task.
pub fn compute(
    max_cores_per_node: i64,
    mpi_tasks: i64,
    threads_per_task: Option<i64>,
) -> JobgenResult<ParallelPlan> {
    compute_with_hint(max_cores_per_node, mpi_tasks, threads_per_task, None)
}

/// Compute a plan, deriving omitted threads from a tasks-per-node hint.
///
/// An explicit `threads_per_task` always wins over the hint.
pub fn compute_with_hint(
    max_cores_per_node: i64,
    mpi_tasks: i64,
    threads_per_task: Option<i64>,
    tasks_per_node_hint: Option<i64>,
) -> JobgenResult<ParallelPlan> {
    let max_cores = positive("max_cores_per_node", max_cores_per_node)?;
    let tasks = positive("mpi_tasks", mpi_tasks)?;

    let threads = match (threads_per_task, tasks_per_node_hint) {
        (Some(t), _) => positive("threads_per_task", t)?,
        (None, Some(hint)) => {
            let hint = positive("tasks_per_node", hint)?;
            let derived = max_cores / hint;
            if derived == 0 {
                return Err(JobgenError::invalid_resource(
                    "tasks_per_node",
                    format!("hint {hint} exceeds max_cores_per_node {max_cores}"),
                ));
            }
            derived
        }
        (None, None) => 1,
    };

    if threads > max_cores {
        return Err(JobgenError::invalid_resource(
            "threads_per_task",
            format!("{threads} exceeds max_cores_per_node {max_cores}"),
        ));
    }

    let tasks_per_node = max_cores / threads;
    let pes = tasks / threads;
    let nodes = tasks.div_ceil(tasks_per_node);

    tracing::debug!(
        max_cores,
        tasks,
        threads,
        tasks_per_node,
        pes,
        nodes,
        "computed parallel plan"
    );

    Ok(ParallelPlan {
        max_cores_per_node: max_cores,
        mpi_tasks: tasks,
        threads_per_task: threads,
        tasks_per_node,
        pes,
        nodes,
    })
}

fn positive(field: &str, v: i64) -> JobgenResult<u32> {
    if v <= 0 {
        return Err(JobgenError::invalid_resource(
            field,
            format!("must be greater than zero, got {v}"),
        ));
    }
    u32::try_from(v)
        .map_err(|_| JobgenError::invalid_resource(field, format!("{v} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn reference_example() {
        let p = compute(64, 128, Some(2)).unwrap();
        assert_eq!(p.tasks_per_node, 32);
        assert_eq!(p.pes, 64);
        assert_eq!(p.nodes, 4);
        assert_eq!(p.threads_per_task, 2);
    }

    #[test]
    fn nodes_round_up() {
        let p = compute(40, 100, Some(1)).unwrap();
        assert_eq!(p.tasks_per_node, 40);
        assert_eq!(p.nodes, 3);
    }

    #[test]
    fn omitted_threads_default_to_one() {
        let p = compute(32, 64, None).unwrap();
        assert_eq!(p.threads_per_task, 1);
        assert_eq!(p.tasks_per_node, 32);
        assert_eq!(p.nodes, 2);
    }

    #[test]
    fn omitted_threads_use_hint() {
        let p = compute_with_hint(64, 128, None, Some(16)).unwrap();
        assert_eq!(p.threads_per_task, 4);
        assert_eq!(p.tasks_per_node, 16);
        assert_eq!(p.pes, 32);
        assert_eq!(p.nodes, 8);
    }

    #[test]
    fn explicit_threads_win_over_hint() {
        let p = compute_with_hint(64, 128, Some(2), Some(16)).unwrap();
        assert_eq!(p.threads_per_task, 2);
    }

    #[test]
    fn hint_larger_than_node_fails() {
        assert_matches!(
            compute_with_hint(8, 16, None, Some(9)),
            Err(JobgenError::InvalidResourceSpec { field, .. }) if field == "tasks_per_node"
        );
    }

    #[test]
    fn non_positive_inputs_fail() {
        assert_matches!(
            compute(0, 10, None),
            Err(JobgenError::InvalidResourceSpec { field, .. }) if field == "max_cores_per_node"
        );
        assert_matches!(
            compute(10, -1, None),
            Err(JobgenError::InvalidResourceSpec { field, .. }) if field == "mpi_tasks"
        );
        assert_matches!(
            compute(10, 10, Some(0)),
            Err(JobgenError::InvalidResourceSpec { field, .. }) if field == "threads_per_task"
        );
    }

    #[test]
    fn threads_above_cores_fail() {
        assert_matches!(
            compute(4, 8, Some(5)),
            Err(JobgenError::InvalidResourceSpec { field, .. }) if field == "threads_per_task"
        );
    }

    proptest! {
        #[test]
        fn decomposition_matches_formula(c in 1i64..512, t in 1i64..100_000, k_seed in 1i64..512) {
            let k = (k_seed % c) + 1;
            let p = compute(c, t, Some(k)).unwrap();
            let tpn = c / k;
            prop_assert_eq!(p.tasks_per_node as i64, tpn);
            prop_assert_eq!(p.pes as i64, t / k);
            prop_assert_eq!(p.nodes as i64, (t + tpn - 1) / tpn);
        }
    }
}
