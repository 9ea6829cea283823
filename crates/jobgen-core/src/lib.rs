//! jobgen-core
//!
//! Directive resolution and script assembly for HPC batch submission scripts:
//! - Directive catalog with per-dialect syntax tokens
//! - Parallel decomposition (nodes, tasks per node, processing elements)
//! - Three-layer directive resolution (machine < user < override)
//! - PBS/SLURM script rendering with date-masked redirect paths
//!
//! The crate performs no filesystem or network I/O and never reads the
//! environment. Wall-clock time is injected through [`clock::Clock`].

pub mod catalog;
pub mod clock;
pub mod config;
pub mod datemask;
pub mod dialect;
pub mod errors;
pub mod generate;
pub mod parallel;
pub mod render;
pub mod resolve;

pub use crate::errors::{JobgenError, JobgenResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::catalog::{DirectiveCatalog, DirectiveSpec, ValueType};
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::{JobConfig, MachineProfile};
    pub use crate::dialect::Dialect;
    pub use crate::generate::{generate, GenerateRequest, GeneratedScript};
    pub use crate::parallel::{compute, compute_with_hint, ParallelPlan};
    pub use crate::render::{render, RenderExtras, ScriptDocument};
    pub use crate::resolve::{resolve, DirectiveLayer, LayerSource, OverrideLayer, ResolvedDirectives};
    pub use crate::{JobgenError, JobgenResult};
}
