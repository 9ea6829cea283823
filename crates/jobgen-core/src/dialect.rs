//! Scheduler dialects.

use std::fmt;
use std::str::FromStr;

use crate::errors::{JobgenError, JobgenResult};

/// Supported batch scheduler dialects.
///
/// Identifiers are case-sensitive: only `PBS` and `SLURM` are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Pbs,
    Slurm,
}

impl Dialect {
    pub fn parse(s: &str) -> JobgenResult<Self> {
        match s {
            "PBS" => Ok(Self::Pbs),
            "SLURM" => Ok(Self::Slurm),
            other => Err(JobgenError::UnsupportedScheduler(other.to_string())),
        }
    }

    /// Identifier used as the key in the directive catalog.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pbs => "PBS",
            Self::Slurm => "SLURM",
        }
    }

    /// Submission directory variable set by the scheduler.
    pub fn workdir_var(&self) -> &'static str {
        match self {
            Self::Pbs => "$PBS_O_WORKDIR",
            Self::Slurm => "$SLURM_SUBMIT_DIR",
        }
    }

    /// Parallel launcher command.
    pub fn launcher(&self) -> &'static str {
        match self {
            Self::Pbs => "aprun",
            Self::Slurm => "srun",
        }
    }

    /// Launcher flag carrying the thread (cpus-per-task) count.
    pub fn threads_flag(&self) -> &'static str {
        match self {
            Self::Pbs => "-d",
            Self::Slurm => "-c",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = JobgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(Dialect::parse("PBS").unwrap(), Dialect::Pbs);
        assert_eq!(Dialect::parse("SLURM").unwrap(), Dialect::Slurm);
        assert_matches!(
            Dialect::parse("slurm"),
            Err(JobgenError::UnsupportedScheduler(s)) if s == "slurm"
        );
        assert_matches!(Dialect::parse("LSF"), Err(JobgenError::UnsupportedScheduler(_)));
    }
}
