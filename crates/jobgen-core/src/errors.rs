//! Error types for jobgen-core.
//!
//! Every failure is terminal for the current generation request: nothing is
//! recovered locally and no partial script is ever returned. Each variant
//! carries the field or directive name needed to diagnose it.

use thiserror::Error;

/// Result alias used across the crate.
pub type JobgenResult<T> = Result<T, JobgenError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobgenError {
    /// Non-positive or inconsistent resource counts.
    #[error("invalid resource spec: {field}: {reason}")]
    InvalidResourceSpec { field: String, reason: String },

    /// The directive catalog source is malformed or incomplete.
    #[error("catalog load error: {0}")]
    CatalogLoad(String),

    /// A catalog-required directive has no value after resolution.
    #[error("missing required directive: {0}")]
    MissingRequiredDirective(String),

    /// No executable configured in the extra info block.
    #[error("executable not configured (scheduler.extraInfo.exec)")]
    MissingExecutable,

    /// Dialect identifier other than `PBS` or `SLURM`.
    #[error("unsupported scheduler: {0}")]
    UnsupportedScheduler(String),

    /// A resolved value does not match the directive's declared type.
    #[error("invalid value for directive {name}: expected {expected}, got {value:?}")]
    InvalidDirectiveValue {
        name: String,
        expected: String,
        value: String,
    },

    /// The configuration document has an unexpected shape.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl JobgenError {
    pub fn invalid_resource(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceSpec {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::CatalogLoad(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
