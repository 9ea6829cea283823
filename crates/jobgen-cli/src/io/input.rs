use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use jobgen_core::catalog::DirectiveCatalog;
use jobgen_core::config::JobConfig;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("the file '{0}' was not found")]
    NotFound(PathBuf),
    #[error("invalid --now value {0:?}: expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    BadTimestamp(String),
}

fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(InputError::NotFound(path.to_path_buf()).into()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

pub fn read_config<P: AsRef<Path>>(path: P) -> Result<JobConfig> {
    let path = path.as_ref();
    let raw = read_text(path)?;
    let cfg = JobConfig::from_yaml_str(&raw).with_context(|| format!("loading {}", path.display()))?;
    tracing::debug!(path = %path.display(), machines = cfg.machine.len(), "loaded job config");
    Ok(cfg)
}

/// Load a catalog file, or the built-in catalog when no path is given.
pub fn read_catalog(path: Option<&str>) -> Result<DirectiveCatalog> {
    match path {
        Some(p) => {
            let raw = read_text(p)?;
            Ok(DirectiveCatalog::load(&raw).with_context(|| format!("loading {p}"))?)
        }
        None => Ok(DirectiveCatalog::builtin()?),
    }
}

pub fn parse_now(s: &str) -> Result<NaiveDateTime> {
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| InputError::BadTimestamp(s.to_string()).into())
}
