//! Error types shared by configuration, simulation, and I/O layers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.min_charge_percent"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A malformed `HH-HH` hour interval.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowParseError {
    #[error("expected `HH-HH`, got \"{0}\"")]
    MissingSeparator(String),
    #[error("\"{0}\" is not an hour")]
    NotAnInteger(String),
    #[error("hour {0} is out of range 0..=23")]
    OutOfRange(u32),
}

/// Failures raised while stepping the battery through records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("record ts={current} is not after previous record ts={previous}")]
    OrderingViolation { previous: i64, current: i64 },
}

/// Failures while loading meter records from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid record at {}:{line}: {source}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid date \"{0}\" (expected YYYYMMDD)")]
    InvalidDate(String),
    #[error("date {0} does not exist in the configured timezone")]
    NonexistentLocalTime(String),
}

/// Failures while writing simulated records.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write failed: {0}")]
    Write(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("timestamp {0} cannot be placed on a calendar day")]
    InvalidTimestamp(i64),
}
