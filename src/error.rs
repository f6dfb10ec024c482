//! Error types for the harness library.
//!
//! Every fallible operation in the library returns [`Result`]. Collector faults are wrapped once at the collaborator
//! boundary and then propagate untouched: nothing in the harness retries.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;
use tracebench_core::CollectorId;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while resolving workloads or driving collectors
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("Workload [{name}] not available on target")]
    #[diagnostic(
        code(tracebench::not_available),
        help("run `tracebench list` to see the workloads whose packages are installed")
    )]
    NotAvailable { name: String },

    #[error("ftrace and systrace cannot be used at the same time")]
    #[diagnostic(code(tracebench::config_conflict), help("select at most one trace backend per run"))]
    ConfigConflict,

    #[error("workload [{workload}] does not implement `run`")]
    #[diagnostic(code(tracebench::not_implemented))]
    NotImplemented { workload: String },

    #[error("workload [{name}] is already registered")]
    #[diagnostic(code(tracebench::duplicate_workload))]
    DuplicateWorkload { name: String },

    #[error("cannot {operation} tracing while {state}")]
    #[diagnostic(code(tracebench::invalid_state))]
    InvalidState { operation: &'static str, state: &'static str },

    #[error("device error: {0}")]
    #[diagnostic(code(tracebench::device))]
    Device(String),

    #[error("{collector} collector failed: {message}")]
    #[diagnostic(code(tracebench::collector))]
    Collector { collector: CollectorId, message: String },

    #[error("timed out after {0:?} waiting for the system trace tool")]
    #[diagnostic(
        code(tracebench::timeout),
        help("use `systrace_<secs>` to bound the capture, or raise --systrace-timeout")
    )]
    Timeout(Duration),

    #[error("I/O error on {}: {source}", .path.display())]
    #[diagnostic(code(tracebench::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    #[diagnostic(code(tracebench::serialization))]
    Serialization(#[from] serde_json::Error),
}

impl HarnessError {
    /// Wrap an I/O failure together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn collector(collector: CollectorId, message: impl Into<String>) -> Self {
        HarnessError::Collector {
            collector,
            message: message.into(),
        }
    }

    /// Check if this error is a caller mistake rather than a device or collector fault
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            HarnessError::NotAvailable { .. }
                | HarnessError::ConfigConflict
                | HarnessError::DuplicateWorkload { .. }
                | HarnessError::InvalidState { .. }
        )
    }
}
