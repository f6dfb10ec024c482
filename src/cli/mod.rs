//! CLI module for tracebench
//!
//! ## Commands
//!
//! - `list` - Show which built-in workloads are installed on the target
//! - `run <workload>` - Run a workload and collect telemetry into an output directory
//! - `collectors` - Show the collector tags accepted by `--collect`
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::version::TRACEBENCH_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    /// Rendered by miette's report handler, with the diagnostic code and help.
    fn from(err: HarnessError) -> Self {
        CliError::failure(format!("{:?}", miette::Report::new(err)))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run workloads on an instrumented device and collect telemetry
#[derive(Parser, Debug)]
#[command(name = "tracebench")]
#[command(version = TRACEBENCH_VERSION)]
#[command(about = "Run workloads on an instrumented device and collect telemetry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Serial of the device to use (default: the only attached device)
    #[arg(long, global = true, value_name = "SERIAL")]
    pub serial: Option<String>,

    /// adb executable
    #[arg(long, global = true, value_name = "PATH")]
    pub adb: Option<PathBuf>,

    /// Catapult checkout holding the systrace tool (default: $CATAPULT_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    pub catapult_home: Option<PathBuf>,

    /// Give up waiting for systrace after this many seconds (default: wait forever)
    #[arg(long, global = true, value_name = "SECS")]
    pub systrace_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the workloads installed on the target
    List,

    /// Run a workload and collect telemetry
    Run {
        /// Workload name (case-insensitive)
        #[arg(value_name = "WORKLOAD")]
        workload: String,
        /// Directory receiving the run artifacts
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,
        /// Collectors to enable, e.g. "ftrace,gfxinfo" or "systrace_30,energy"
        #[arg(short, long, value_name = "SPEC", default_value = "")]
        collect: String,
        /// How long the workload runs, in seconds
        #[arg(short, long, value_name = "SECS", default_value_t = 30)]
        duration: u64,
    },

    /// List the collector tags accepted by --collect
    Collectors,
}

impl Cli {
    /// Harness configuration from the environment, overridden by the global flags.
    pub fn harness_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::from_env();
        if let Some(serial) = &self.serial {
            config = config.with_serial(serial.clone());
        }
        if let Some(adb) = &self.adb {
            config = config.with_adb_path(adb.clone());
        }
        if let Some(home) = &self.catapult_home {
            config = config.with_catapult_home(home.clone());
        }
        if let Some(secs) = self.systrace_timeout {
            config = config.with_systrace_timeout(Duration::from_secs(secs));
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.harness_config();
    match cli.command {
        Command::List => commands::list_workloads(config),
        Command::Run {
            workload,
            out_dir,
            collect,
            duration,
        } => commands::run_workload(config, &workload, &out_dir, &collect, Duration::from_secs(duration)),
        Command::Collectors => commands::list_collectors(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["tracebench", "list", "--serial", "emulator-5554"]).unwrap();
        assert!(matches!(cli.command, Command::List));
        assert_eq!(cli.harness_config().serial.as_deref(), Some("emulator-5554"));
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from([
            "tracebench",
            "run",
            "YouTube",
            "-o",
            "/tmp/run1",
            "--collect",
            "ftrace,gfxinfo",
            "-d",
            "10",
        ])
        .unwrap();
        if let Command::Run {
            workload,
            out_dir,
            collect,
            duration,
        } = cli.command
        {
            assert_eq!(workload, "YouTube");
            assert_eq!(out_dir, PathBuf::from("/tmp/run1"));
            assert_eq!(collect, "ftrace,gfxinfo");
            assert_eq!(duration, 10);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_run_defaults() {
        let cli = Cli::try_parse_from(["tracebench", "run", "jankbench", "--out-dir", "out"]).unwrap();
        if let Command::Run { collect, duration, .. } = cli.command {
            assert_eq!(collect, "");
            assert_eq!(duration, 30);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_run_requires_out_dir() {
        assert!(Cli::try_parse_from(["tracebench", "run", "youtube"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tracebench",
            "collectors",
            "--systrace-timeout",
            "120",
            "--catapult-home",
            "/opt/catapult",
        ])
        .unwrap();
        let config = cli.harness_config();
        assert_eq!(config.systrace_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.catapult_home, Some(PathBuf::from("/opt/catapult")));
    }

    #[test]
    fn test_harness_error_keeps_code_and_help() {
        let err = CliError::from(HarnessError::ConfigConflict);
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("tracebench::config_conflict"), "{}", err.message);
        assert!(err.message.contains("ftrace and systrace cannot be used at the same time"));
        assert!(err.message.contains("select at most one trace backend per run"));
    }
}
