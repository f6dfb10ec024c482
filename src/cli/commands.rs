//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.
//!
//! Output is built by pure `render_*` helpers so it can be snapshot-tested without a device.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use tracebench_core::CollectSpec;
use tracebench_core::collectors::COLLECTORS;

use crate::config::HarnessConfig;
use crate::env::TestEnv;
use crate::lifecycle::RunResults;
use crate::registry::{AvailabilitySet, WorkloadRegistry};
use crate::workload::{RunParams, WorkloadDescriptor};

use super::{CliResult, ExitCode};

// ============================================================================
// Commands
// ============================================================================

/// `tracebench list`
pub fn list_workloads(config: HarnessConfig) -> CliResult<ExitCode> {
    let env = TestEnv::adb(config);
    let mut registry = WorkloadRegistry::with_builtin_workloads();
    let available = registry.check_available(&env)?.clone();
    print!("{}", render_workloads(registry.registered(), &available));
    Ok(ExitCode::SUCCESS)
}

/// `tracebench run <workload>`
pub fn run_workload(
    config: HarnessConfig,
    name: &str,
    out_dir: &Path,
    collect: &str,
    duration: Duration,
) -> CliResult<ExitCode> {
    let collect = CollectSpec::parse(collect);
    let env = TestEnv::adb(config);
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    let mut instance = registry.get_instance(&env, name)?;
    instance.run(out_dir, &collect, &RunParams::new(duration))?;

    print!("{}", render_run_summary(instance.descriptor(), &collect, instance.results()));
    Ok(ExitCode::SUCCESS)
}

/// `tracebench collectors`
pub fn list_collectors() -> CliResult<ExitCode> {
    print!("{}", render_collectors());
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Rendering
// ============================================================================

/// One line per registered workload, marking whether its package is installed.
pub fn render_workloads<'a>(
    registered: impl Iterator<Item = &'a WorkloadDescriptor>,
    available: &AvailabilitySet,
) -> String {
    let mut out = String::new();
    for descriptor in registered {
        let status = if available.contains(&descriptor.name) {
            "installed"
        } else {
            "missing"
        };
        let _ = writeln!(out, "{:<12}{:<30}{}", descriptor.name, descriptor.package, status);
    }
    let _ = writeln!(out, "{} workload(s) available", available.len());
    out
}

/// The collector vocabulary accepted by `--collect`.
pub fn render_collectors() -> String {
    let mut out = String::new();
    for info in COLLECTORS {
        let artifact = info.artifact.unwrap_or("-");
        let _ = writeln!(out, "{:<16}{:<28}{}", info.tag, artifact, info.description);
    }
    let _ = writeln!(out, "ftrace and systrace are mutually exclusive");
    out
}

/// What a finished run produced.
pub fn render_run_summary(descriptor: &WorkloadDescriptor, collect: &CollectSpec, results: &RunResults) -> String {
    let mut out = String::new();
    let collect = collect.to_string();
    let _ = writeln!(
        out,
        "{} ({}) finished, collected [{}]",
        descriptor.name,
        descriptor.package,
        if collect.is_empty() { "nothing" } else { collect.as_str() }
    );

    if let Some(trace) = &results.trace_file {
        let _ = writeln!(out, "  trace:          {}", trace.display());
    }
    if let Some(report) = &results.nrg_report {
        let channels: Vec<String> = report.channels.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let _ = writeln!(out, "  energy:         {} J ({})", report.total(), channels.join(", "));
    }
    if let Some(report) = &results.gfxinfo {
        let frames = report.total_frames().map_or("?".to_string(), |n| n.to_string());
        let janky = report.janky_frames().map_or("?".to_string(), |n| n.to_string());
        let _ = writeln!(
            out,
            "  gfxinfo:        {frames} frames, {janky} janky ({})",
            report.path.display()
        );
    }
    if let Some(report) = &results.surfaceflinger {
        let _ = writeln!(out, "  surfaceflinger: {}", report.path.display());
    }
    if let Some(platform) = &results.platform_file {
        let _ = writeln!(out, "  platform:       {}", platform.display());
    }
    out
}
