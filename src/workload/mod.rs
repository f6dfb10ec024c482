//! Workloads
//!
//! A workload is a scripted interaction with one application, used to generate load while collectors observe the
//! device. Variants are plain values registered with the [`crate::registry::WorkloadRegistry`]; each one pairs a
//! [`WorkloadDescriptor`] with a factory producing a [`Workload`].
//!
//! A resolved workload is wrapped in a [`WorkloadInstance`], which owns the run-scoped state (trace file, energy
//! report, parsed statistics) and hands the workload a [`RunContext`] to bracket its work with collector start/stop.

pub mod app_launch;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tracebench_core::CollectSpec;
use tracing::info;

use crate::collectors::{DumpsysReport, EnergyReport};
use crate::device::Target;
use crate::env::TestEnv;
use crate::error::{HarnessError, Result};
use crate::lifecycle::{LifecycleState, RunResults, TraceCoordinator};

pub use app_launch::{AppLaunch, BUILTIN_WORKLOADS};

/// A workload variant: its name (matched case-insensitively) and the package it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadDescriptor {
    pub name: String,
    pub package: String,
}

impl WorkloadDescriptor {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
        }
    }

    /// Registry key: the lower-cased name.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Builds a fresh workload for a registered descriptor.
pub type WorkloadFactory = fn(&WorkloadDescriptor) -> Box<dyn Workload>;

/// Parameters of a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunParams {
    /// How long the workload keeps the application busy
    pub duration: Duration,
    /// Variant-specific settings
    pub extra: BTreeMap<String, String>,
}

impl RunParams {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Scripted interaction with one application.
pub trait Workload {
    fn descriptor(&self) -> &WorkloadDescriptor;

    /// Drive the application, calling [`RunContext::tracing_start`] and [`RunContext::tracing_stop`] around the part
    /// that should be measured.
    ///
    /// Variants must override this; the provided body fails with `NotImplemented`.
    fn run(&mut self, _ctx: &mut RunContext<'_, '_>, _params: &RunParams) -> Result<()> {
        Err(HarnessError::NotImplemented {
            workload: self.descriptor().name.clone(),
        })
    }
}

/// What a workload sees while it runs.
pub struct RunContext<'run, 'env> {
    env: &'env TestEnv,
    coordinator: &'run mut TraceCoordinator<'env>,
    out_dir: &'run Path,
    collect: &'run CollectSpec,
    package: &'run str,
}

impl<'run, 'env> RunContext<'run, 'env> {
    pub fn env(&self) -> &'env TestEnv {
        self.env
    }

    pub fn target(&self) -> &'env dyn Target {
        self.env.target()
    }

    pub fn out_dir(&self) -> &Path {
        self.out_dir
    }

    pub fn collect(&self) -> &CollectSpec {
        self.collect
    }

    pub fn package(&self) -> &str {
        self.package
    }

    /// Start the selected collectors.
    pub fn tracing_start(&mut self) -> Result<()> {
        self.coordinator.start(self.collect, self.out_dir, self.package)
    }

    /// Stop the selected collectors and store their results on the instance.
    pub fn tracing_stop(&mut self) -> Result<()> {
        self.coordinator.stop()
    }
}

/// A workload bound to a test environment, used for exactly one run.
pub struct WorkloadInstance<'env> {
    env: &'env TestEnv,
    workload: Box<dyn Workload>,
    coordinator: TraceCoordinator<'env>,
}

impl std::fmt::Debug for WorkloadInstance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadInstance")
            .field("workload", &self.workload.descriptor().name)
            .finish_non_exhaustive()
    }
}

impl<'env> WorkloadInstance<'env> {
    pub fn new(env: &'env TestEnv, workload: Box<dyn Workload>) -> Self {
        Self {
            env,
            workload,
            coordinator: TraceCoordinator::new(env),
        }
    }

    pub fn descriptor(&self) -> &WorkloadDescriptor {
        self.workload.descriptor()
    }

    /// Run the workload, collecting what `collect` selects into `out_dir` (created if missing).
    #[tracing::instrument(skip_all, fields(workload = %self.workload.descriptor().name, collect = %collect))]
    pub fn run(&mut self, out_dir: &Path, collect: &CollectSpec, params: &RunParams) -> Result<()> {
        fs::create_dir_all(out_dir).map_err(|e| HarnessError::io(out_dir, e))?;

        let package = self.workload.descriptor().package.clone();
        info!(out_dir = %out_dir.display(), "running workload");

        let mut ctx = RunContext {
            env: self.env,
            coordinator: &mut self.coordinator,
            out_dir,
            collect,
            package: &package,
        };
        self.workload.run(&mut ctx, params)
    }

    pub fn state(&self) -> LifecycleState {
        self.coordinator.state()
    }

    pub fn results(&self) -> &RunResults {
        self.coordinator.results()
    }

    pub fn trace_file(&self) -> Option<&Path> {
        self.results().trace_file.as_deref()
    }

    pub fn nrg_report(&self) -> Option<&EnergyReport> {
        self.results().nrg_report.as_ref()
    }

    pub fn gfxinfo(&self) -> Option<&DumpsysReport> {
        self.results().gfxinfo.as_ref()
    }

    pub fn surfaceflinger(&self) -> Option<&DumpsysReport> {
        self.results().surfaceflinger.as_ref()
    }
}
