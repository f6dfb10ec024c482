//! Tracing lifecycle coordinator
//!
//! Brackets one workload run with the collectors selected by its [`CollectSpec`].
//!
//! ## State machine
//!
//! `Idle -> Started -> Stopped`, once per workload instance. [`TraceCoordinator::start`] is only valid while idle and
//! [`TraceCoordinator::stop`] only while started; anything else fails with `InvalidState`.
//!
//! ## Ordering
//!
//! `start`: gfxinfo reset, surfaceflinger reset, trace-backend exclusivity check, ftrace *or* systrace start, energy
//! meter reset.
//!
//! `stop`: energy report, trace backend finalisation, gfxinfo dump + parse, surfaceflinger dump + parse, platform
//! dump. The dumpsys dumps can be slow, so they run after the trace is finalised; the platform dump runs last so it
//! sees the post-run state.

use std::path::{Path, PathBuf};

use tracebench_core::{CollectSpec, CollectorId, artifacts};
use tracing::{info, warn};

use crate::collectors::{DumpsysCollector, DumpsysReport, EnergyReport, SystraceSession};
use crate::env::TestEnv;
use crate::error::{HarnessError, Result};

/// Where a coordinator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Started,
    Stopped,
}

impl LifecycleState {
    fn describe(self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Started => "started",
            LifecycleState::Stopped => "stopped",
        }
    }
}

/// Everything a run leaves behind.
#[derive(Debug, Default)]
pub struct RunResults {
    /// Trace file of the active backend; set when the backend starts
    pub trace_file: Option<PathBuf>,
    pub nrg_report: Option<EnergyReport>,
    /// Frame statistics, when `gfxinfo` was collected
    pub gfxinfo: Option<DumpsysReport>,
    /// Compositor statistics, when `surfaceflinger` was collected
    pub surfaceflinger: Option<DumpsysReport>,
    /// `platform.json` written at stop
    pub platform_file: Option<PathBuf>,
}

/// State held between a start and its stop.
struct TraceSession {
    collect: CollectSpec,
    out_dir: PathBuf,
    package: String,
    systrace: Option<Box<dyn SystraceSession>>,
    systrace_time: Option<u64>,
}

/// Drives the collectors of one [`TestEnv`] around one run.
pub struct TraceCoordinator<'env> {
    env: &'env TestEnv,
    state: LifecycleState,
    session: Option<TraceSession>,
    results: RunResults,
}

impl<'env> TraceCoordinator<'env> {
    pub fn new(env: &'env TestEnv) -> Self {
        Self {
            env,
            state: LifecycleState::Idle,
            session: None,
            results: RunResults::default(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn results(&self) -> &RunResults {
        &self.results
    }

    pub fn into_results(self) -> RunResults {
        self.results
    }

    /// Start the collectors selected by `collect` for `package`, with artifacts going to `out_dir`.
    ///
    /// ## Errors
    ///
    /// - `ConfigConflict` when both trace backends are selected. The dumpsys resets have already run at that point and
    ///   are not rolled back; no tracer has been touched.
    /// - Any collector fault, unchanged.
    #[tracing::instrument(skip_all, fields(collect = %collect, package = package))]
    pub fn start(&mut self, collect: &CollectSpec, out_dir: &Path, package: &str) -> Result<()> {
        if self.state != LifecycleState::Idle {
            return Err(self.invalid_state("start"));
        }
        let env = self.env;
        let target = env.target();

        if collect.contains(CollectorId::Gfxinfo) {
            env.gfxinfo().reset(target, package)?;
        }
        if collect.contains(CollectorId::SurfaceFlinger) {
            env.surfaceflinger().reset(target, package)?;
        }

        if collect.has_trace_conflict() {
            return Err(HarnessError::ConfigConflict);
        }

        let mut systrace = None;
        let systrace_time = collect.systrace_time();
        match collect.trace_backend() {
            Some(CollectorId::Ftrace) => {
                info!("FTrace START");
                env.ftrace().start(target)?;
                self.results.trace_file = Some(out_dir.join(artifacts::TRACE_DAT));
            }
            Some(CollectorId::Systrace) => {
                let trace_file = out_dir.join(artifacts::TRACE_HTML);
                info!(time = ?systrace_time, "Systrace START");
                systrace = env.systrace().start(target, &trace_file, systrace_time)?;
                self.results.trace_file = Some(trace_file);
            }
            _ => {}
        }

        if collect.contains(CollectorId::Energy) {
            if let Some(emeter) = env.emeter() {
                emeter.reset()?;
                info!("Energy meter STARTED");
            }
        }

        self.session = Some(TraceSession {
            collect: collect.clone(),
            out_dir: out_dir.to_path_buf(),
            package: package.to_string(),
            systrace,
            systrace_time,
        });
        self.state = LifecycleState::Started;
        Ok(())
    }

    /// Stop the collectors started by [`TraceCoordinator::start`] and gather their results.
    ///
    /// A systrace selection whose tool never started is logged and skipped. Every other collector fault propagates;
    /// the coordinator is `Stopped` either way.
    #[tracing::instrument(skip_all)]
    pub fn stop(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take().filter(|_| self.state == LifecycleState::Started) else {
            return Err(self.invalid_state("stop"));
        };
        self.state = LifecycleState::Stopped;

        let env = self.env;
        let target = env.target();
        let collect = &session.collect;
        let out_dir = session.out_dir.as_path();

        if collect.contains(CollectorId::Energy) {
            if let Some(emeter) = env.emeter() {
                self.results.nrg_report = Some(emeter.report(out_dir)?);
                info!("Energy meter STOPPED");
            }
        }

        match collect.trace_backend() {
            Some(CollectorId::Ftrace) => {
                env.ftrace().stop(target)?;
                info!("FTrace STOP");
                let trace_file = out_dir.join(artifacts::TRACE_DAT);
                env.ftrace().get_trace(target, &trace_file)?;
            }
            Some(CollectorId::Systrace) => match session.systrace.as_mut() {
                None => warn!("Systrace is not running!"),
                Some(handle) => {
                    info!(
                        "Waiting systrace report [{}]...",
                        out_dir.join(artifacts::TRACE_HTML).display()
                    );
                    if session.systrace_time.is_none() {
                        handle.signal_completion()?;
                    }
                    match env.config().systrace_timeout {
                        Some(timeout) => handle.wait_timeout(timeout)?,
                        None => handle.wait()?,
                    }
                }
            },
            _ => {}
        }

        if collect.contains(CollectorId::Gfxinfo) {
            self.results.gfxinfo = Some(dump_and_parse(
                env.gfxinfo(),
                env,
                &session.package,
                &out_dir.join(artifacts::DUMPSYS_GFXINFO),
            )?);
        }
        if collect.contains(CollectorId::SurfaceFlinger) {
            self.results.surfaceflinger = Some(dump_and_parse(
                env.surfaceflinger(),
                env,
                &session.package,
                &out_dir.join(artifacts::DUMPSYS_SURFACEFLINGER),
            )?);
        }

        self.results.platform_file = Some(env.platform_dump(out_dir)?);
        Ok(())
    }

    fn invalid_state(&self, operation: &'static str) -> HarnessError {
        HarnessError::InvalidState {
            operation,
            state: self.state.describe(),
        }
    }
}

/// Dump a collector's statistics to `path` and parse that same file.
fn dump_and_parse(
    collector: &dyn DumpsysCollector,
    env: &TestEnv,
    package: &str,
    path: &Path,
) -> Result<DumpsysReport> {
    collector.dump(env.target(), package, path)?;
    collector.parse(path)
}
