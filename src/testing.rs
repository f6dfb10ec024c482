//! Recording fakes for every collaborator trait
//!
//! Each fake is a cheap handle over shared state, so a test can keep a clone after moving another clone into a
//! [`TestEnv`] and inspect what the harness did. Collector fakes append to a shared [`CallLog`], which makes the
//! relative order of calls across collectors observable.
//!
//! ## Examples
//!
//! ```rust
//! use tracebench::testing::FakeBench;
//! use tracebench::WorkloadRegistry;
//!
//! let bench = FakeBench::new(["com.google.android.youtube"]);
//! let env = bench.env();
//! let mut registry = WorkloadRegistry::with_builtin_workloads();
//! assert!(registry.get_instance(&env, "youtube").is_ok());
//! assert_eq!(bench.target.package_queries(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracebench_core::CollectorId;

use crate::collectors::{DumpsysCollector, EnergyMeter, EnergyReport, KernelTracer, SystemTracer, SystraceSession};
use crate::config::HarnessConfig;
use crate::device::{PlatformInfo, Target};
use crate::env::TestEnv;
use crate::error::{HarnessError, Result};

/// Ordered record of collaborator calls, shared by all fakes of a bench.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e.starts_with(prefix))
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.position(prefix).is_some()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

// ============================================================================
// Device
// ============================================================================

#[derive(Debug, Default)]
struct FakeTargetState {
    packages: BTreeSet<String>,
    serial: Option<String>,
    responses: Vec<(String, String)>,
    failures: Vec<String>,
    commands: RefCell<Vec<String>>,
    pulls: RefCell<Vec<(String, PathBuf)>>,
    package_queries: Cell<usize>,
    fail_package_queries: Cell<bool>,
}

/// Device with a fixed package set. Shell commands are recorded and answered from canned responses.
#[derive(Debug, Clone)]
pub struct FakeTarget {
    state: Rc<FakeTargetState>,
    log: CallLog,
}

impl FakeTarget {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Rc::new(FakeTargetState {
                packages: packages.into_iter().map(Into::into).collect(),
                ..FakeTargetState::default()
            }),
            log: CallLog::new(),
        }
    }

    fn state_mut(&mut self) -> &mut FakeTargetState {
        Rc::get_mut(&mut self.state).expect("configure FakeTarget before cloning it")
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.state_mut().serial = Some(serial.into());
        self
    }

    /// Answer commands starting with `prefix` with `output`.
    pub fn with_response(mut self, prefix: impl Into<String>, output: impl Into<String>) -> Self {
        self.state_mut().responses.push((prefix.into(), output.into()));
        self
    }

    /// Fail commands starting with `prefix` with a device error.
    pub fn with_failure(mut self, prefix: impl Into<String>) -> Self {
        self.state_mut().failures.push(prefix.into());
        self
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Make every later package query fail with a device error.
    pub fn fail_package_queries(&self) {
        self.state.fail_package_queries.set(true);
    }

    pub fn package_queries(&self) -> usize {
        self.state.package_queries.get()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.commands.borrow().clone()
    }

    pub fn pulls(&self) -> Vec<(String, PathBuf)> {
        self.state.pulls.borrow().clone()
    }
}

impl Target for FakeTarget {
    fn serial(&self) -> Option<&str> {
        self.state.serial.as_deref()
    }

    fn list_packages(&self) -> Result<BTreeSet<String>> {
        self.state.package_queries.set(self.state.package_queries.get() + 1);
        if self.state.fail_package_queries.get() {
            return Err(HarnessError::Device("device offline".to_string()));
        }
        Ok(self.state.packages.clone())
    }

    fn execute(&self, command: &str) -> Result<String> {
        self.state.commands.borrow_mut().push(command.to_string());
        if self.state.failures.iter().any(|prefix| command.starts_with(prefix.as_str())) {
            return Err(HarnessError::Device(format!("`{command}` failed")));
        }
        let output = self
            .state
            .responses
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        Ok(output)
    }

    fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        self.state.pulls.borrow_mut().push((remote.to_string(), local.to_path_buf()));
        fs::write(local, format!("pulled from {remote}\n")).map_err(|e| HarnessError::io(local, e))
    }

    fn platform_info(&self) -> Result<PlatformInfo> {
        self.log.record("platform_info");
        Ok(PlatformInfo {
            serial: self.state.serial.clone(),
            model: Some("FakeDevice".to_string()),
            ..PlatformInfo::default()
        })
    }
}

// ============================================================================
// Collectors
// ============================================================================

/// `dumpsys` collector that writes a canned report.
#[derive(Debug, Clone)]
pub struct FakeDumpsys {
    collector: CollectorId,
    report: Rc<str>,
    log: CallLog,
}

impl FakeDumpsys {
    pub fn new(collector: CollectorId, report: &str, log: CallLog) -> Self {
        Self {
            collector,
            report: Rc::from(report),
            log,
        }
    }
}

impl DumpsysCollector for FakeDumpsys {
    fn collector(&self) -> CollectorId {
        self.collector
    }

    fn reset(&self, _target: &dyn Target, package: &str) -> Result<()> {
        self.log.record(format!("{}.reset {}", self.collector, package));
        Ok(())
    }

    fn dump(&self, _target: &dyn Target, package: &str, path: &Path) -> Result<()> {
        self.log
            .record(format!("{}.dump {} {}", self.collector, package, path.display()));
        fs::write(path, self.report.as_bytes()).map_err(|e| HarnessError::io(path, e))
    }

    fn parse(&self, path: &Path) -> Result<crate::collectors::DumpsysReport> {
        self.log.record(format!("{}.parse {}", self.collector, path.display()));
        crate::collectors::DumpsysReport::from_file(self.collector, path)
    }
}

/// Kernel tracer that writes a placeholder trace.
#[derive(Debug, Clone)]
pub struct FakeKernelTracer {
    log: CallLog,
    fails_start: bool,
    fails_stop: bool,
}

impl FakeKernelTracer {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fails_start: false,
            fails_stop: false,
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fails_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fails_stop = true;
        self
    }
}

impl KernelTracer for FakeKernelTracer {
    fn start(&self, _target: &dyn Target) -> Result<()> {
        self.log.record("ftrace.start");
        if self.fails_start {
            return Err(HarnessError::collector(CollectorId::Ftrace, "tracefs not mounted"));
        }
        Ok(())
    }

    fn stop(&self, _target: &dyn Target) -> Result<()> {
        self.log.record("ftrace.stop");
        if self.fails_stop {
            return Err(HarnessError::collector(CollectorId::Ftrace, "tracefs not mounted"));
        }
        Ok(())
    }

    fn get_trace(&self, _target: &dyn Target, path: &Path) -> Result<()> {
        self.log.record(format!("ftrace.get_trace {}", path.display()));
        fs::write(path, b"fake trace\n").map_err(|e| HarnessError::io(path, e))
    }
}

/// System tracer whose sessions only record what was asked of them.
#[derive(Debug, Clone)]
pub struct FakeSystemTracer {
    log: CallLog,
    installed: bool,
    times_out: bool,
}

impl FakeSystemTracer {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            installed: true,
            times_out: false,
        }
    }

    /// Behave as if the tool is missing: `start` returns no session.
    pub fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    /// Sessions fail every bounded wait with a timeout.
    pub fn timing_out(mut self) -> Self {
        self.times_out = true;
        self
    }
}

impl SystemTracer for FakeSystemTracer {
    fn start(
        &self,
        _target: &dyn Target,
        trace_file: &Path,
        time: Option<u64>,
    ) -> Result<Option<Box<dyn SystraceSession>>> {
        let time = time.map_or_else(|| "unbounded".to_string(), |t| t.to_string());
        self.log.record(format!("systrace.start {} {}", trace_file.display(), time));
        if !self.installed {
            return Ok(None);
        }
        Ok(Some(Box::new(FakeSystraceSession {
            log: self.log.clone(),
            times_out: self.times_out,
        })))
    }
}

struct FakeSystraceSession {
    log: CallLog,
    times_out: bool,
}

impl SystraceSession for FakeSystraceSession {
    fn signal_completion(&mut self) -> Result<()> {
        self.log.record("systrace.signal");
        Ok(())
    }

    fn wait(&mut self) -> Result<()> {
        self.log.record("systrace.wait");
        Ok(())
    }

    fn wait_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.log.record(format!("systrace.wait_timeout {}", timeout.as_secs()));
        if self.times_out {
            return Err(HarnessError::Timeout(timeout));
        }
        Ok(())
    }
}

/// Energy meter reporting fixed channel values.
#[derive(Debug, Clone)]
pub struct FakeEnergyMeter {
    log: CallLog,
    channels: BTreeMap<String, f64>,
}

impl FakeEnergyMeter {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            channels: [("big".to_string(), 3.5), ("little".to_string(), 1.25)].into_iter().collect(),
        }
    }
}

impl EnergyMeter for FakeEnergyMeter {
    fn reset(&self) -> Result<()> {
        self.log.record("emeter.reset");
        Ok(())
    }

    fn report(&self, out_dir: &Path) -> Result<EnergyReport> {
        self.log.record(format!("emeter.report {}", out_dir.display()));
        Ok(EnergyReport {
            channels: self.channels.clone(),
            report_file: None,
        })
    }
}

// ============================================================================
// Bench
// ============================================================================

/// A canned gfxinfo report.
pub const FAKE_GFXINFO: &str = "\
** Graphics info for pid 4242 [com.example.app] **

Total frames rendered: 240
Janky frames: 12 (5.00%)
";

/// A canned SurfaceFlinger report.
pub const FAKE_SURFACEFLINGER: &str = "\
Display 0 HWC layers:
Refresh rate: 60 fps
Missed frame count: 3
";

/// One fake of every collaborator, sharing one [`CallLog`].
#[derive(Debug, Clone)]
pub struct FakeBench {
    pub log: CallLog,
    pub target: FakeTarget,
    pub gfxinfo: FakeDumpsys,
    pub surfaceflinger: FakeDumpsys,
    pub ftrace: FakeKernelTracer,
    pub systrace: FakeSystemTracer,
    pub emeter: Option<FakeEnergyMeter>,
}

impl FakeBench {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let log = CallLog::new();
        Self {
            target: FakeTarget::new(packages).with_log(log.clone()),
            gfxinfo: FakeDumpsys::new(CollectorId::Gfxinfo, FAKE_GFXINFO, log.clone()),
            surfaceflinger: FakeDumpsys::new(CollectorId::SurfaceFlinger, FAKE_SURFACEFLINGER, log.clone()),
            ftrace: FakeKernelTracer::new(log.clone()),
            systrace: FakeSystemTracer::new(log.clone()),
            emeter: None,
            log,
        }
    }

    /// Attach an energy meter.
    pub fn with_emeter(mut self) -> Self {
        self.emeter = Some(FakeEnergyMeter::new(self.log.clone()));
        self
    }

    pub fn with_systrace(mut self, systrace: FakeSystemTracer) -> Self {
        self.systrace = systrace;
        self
    }

    /// Environment over clones of the fakes, with the default config.
    pub fn env(&self) -> TestEnv {
        self.env_with_config(HarnessConfig::new())
    }

    pub fn env_with_config(&self, config: HarnessConfig) -> TestEnv {
        let mut builder = TestEnv::builder(Box::new(self.target.clone()), config)
            .gfxinfo(Box::new(self.gfxinfo.clone()))
            .surfaceflinger(Box::new(self.surfaceflinger.clone()))
            .ftrace(Box::new(self.ftrace.clone()))
            .systrace(Box::new(self.systrace.clone()));
        if let Some(emeter) = &self.emeter {
            builder = builder.emeter(Box::new(emeter.clone()));
        }
        builder.build()
    }
}

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("tracebench_{}_{}_{}", name, std::process::id(), nanos));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
