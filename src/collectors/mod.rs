//! Collector contracts
//!
//! Each telemetry source the harness can drive is described by a trait. The tracing coordinator only ever talks to
//! these traits; the default backends live in the submodules:
//!
//! - [`dumpsys`] - frame statistics (`gfxinfo`) and compositor statistics (`SurfaceFlinger`)
//! - [`ftrace`] - kernel event tracing through the device tracefs
//! - [`systrace`] - the host-side system trace tool
//!
//! There is no default energy meter: a meter is specific to the bench setup and is handed to the environment by the
//! caller.

pub mod dumpsys;
pub mod ftrace;
pub mod systrace;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracebench_core::CollectorId;

use crate::device::Target;
use crate::error::Result;

pub use dumpsys::{Dumpsys, DumpsysReport};
pub use ftrace::Ftrace;
pub use systrace::Systrace;

/// A `dumpsys` service whose per-package statistics are reset at start and dumped at stop.
pub trait DumpsysCollector {
    /// Which collector this is (`gfxinfo` or `surfaceflinger`).
    fn collector(&self) -> CollectorId;

    /// Clear the statistics accumulated for `package`.
    fn reset(&self, target: &dyn Target, package: &str) -> Result<()>;

    /// Write the statistics accumulated for `package` to `path` on the host.
    fn dump(&self, target: &dyn Target, package: &str, path: &Path) -> Result<()>;

    /// Parse a file previously written by [`DumpsysCollector::dump`].
    fn parse(&self, path: &Path) -> Result<DumpsysReport> {
        DumpsysReport::from_file(self.collector(), path)
    }
}

/// Kernel event tracer.
pub trait KernelTracer {
    fn start(&self, target: &dyn Target) -> Result<()>;

    fn stop(&self, target: &dyn Target) -> Result<()>;

    /// Retrieve the captured trace into `path` on the host.
    fn get_trace(&self, target: &dyn Target, path: &Path) -> Result<()>;
}

/// System-wide trace tool running next to the device.
pub trait SystemTracer {
    /// Start a capture writing to `trace_file`.
    ///
    /// With `time` set the tool stops on its own after that many seconds; without it the capture runs until the
    /// session is signalled. `Ok(None)` means the tool is not installed and no capture was started.
    fn start(
        &self,
        target: &dyn Target,
        trace_file: &Path,
        time: Option<u64>,
    ) -> Result<Option<Box<dyn SystraceSession>>>;
}

/// Handle on a running system trace capture.
pub trait SystraceSession {
    /// Tell a capture without a fixed duration to finish (the tool waits for an end-of-input line).
    fn signal_completion(&mut self) -> Result<()>;

    /// Block until the tool has written its output and exited.
    fn wait(&mut self) -> Result<()>;

    /// Like [`SystraceSession::wait`], failing with `HarnessError::Timeout` once `timeout` expires.
    fn wait_timeout(&mut self, timeout: Duration) -> Result<()>;
}

/// Energy meter provided by the bench setup.
pub trait EnergyMeter {
    /// Zero the accumulated energy counters.
    fn reset(&self) -> Result<()>;

    /// Report the energy consumed since the last reset, writing any raw data under `out_dir`.
    fn report(&self, out_dir: &Path) -> Result<EnergyReport>;
}

/// Energy consumed during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyReport {
    /// Energy per measurement channel (e.g. `big`, `little`, `gpu`), in joules
    pub channels: BTreeMap<String, f64>,
    /// File holding the meter's own report, if it wrote one
    pub report_file: Option<PathBuf>,
}

impl EnergyReport {
    /// Sum over all channels.
    pub fn total(&self) -> f64 {
        self.channels.values().sum()
    }
}
