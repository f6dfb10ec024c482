//! Test environment: one device plus the collectors that can observe it.

use std::fs;
use std::path::{Path, PathBuf};

use tracebench_core::artifacts;
use tracing::info;

use crate::collectors::{
    Dumpsys, DumpsysCollector, EnergyMeter, Ftrace, KernelTracer, SystemTracer, Systrace,
};
use crate::config::HarnessConfig;
use crate::device::{AdbTarget, Target};
use crate::error::{HarnessError, Result};

/// A device and its collectors, shared by every workload instance of a session.
pub struct TestEnv {
    target: Box<dyn Target>,
    gfxinfo: Box<dyn DumpsysCollector>,
    surfaceflinger: Box<dyn DumpsysCollector>,
    ftrace: Box<dyn KernelTracer>,
    systrace: Box<dyn SystemTracer>,
    emeter: Option<Box<dyn EnergyMeter>>,
    config: HarnessConfig,
}

impl TestEnv {
    /// Environment backed by `adb` and the default collectors; no energy meter.
    pub fn adb(config: HarnessConfig) -> Self {
        Self::builder(Box::new(AdbTarget::new(&config)), config).build()
    }

    /// Start from the default collectors and replace any of them.
    pub fn builder(target: Box<dyn Target>, config: HarnessConfig) -> TestEnvBuilder {
        TestEnvBuilder {
            gfxinfo: Box::new(Dumpsys::gfxinfo()),
            surfaceflinger: Box::new(Dumpsys::surfaceflinger()),
            ftrace: Box::new(Ftrace::new(&config)),
            systrace: Box::new(Systrace::new(&config)),
            emeter: None,
            target,
            config,
        }
    }

    pub fn target(&self) -> &dyn Target {
        self.target.as_ref()
    }

    pub fn gfxinfo(&self) -> &dyn DumpsysCollector {
        self.gfxinfo.as_ref()
    }

    pub fn surfaceflinger(&self) -> &dyn DumpsysCollector {
        self.surfaceflinger.as_ref()
    }

    pub fn ftrace(&self) -> &dyn KernelTracer {
        self.ftrace.as_ref()
    }

    pub fn systrace(&self) -> &dyn SystemTracer {
        self.systrace.as_ref()
    }

    pub fn emeter(&self) -> Option<&dyn EnergyMeter> {
        self.emeter.as_deref()
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Write the platform description to `<out_dir>/platform.json`.
    pub fn platform_dump(&self, out_dir: &Path) -> Result<PathBuf> {
        let platform = self.target.platform_info()?;
        let path = out_dir.join(artifacts::PLATFORM_JSON);
        let json = serde_json::to_string_pretty(&platform)?;
        fs::write(&path, json).map_err(|e| HarnessError::io(&path, e))?;
        info!(path = %path.display(), "platform description saved");
        Ok(path)
    }
}

/// Builder for [`TestEnv`]
pub struct TestEnvBuilder {
    target: Box<dyn Target>,
    gfxinfo: Box<dyn DumpsysCollector>,
    surfaceflinger: Box<dyn DumpsysCollector>,
    ftrace: Box<dyn KernelTracer>,
    systrace: Box<dyn SystemTracer>,
    emeter: Option<Box<dyn EnergyMeter>>,
    config: HarnessConfig,
}

impl TestEnvBuilder {
    pub fn gfxinfo(mut self, collector: Box<dyn DumpsysCollector>) -> Self {
        self.gfxinfo = collector;
        self
    }

    pub fn surfaceflinger(mut self, collector: Box<dyn DumpsysCollector>) -> Self {
        self.surfaceflinger = collector;
        self
    }

    pub fn ftrace(mut self, tracer: Box<dyn KernelTracer>) -> Self {
        self.ftrace = tracer;
        self
    }

    pub fn systrace(mut self, tracer: Box<dyn SystemTracer>) -> Self {
        self.systrace = tracer;
        self
    }

    pub fn emeter(mut self, meter: Box<dyn EnergyMeter>) -> Self {
        self.emeter = Some(meter);
        self
    }

    pub fn build(self) -> TestEnv {
        TestEnv {
            target: self.target,
            gfxinfo: self.gfxinfo,
            surfaceflinger: self.surfaceflinger,
            ftrace: self.ftrace,
            systrace: self.systrace,
            emeter: self.emeter,
            config: self.config,
        }
    }
}
