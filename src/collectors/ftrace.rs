//! Kernel event tracing through the device tracefs.
//!
//! The capture is armed and disarmed by writing tracefs control files, and extracted with `trace-cmd` on the device
//! into a scratch file that is then pulled to the host.

use std::path::Path;

use super::KernelTracer;
use crate::config::HarnessConfig;
use crate::device::Target;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ftrace {
    tracefs_root: String,
    events: Vec<String>,
    device_tmp_dir: String,
}

impl Ftrace {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            tracefs_root: config.tracefs_root.clone(),
            events: config.ftrace_events.clone(),
            device_tmp_dir: config.device_tmp_dir.clone(),
        }
    }

    /// Shell command that clears the buffer, enables the configured events and turns tracing on.
    fn start_command(&self) -> String {
        let root = &self.tracefs_root;
        let mut steps = vec![format!("echo 0 > {root}/tracing_on"), format!("echo > {root}/trace")];
        steps.extend(self.events.iter().map(|event| format!("echo 1 > {root}/events/*/{event}/enable")));
        steps.push(format!("echo 1 > {root}/tracing_on"));
        steps.join(" && ")
    }

    fn device_trace_path(&self) -> String {
        format!("{}/{}", self.device_tmp_dir, tracebench_core::artifacts::TRACE_DAT)
    }
}

impl KernelTracer for Ftrace {
    fn start(&self, target: &dyn Target) -> Result<()> {
        target.execute(&self.start_command()).map(|_| ())
    }

    fn stop(&self, target: &dyn Target) -> Result<()> {
        target
            .execute(&format!("echo 0 > {}/tracing_on", self.tracefs_root))
            .map(|_| ())
    }

    fn get_trace(&self, target: &dyn Target, path: &Path) -> Result<()> {
        let remote = self.device_trace_path();
        target.execute(&format!("trace-cmd extract -o {remote}"))?;
        target.pull(&remote, path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testing::FakeTarget;

    fn ftrace() -> Ftrace {
        Ftrace::new(&HarnessConfig::new().with_ftrace_events(["sched_switch", "cpu_idle"]))
    }

    #[test]
    fn test_start_command() {
        assert_eq!(
            ftrace().start_command(),
            "echo 0 > /sys/kernel/debug/tracing/tracing_on \
             && echo > /sys/kernel/debug/tracing/trace \
             && echo 1 > /sys/kernel/debug/tracing/events/*/sched_switch/enable \
             && echo 1 > /sys/kernel/debug/tracing/events/*/cpu_idle/enable \
             && echo 1 > /sys/kernel/debug/tracing/tracing_on"
        );
    }

    #[test]
    fn test_get_trace_extracts_then_pulls() {
        let target = FakeTarget::new(Vec::<String>::new());
        ftrace().stop(&target).unwrap();
        ftrace().get_trace(&target, Path::new("/tmp/run1/trace.dat")).unwrap();

        assert_eq!(
            target.commands(),
            vec![
                "echo 0 > /sys/kernel/debug/tracing/tracing_on",
                "trace-cmd extract -o /data/local/tmp/trace.dat"
            ]
        );
        assert_eq!(
            target.pulls(),
            vec![("/data/local/tmp/trace.dat".to_string(), PathBuf::from("/tmp/run1/trace.dat"))]
        );
    }
}
