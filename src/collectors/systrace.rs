//! Host-side system trace tool (catapult `systrace`).
//!
//! The tool is spawned as a child process with a piped stdin. A capture started with a fixed time exits on its own;
//! one started without a time writes its report after it reads an end-of-input line.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracebench_core::CollectorId;
use tracing::{info, warn};

use super::{SystemTracer, SystraceSession};
use crate::config::HarnessConfig;
use crate::device::Target;
use crate::error::{HarnessError, Result};

/// Tool names, in lookup order, under `<catapult_home>/systrace/systrace/`.
const TOOL_NAMES: &[&str] = &["systrace.py", "run_systrace.py"];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Systrace {
    catapult_home: Option<PathBuf>,
    categories: Vec<String>,
    buffer_kb: u32,
}

impl Systrace {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            catapult_home: config.catapult_home.clone(),
            categories: config.systrace_categories.clone(),
            buffer_kb: config.systrace_buffer_kb,
        }
    }

    /// First tool found under the catapult checkout.
    pub fn locate_tool(&self) -> Option<PathBuf> {
        let dir = self.catapult_home.as_ref()?.join("systrace").join("systrace");
        TOOL_NAMES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
    }

    /// Tool arguments: `[-e serial] -o <file> <categories...> -b <kb> [-t <secs>]`.
    fn args(&self, serial: Option<&str>, trace_file: &Path, time: Option<u64>) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(serial) = serial {
            args.extend(["-e".to_string(), serial.to_string()]);
        }
        args.extend(["-o".to_string(), trace_file.to_string_lossy().into_owned()]);
        args.extend(self.categories.iter().cloned());
        args.extend(["-b".to_string(), self.buffer_kb.to_string()]);
        if let Some(secs) = time {
            args.extend(["-t".to_string(), secs.to_string()]);
        }
        args
    }
}

impl SystemTracer for Systrace {
    fn start(
        &self,
        target: &dyn Target,
        trace_file: &Path,
        time: Option<u64>,
    ) -> Result<Option<Box<dyn SystraceSession>>> {
        let Some(tool) = self.locate_tool() else {
            warn!(catapult_home = ?self.catapult_home, "systrace tool not available under catapult home");
            return Ok(None);
        };

        let args = self.args(target.serial(), trace_file, time);
        info!("SysTrace: {} {}", tool.display(), args.join(" "));

        let child = Command::new(&tool)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| HarnessError::collector(CollectorId::Systrace, format!("failed to spawn {}: {}", tool.display(), e)))?;

        Ok(Some(Box::new(ChildSession::new(child))))
    }
}

/// A running tool process.
pub struct ChildSession {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl ChildSession {
    pub fn new(mut child: Child) -> Self {
        let stdin = child.stdin.take();
        Self { child, stdin }
    }

    fn check_exit(status: std::process::ExitStatus) -> Result<()> {
        if status.success() {
            Ok(())
        } else {
            Err(HarnessError::collector(CollectorId::Systrace, format!("tool exited with {}", status)))
        }
    }
}

impl SystraceSession for ChildSession {
    fn signal_completion(&mut self) -> Result<()> {
        // The handle is dropped once the line is written, so the tool also sees end-of-input.
        let Some(mut stdin) = self.stdin.take() else {
            return Err(HarnessError::collector(CollectorId::Systrace, "tool stdin already closed"));
        };
        stdin
            .write_all(b"\n")
            .and_then(|_| stdin.flush())
            .map_err(|e| HarnessError::collector(CollectorId::Systrace, format!("failed to signal tool: {}", e)))
    }

    fn wait(&mut self) -> Result<()> {
        // stdin stays open: a bounded capture must not see end-of-input.
        let status = self
            .child
            .wait()
            .map_err(|e| HarnessError::collector(CollectorId::Systrace, format!("failed to wait for tool: {}", e)))?;
        Self::check_exit(status)
    }

    fn wait_timeout(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let polled = self
                .child
                .try_wait()
                .map_err(|e| HarnessError::collector(CollectorId::Systrace, format!("failed to poll tool: {}", e)))?;
            if let Some(status) = polled {
                return Self::check_exit(status);
            }
            if Instant::now() >= deadline {
                let _ = self.child.kill();
                let _ = self.child.wait();
                return Err(HarnessError::Timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
