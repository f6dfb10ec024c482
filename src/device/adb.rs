//! `adb`-backed [`Target`] implementation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{Target, parse_package_list};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Device reached through the host `adb` executable.
#[derive(Debug, Clone)]
pub struct AdbTarget {
    adb_path: PathBuf,
    serial: Option<String>,
}

impl AdbTarget {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            adb_path: config.adb_path.clone(),
            serial: config.serial.clone(),
        }
    }

    fn adb(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    /// Run adb with `args` and capture stdout; a non-zero exit becomes a device error.
    fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!(args = ?args, "adb");
        let output = self
            .adb()
            .args(args)
            .output()
            .map_err(|e| HarnessError::Device(format!("failed to run {}: {}", self.adb_path.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::Device(format!(
                "`adb {}` exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Target for AdbTarget {
    fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn list_packages(&self) -> Result<BTreeSet<String>> {
        let output = self.execute("pm list packages")?;
        Ok(parse_package_list(&output))
    }

    fn execute(&self, command: &str) -> Result<String> {
        self.run(&["shell", command])
    }

    fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        let local = local.to_string_lossy();
        self.run(&["pull", remote, &local]).map(|_| ())
    }
}
