//! Device-control boundary
//!
//! The harness never talks to a device directly. Everything it needs (package enumeration, shell commands, file
//! transfer, platform properties) goes through the [`Target`] trait, so the registry and the tracing coordinator can
//! be driven by `adb` in production and by recording fakes in tests.

pub mod adb;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use adb::AdbTarget;

/// Operations the harness needs from a device.
pub trait Target {
    /// Serial of the device, when one was selected explicitly.
    fn serial(&self) -> Option<&str>;

    /// Identifiers of every package installed on the device.
    fn list_packages(&self) -> Result<BTreeSet<String>>;

    /// Run a shell command on the device and return its standard output.
    fn execute(&self, command: &str) -> Result<String>;

    /// Copy a file from the device to the host.
    fn pull(&self, remote: &str, local: &Path) -> Result<()>;

    /// Render a host-side adb invocation addressed at this device.
    fn adb_command(&self, command: &str) -> String {
        match self.serial() {
            Some(serial) => format!("adb -s {} {}", serial, command),
            None => format!("adb {}", command),
        }
    }

    /// Describe the platform, read from the device properties.
    fn platform_info(&self) -> Result<PlatformInfo> {
        let props = self.execute("getprop")?;
        Ok(PlatformInfo::from_getprop(self.serial(), &props))
    }
}

/// Platform description written next to every run's artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub serial: Option<String>,
    pub model: Option<String>,
    pub os_release: Option<String>,
    pub abi: Option<String>,
    /// Remaining `ro.*` properties, for post-processing that needs more than the summary fields
    pub properties: BTreeMap<String, String>,
}

impl PlatformInfo {
    /// Build a description from `getprop` output (`[key]: [value]` per line).
    pub fn from_getprop(serial: Option<&str>, output: &str) -> Self {
        let mut properties: BTreeMap<String, String> = output
            .lines()
            .filter_map(parse_getprop_line)
            .filter(|(key, _)| key.starts_with("ro."))
            .collect();

        Self {
            serial: serial.map(str::to_string),
            model: properties.remove("ro.product.model"),
            os_release: properties.remove("ro.build.version.release"),
            abi: properties.remove("ro.product.cpu.abi"),
            properties,
        }
    }
}

fn parse_getprop_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.trim().split_once("]: [")?;
    let key = key.strip_prefix('[')?;
    let value = value.strip_suffix(']')?;
    Some((key.to_string(), value.to_string()))
}

/// Parse `pm list packages` output (`package:<id>` per line).
pub fn parse_package_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .filter(|pkg| !pkg.is_empty())
        .map(str::to_string)
        .collect()
}
