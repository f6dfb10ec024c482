//! Harness configuration
//!
//! Defaults match a stock development setup: `adb` on `PATH`, tracefs mounted under debugfs, and the catapult
//! checkout located through `CATAPULT_HOME`.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the catapult checkout that contains the systrace tool
pub const CATAPULT_HOME_ENV: &str = "CATAPULT_HOME";

/// Harness configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Device serial passed to `adb -s`; `None` lets adb pick the only attached device
    pub serial: Option<String>,
    /// Path of the adb executable
    pub adb_path: PathBuf,
    /// Catapult checkout holding `systrace/systrace/systrace.py`
    pub catapult_home: Option<PathBuf>,
    /// Categories passed to the system trace tool
    pub systrace_categories: Vec<String>,
    /// Trace buffer size passed to the system trace tool (`-b`), in KiB
    pub systrace_buffer_kb: u32,
    /// Upper bound on the wait for the system trace tool at stop; `None` waits forever
    pub systrace_timeout: Option<Duration>,
    /// Kernel events enabled for ftrace captures
    pub ftrace_events: Vec<String>,
    /// tracefs mount point on the device
    pub tracefs_root: String,
    /// Scratch directory on the device
    pub device_tmp_dir: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            serial: None,
            adb_path: PathBuf::from("adb"),
            catapult_home: None,
            systrace_categories: ["gfx", "view", "sched", "freq", "idle"].map(String::from).to_vec(),
            systrace_buffer_kb: 40_000,
            systrace_timeout: None,
            ftrace_events: ["sched_switch", "sched_wakeup", "cpu_frequency", "cpu_idle"]
                .map(String::from)
                .to_vec(),
            tracefs_root: "/sys/kernel/debug/tracing".to_string(),
            device_tmp_dir: "/data/local/tmp".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings, with `catapult_home` taken from `CATAPULT_HOME` when set
    pub fn from_env() -> Self {
        let catapult_home = std::env::var_os(CATAPULT_HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            catapult_home,
            ..Self::default()
        }
    }

    /// Set the device serial
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Set the adb executable
    pub fn with_adb_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.adb_path = path.into();
        self
    }

    /// Set the catapult checkout
    pub fn with_catapult_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.catapult_home = Some(path.into());
        self
    }

    /// Bound the wait for the system trace tool
    pub fn with_systrace_timeout(mut self, timeout: Duration) -> Self {
        self.systrace_timeout = Some(timeout);
        self
    }

    /// Replace the ftrace event list
    pub fn with_ftrace_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ftrace_events = events.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_waits_forever() {
        let config = HarnessConfig::default();
        assert_eq!(config.systrace_timeout, None);
        assert_eq!(config.systrace_buffer_kb, 40_000);
        assert_eq!(config.adb_path, PathBuf::from("adb"));
    }

    #[test]
    fn test_default_systrace_categories() {
        let config = HarnessConfig::default();
        assert_eq!(config.systrace_categories, vec!["gfx", "view", "sched", "freq", "idle"]);
    }

    #[test]
    fn test_builder_chain() {
        let config = HarnessConfig::new()
            .with_serial("emulator-5554")
            .with_catapult_home("/opt/catapult")
            .with_systrace_timeout(Duration::from_secs(90))
            .with_ftrace_events(["sched_switch"]);
        assert_eq!(config.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(config.catapult_home, Some(PathBuf::from("/opt/catapult")));
        assert_eq!(config.systrace_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.ftrace_events, vec!["sched_switch"]);
    }
}
