//! `dumpsys`-backed frame and compositor statistics.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracebench_core::CollectorId;

use super::DumpsysCollector;
use crate::device::Target;
use crate::error::{HarnessError, Result};

/// Collector backed by one `dumpsys` service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dumpsys {
    collector: CollectorId,
    service: &'static str,
}

impl Dumpsys {
    /// Rendering frame statistics (`dumpsys gfxinfo`).
    pub fn gfxinfo() -> Self {
        Self {
            collector: CollectorId::Gfxinfo,
            service: "gfxinfo",
        }
    }

    /// Compositor statistics (`dumpsys SurfaceFlinger`).
    pub fn surfaceflinger() -> Self {
        Self {
            collector: CollectorId::SurfaceFlinger,
            service: "SurfaceFlinger",
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }
}

impl DumpsysCollector for Dumpsys {
    fn collector(&self) -> CollectorId {
        self.collector
    }

    fn reset(&self, target: &dyn Target, package: &str) -> Result<()> {
        target
            .execute(&format!("dumpsys {} {} reset", self.service, package))
            .map(|_| ())
    }

    fn dump(&self, target: &dyn Target, package: &str, path: &Path) -> Result<()> {
        let stats = target.execute(&format!("dumpsys {} {}", self.service, package))?;
        fs::write(path, stats).map_err(|e| HarnessError::io(path, e))
    }
}

/// Flat view of a `dumpsys` report.
///
/// Only top-level `key: value` lines are kept; when a key repeats, the first occurrence wins. Histograms and
/// per-window tables are left in the raw file at [`DumpsysReport::path`].
#[derive(Debug, Clone, PartialEq)]
pub struct DumpsysReport {
    pub collector: CollectorId,
    pub path: PathBuf,
    pub fields: BTreeMap<String, String>,
}

impl DumpsysReport {
    pub fn from_file(collector: CollectorId, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self::from_text(collector, path, &text))
    }

    pub fn from_text(collector: CollectorId, path: &Path, text: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }
            fields.entry(key.to_string()).or_insert_with(|| value.to_string());
        }

        Self {
            collector,
            path: path.to_path_buf(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Leading integer of a field, e.g. `12` for `Janky frames: 12 (5.00%)`.
    pub fn count(&self, key: &str) -> Option<u64> {
        let value = self.field(key)?;
        let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    /// `Total frames rendered` from a gfxinfo report.
    pub fn total_frames(&self) -> Option<u64> {
        self.count("Total frames rendered")
    }

    /// `Janky frames` from a gfxinfo report.
    pub fn janky_frames(&self) -> Option<u64> {
        self.count("Janky frames")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTarget;

    const GFXINFO: &str = "\
Applications Graphics Acceleration Info:
Uptime: 4216512 Realtime: 4216512

** Graphics info for pid 8512 [com.example.app] **

Stats since: 4201954154ns
Total frames rendered: 240
Janky frames: 12 (5.00%)
50th percentile: 7ms
90th percentile: 13ms
Total frames rendered: 999
";

    #[test]
    fn test_report_fields() {
        let report = DumpsysReport::from_text(CollectorId::Gfxinfo, Path::new("gfx.txt"), GFXINFO);
        assert_eq!(report.total_frames(), Some(240));
        assert_eq!(report.janky_frames(), Some(12));
        assert_eq!(report.field("90th percentile"), Some("13ms"));
        assert_eq!(report.count("90th percentile"), Some(13));
        assert_eq!(report.field("Applications Graphics Acceleration Info"), None);
    }

    #[test]
    fn test_report_missing_file_is_io_error() {
        let err = DumpsysReport::from_file(CollectorId::Gfxinfo, Path::new("/nonexistent/dumpsys_gfxinfo.txt"))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }

    #[test]
    fn test_reset_commands() {
        let target = FakeTarget::new(["com.example.app"]);
        Dumpsys::gfxinfo().reset(&target, "com.example.app").unwrap();
        Dumpsys::surfaceflinger().reset(&target, "com.example.app").unwrap();
        assert_eq!(
            target.commands(),
            vec![
                "dumpsys gfxinfo com.example.app reset",
                "dumpsys SurfaceFlinger com.example.app reset"
            ]
        );
    }
}
