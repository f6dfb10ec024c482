//! Define the collector vocabulary for the tracebench harness.
//!
//! This module is the single source of truth for collector tags: a stable identifier ([`CollectorId`]) plus a const
//! metadata table ([`COLLECTORS`]) that records canonical tags, categories, produced artifacts and a short description.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**, matching how collect specs are matched.
//! - Collectors in [`CollectorCategory::Trace`] are mutually exclusive within one run.
//!
//! ## Examples
//! ```rust
//! use tracebench_core::collectors::{self, CollectorId};
//!
//! assert_eq!(collectors::from_str("ftrace"), Some(CollectorId::Ftrace));
//! assert_eq!(collectors::as_str(CollectorId::SurfaceFlinger), "surfaceflinger");
//! assert_eq!(collectors::from_str("FTRACE"), None);
//! ```

use crate::artifacts;

/// Stable identifier for every collector.
///
/// The derived ordering is the order in which collectors are listed and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollectorId {
    Ftrace,
    Systrace,
    Gfxinfo,
    SurfaceFlinger,
    Energy,
}

/// Coarse grouping of collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorCategory {
    /// Trace backends; at most one may be active per run.
    Trace,
    /// Service statistics reset at start and dumped at stop.
    Dumpsys,
    /// Energy-meter sampling.
    Energy,
}

/// Metadata for a collector.
///
/// ## Notes
/// - `tag` is the spelling matched inside collect specs.
/// - `artifact` is the file the collector leaves in the run output directory, if any.
#[derive(Debug, Clone, Copy)]
pub struct CollectorInfo {
    pub id: CollectorId,
    pub tag: &'static str,
    pub category: CollectorCategory,
    pub artifact: Option<&'static str>,
    pub description: &'static str,
}

/// Registry of all collectors, in [`CollectorId`] order.
pub const COLLECTORS: &[CollectorInfo] = &[
    CollectorInfo {
        id: CollectorId::Ftrace,
        tag: "ftrace",
        category: CollectorCategory::Trace,
        artifact: Some(artifacts::TRACE_DAT),
        description: "Kernel event tracing through the device tracefs",
    },
    CollectorInfo {
        id: CollectorId::Systrace,
        tag: "systrace",
        category: CollectorCategory::Trace,
        artifact: Some(artifacts::TRACE_HTML),
        description: "System-wide trace captured by the host systrace tool; `systrace_<secs>` bounds the capture",
    },
    CollectorInfo {
        id: CollectorId::Gfxinfo,
        tag: "gfxinfo",
        category: CollectorCategory::Dumpsys,
        artifact: Some(artifacts::DUMPSYS_GFXINFO),
        description: "Rendering frame statistics for the workload package",
    },
    CollectorInfo {
        id: CollectorId::SurfaceFlinger,
        tag: "surfaceflinger",
        category: CollectorCategory::Dumpsys,
        artifact: Some(artifacts::DUMPSYS_SURFACEFLINGER),
        description: "Compositor statistics for the workload package",
    },
    CollectorInfo {
        id: CollectorId::Energy,
        tag: "energy",
        category: CollectorCategory::Energy,
        artifact: None,
        description: "Energy-meter sampling, when the environment provides a meter",
    },
];

impl CollectorId {
    /// All collector ids, in rendering order.
    pub const ALL: [CollectorId; 5] = [
        CollectorId::Ftrace,
        CollectorId::Systrace,
        CollectorId::Gfxinfo,
        CollectorId::SurfaceFlinger,
        CollectorId::Energy,
    ];
}

impl std::fmt::Display for CollectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(as_str(*self))
    }
}

/// Canonical tag.
///
/// ## Parameters
/// - `id`: Collector identifier.
///
/// ## Returns
/// - The tag matched inside collect specs for `id`.
pub fn as_str(id: CollectorId) -> &'static str {
    info_for(id).tag
}

/// Category.
pub fn category(id: CollectorId) -> CollectorCategory {
    info_for(id).category
}

/// Artifact file name produced by the collector, if any.
pub fn artifact(id: CollectorId) -> Option<&'static str> {
    info_for(id).artifact
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: CollectorId) -> &'static CollectorInfo {
    COLLECTORS.iter().find(|c| c.id == id).expect("collector info missing")
}

/// Lookup by exact tag.
///
/// ## Returns
/// - `Some(CollectorId)` if `s` is a canonical tag, `None` otherwise.
pub fn from_str(s: &str) -> Option<CollectorId> {
    COLLECTORS.iter().find(|c| c.tag == s).map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_follows_id_order() {
        let ids: Vec<CollectorId> = COLLECTORS.iter().map(|c| c.id).collect();
        assert_eq!(ids, CollectorId::ALL.to_vec());
    }

    #[test]
    fn test_trace_collectors() {
        let trace: Vec<CollectorId> = COLLECTORS
            .iter()
            .filter(|c| c.category == CollectorCategory::Trace)
            .map(|c| c.id)
            .collect();
        assert_eq!(trace, vec![CollectorId::Ftrace, CollectorId::Systrace]);
    }

    #[test]
    fn test_energy_has_no_artifact() {
        assert_eq!(artifact(CollectorId::Energy), None);
        assert_eq!(artifact(CollectorId::Gfxinfo), Some("dumpsys_gfxinfo.txt"));
    }
}
