//! Model which collectors a run selects.
//!
//! A collect spec arrives as a free-form string (`"ftrace,gfxinfo"`, `"systrace_30 energy"`, ...). Matching is a
//! **case-sensitive substring test** per tag, not a tokenizer: the delimiter does not matter and persisted specs
//! written for older harness versions keep their meaning. Once parsed, the spec is a typed set of [`CollectorId`]s
//! plus the optional systrace capture time.
//!
//! ## Examples
//! ```rust
//! use tracebench_core::{CollectSpec, CollectorId};
//!
//! let spec = CollectSpec::parse("systrace_5000;gfxinfo");
//! assert!(spec.contains(CollectorId::Systrace));
//! assert!(spec.contains(CollectorId::Gfxinfo));
//! assert_eq!(spec.systrace_time(), Some(5000));
//! assert_eq!(spec.to_string(), "systrace_5000,gfxinfo");
//! ```

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::collectors::{self, CollectorId};

const SYSTRACE_TIME_PREFIX: &str = "systrace_";

/// Set of selected collectors for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSpec {
    selected: BTreeSet<CollectorId>,
    systrace_time: Option<u64>,
}

impl CollectSpec {
    /// An empty spec: no collectors selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a free-form collect string.
    ///
    /// ## Notes
    /// - A collector is selected when its tag occurs anywhere in `spec`.
    /// - The systrace time is taken from the first `systrace_<digits>` occurrence. A digit run too large for `u64` is
    ///   ignored, leaving the capture unbounded.
    pub fn parse(spec: &str) -> Self {
        let selected = CollectorId::ALL
            .iter()
            .copied()
            .filter(|id| spec.contains(collectors::as_str(*id)))
            .collect();

        Self {
            selected,
            systrace_time: extract_systrace_time(spec),
        }
    }

    /// Add a collector to the spec.
    pub fn with(mut self, id: CollectorId) -> Self {
        self.selected.insert(id);
        self
    }

    /// Select systrace with a bounded capture time (seconds).
    pub fn with_systrace_time(mut self, secs: u64) -> Self {
        self.selected.insert(CollectorId::Systrace);
        self.systrace_time = Some(secs);
        self
    }

    pub fn contains(&self, id: CollectorId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected collectors in [`CollectorId`] order.
    pub fn iter(&self) -> impl Iterator<Item = CollectorId> + '_ {
        self.selected.iter().copied()
    }

    /// Capture time requested through `systrace_<secs>`, if any.
    pub fn systrace_time(&self) -> Option<u64> {
        self.systrace_time
    }

    /// Whether both trace backends are selected.
    pub fn has_trace_conflict(&self) -> bool {
        self.contains(CollectorId::Ftrace) && self.contains(CollectorId::Systrace)
    }

    /// The trace backend the run uses; ftrace takes precedence over systrace.
    pub fn trace_backend(&self) -> Option<CollectorId> {
        if self.contains(CollectorId::Ftrace) {
            Some(CollectorId::Ftrace)
        } else if self.contains(CollectorId::Systrace) {
            Some(CollectorId::Systrace)
        } else {
            None
        }
    }
}

impl FromStr for CollectSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for CollectSpec {
    /// Canonical comma-separated form; parses back to an equal spec.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            match (id, self.systrace_time) {
                (CollectorId::Systrace, Some(secs)) => write!(f, "{}{}", SYSTRACE_TIME_PREFIX, secs)?,
                _ => f.write_str(collectors::as_str(id))?,
            }
        }
        Ok(())
    }
}

/// Find the first `systrace_<digits>` and return its value.
fn extract_systrace_time(spec: &str) -> Option<u64> {
    spec.match_indices(SYSTRACE_TIME_PREFIX).find_map(|(start, prefix)| {
        let rest = &spec[start + prefix.len()..];
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            return None;
        }
        Some(rest[..digits_len].parse::<u64>().ok())
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spec_selects_nothing() {
        let spec = CollectSpec::parse("");
        assert!(spec.is_empty());
        assert_eq!(spec.trace_backend(), None);
        assert_eq!(spec.to_string(), "");
    }

    #[test]
    fn test_substring_matching_ignores_delimiters() {
        let spec = CollectSpec::parse("gfxinfo+surfaceflinger energy");
        assert!(spec.contains(CollectorId::Gfxinfo));
        assert!(spec.contains(CollectorId::SurfaceFlinger));
        assert!(spec.contains(CollectorId::Energy));
        assert!(!spec.contains(CollectorId::Ftrace));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(CollectSpec::parse("FTRACE,GfxInfo").is_empty());
    }

    #[test]
    fn test_systrace_does_not_imply_ftrace() {
        let spec = CollectSpec::parse("systrace");
        assert!(spec.contains(CollectorId::Systrace));
        assert!(!spec.contains(CollectorId::Ftrace));
        assert_eq!(spec.systrace_time(), None);
    }

    #[test]
    fn test_systrace_time_extracted() {
        let spec = CollectSpec::parse("systrace_5000");
        assert_eq!(spec.systrace_time(), Some(5000));
        assert_eq!(spec.trace_backend(), Some(CollectorId::Systrace));
    }

    #[test]
    fn test_systrace_time_requires_digits() {
        assert_eq!(CollectSpec::parse("systrace_,gfxinfo").systrace_time(), None);
        assert_eq!(CollectSpec::parse("systrace_abc").systrace_time(), None);
    }

    #[test]
    fn test_systrace_time_skips_empty_occurrence() {
        assert_eq!(CollectSpec::parse("systrace_ systrace_12").systrace_time(), Some(12));
    }

    #[test]
    fn test_systrace_time_overflow_is_unbounded() {
        let spec = CollectSpec::parse("systrace_99999999999999999999999");
        assert!(spec.contains(CollectorId::Systrace));
        assert_eq!(spec.systrace_time(), None);
    }

    #[test]
    fn test_trace_conflict() {
        let spec = CollectSpec::parse("ftrace,systrace");
        assert!(spec.has_trace_conflict());
        assert_eq!(spec.trace_backend(), Some(CollectorId::Ftrace));
        assert!(!CollectSpec::parse("ftrace").has_trace_conflict());
    }

    #[test]
    fn test_display_is_canonical() {
        let spec = CollectSpec::parse("energy gfxinfo ftrace");
        assert_eq!(spec.to_string(), "ftrace,gfxinfo,energy");

        let spec = CollectSpec::new().with(CollectorId::Gfxinfo).with_systrace_time(30);
        assert_eq!(spec.to_string(), "systrace_30,gfxinfo");
    }

    #[test]
    fn test_from_str() {
        let spec: CollectSpec = "surfaceflinger".parse().unwrap();
        assert_eq!(spec, CollectSpec::new().with(CollectorId::SurfaceFlinger));
    }
}
