//! File names of the artifacts a run leaves in its output directory.
//!
//! These names are a contract: report tooling locates run outputs by them, so they must not change.

/// Kernel trace captured by the ftrace backend.
pub const TRACE_DAT: &str = "trace.dat";

/// HTML report written by the system trace tool.
pub const TRACE_HTML: &str = "trace.html";

/// Raw `dumpsys gfxinfo` output for the workload package.
pub const DUMPSYS_GFXINFO: &str = "dumpsys_gfxinfo.txt";

/// Raw `dumpsys SurfaceFlinger` output for the workload package.
pub const DUMPSYS_SURFACEFLINGER: &str = "dumpsys_surfaceflinger.txt";

/// Platform description snapshot, written after every run.
pub const PLATFORM_JSON: &str = "platform.json";
