//! Snapshot tests for CLI output
//!
//! These tests render command output from fixed inputs and compare it against stored snapshots.
//! Run with: `cargo test --test cli_output_snapshots`
//! Review changes: `cargo insta review`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracebench::cli::commands::{render_collectors, render_run_summary, render_workloads};
use tracebench::collectors::{DumpsysReport, EnergyReport};
use tracebench::testing::{FAKE_GFXINFO, FAKE_SURFACEFLINGER, FakeBench};
use tracebench::{CollectSpec, CollectorId, RunResults, WorkloadDescriptor, WorkloadRegistry};

#[test]
fn test_collectors_listing() {
    insta::assert_snapshot!("collectors_listing", render_collectors());
}

#[test]
fn test_workload_listing() {
    let bench = FakeBench::new(["com.google.android.youtube", "com.android.benchmark", "com.example.unrelated"]);
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();
    let available = registry.check_available(&env).unwrap().clone();

    insta::assert_snapshot!("workload_listing", render_workloads(registry.registered(), &available));
}

#[test]
fn test_run_summary_full() {
    let out_dir = Path::new("/data/runs/youtube");
    let results = RunResults {
        trace_file: Some(out_dir.join("trace.dat")),
        nrg_report: Some(EnergyReport {
            channels: BTreeMap::from([("big".to_string(), 3.5), ("little".to_string(), 1.25)]),
            report_file: None,
        }),
        gfxinfo: Some(DumpsysReport::from_text(
            CollectorId::Gfxinfo,
            &out_dir.join("dumpsys_gfxinfo.txt"),
            FAKE_GFXINFO,
        )),
        surfaceflinger: Some(DumpsysReport::from_text(
            CollectorId::SurfaceFlinger,
            &out_dir.join("dumpsys_surfaceflinger.txt"),
            FAKE_SURFACEFLINGER,
        )),
        platform_file: Some(PathBuf::from("/data/runs/youtube/platform.json")),
    };
    let descriptor = WorkloadDescriptor::new("YouTube", "com.google.android.youtube");
    let collect = CollectSpec::parse("energy,surfaceflinger,gfxinfo,ftrace");

    insta::assert_snapshot!("run_summary_full", render_run_summary(&descriptor, &collect, &results));
}

#[test]
fn test_run_summary_nothing_collected() {
    let results = RunResults {
        platform_file: Some(PathBuf::from("/data/runs/uibench/platform.json")),
        ..RunResults::default()
    };
    let descriptor = WorkloadDescriptor::new("UiBench", "com.android.test.uibench");

    insta::assert_snapshot!(
        "run_summary_nothing_collected",
        render_run_summary(&descriptor, &CollectSpec::new(), &results)
    );
}
