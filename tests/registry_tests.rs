//! Integration tests for workload discovery and resolution

use proptest::prelude::*;
use tracebench::testing::FakeBench;
use tracebench::workload::BUILTIN_WORKLOADS;
use tracebench::{HarnessError, WorkloadRegistry};

#[test]
fn test_target_queried_once_across_resolves() {
    let bench = FakeBench::new(["com.google.android.youtube", "com.android.benchmark"]);
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    for name in ["YouTube", "youtube", "JANKBENCH", "jankbench", "YouTube"] {
        registry.get_instance(&env, name).unwrap();
    }
    assert_eq!(bench.target.package_queries(), 1);
}

#[test]
fn test_instances_are_fresh() {
    let bench = FakeBench::new(["com.google.android.youtube"]);
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    let first = registry.get_instance(&env, "youtube").unwrap();
    let second = registry.get_instance(&env, "YouTube").unwrap();
    assert_eq!(first.descriptor(), second.descriptor());
    assert!(first.results().trace_file.is_none());
    assert!(second.results().platform_file.is_none());
}

#[test]
fn test_missing_package_is_not_available_in_any_case() {
    let bench = FakeBench::new(["com.google.android.youtube"]);
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    for name in ["UiBench", "uibench", "UIBENCH"] {
        let err = registry.get_instance(&env, name).err().unwrap();
        assert!(matches!(err, HarnessError::NotAvailable { .. }));
        assert_eq!(err.to_string(), format!("Workload [{name}] not available on target"));
    }
}

#[test]
fn test_unregistered_name_is_not_available() {
    let bench = FakeBench::new(["com.google.android.youtube"]);
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    let err = registry.get_instance(&env, "Spotify").err().unwrap();
    assert_eq!(err.to_string(), "Workload [Spotify] not available on target");
}

#[test]
fn test_discovery_failure_propagates_and_leaves_registry_uninitialized() {
    let bench = FakeBench::new(["com.google.android.youtube"]);
    bench.target.fail_package_queries();
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    let err = registry.get_instance(&env, "youtube").err().unwrap();
    assert!(matches!(err, HarnessError::Device(_)));
    assert!(!registry.is_initialized());
}

#[test]
fn test_invalidate_requeries_target() {
    let bench = FakeBench::new(["com.android.benchmark"]);
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    registry.get_instance(&env, "jankbench").unwrap();
    registry.invalidate();
    assert!(!registry.is_initialized());
    registry.get_instance(&env, "jankbench").unwrap();
    assert_eq!(bench.target.package_queries(), 2);
}

#[test]
fn test_no_installed_packages_gives_empty_set() {
    let bench = FakeBench::new(Vec::<String>::new());
    let env = bench.env();
    let mut registry = WorkloadRegistry::with_builtin_workloads();

    assert!(registry.check_available(&env).unwrap().is_empty());
    assert!(registry.is_initialized());
}

proptest! {
    /// The availability set is exactly the registered variants whose package is installed.
    #[test]
    fn availability_is_registered_intersect_installed(
        mask in prop::collection::vec(any::<bool>(), BUILTIN_WORKLOADS.len()),
        extra in prop::collection::vec("com\\.[a-z]{1,8}\\.[a-z]{1,8}", 0..4),
    ) {
        let installed: Vec<String> = BUILTIN_WORKLOADS
            .iter()
            .zip(&mask)
            .filter(|(_, on)| **on)
            .map(|((_, package), _)| package.to_string())
            .chain(extra)
            .collect();
        let bench = FakeBench::new(installed.clone());
        let env = bench.env();
        let mut registry = WorkloadRegistry::with_builtin_workloads();
        let available = registry.check_available(&env).unwrap().clone();

        for (name, package) in BUILTIN_WORKLOADS {
            prop_assert_eq!(available.contains(name), installed.iter().any(|p| p == package));
        }
        prop_assert_eq!(available.len(), mask.iter().filter(|on| **on).count());
    }
}
