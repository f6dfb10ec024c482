//! Built-in workload: launch an application and keep it in the foreground.

use std::thread;

use tracing::info;

use super::{RunContext, RunParams, Workload, WorkloadDescriptor};
use crate::error::Result;

/// Built-in variants as `(name, package)`.
pub const BUILTIN_WORKLOADS: &[(&str, &str)] = &[
    ("YouTube", "com.google.android.youtube"),
    ("Jankbench", "com.android.benchmark"),
    ("UiBench", "com.android.test.uibench"),
];

/// Cold-starts the package's launcher activity, lets it run for `params.duration`, then force-stops it.
///
/// Tracing covers the launch and the hold period.
pub struct AppLaunch {
    descriptor: WorkloadDescriptor,
}

impl AppLaunch {
    pub fn factory(descriptor: &WorkloadDescriptor) -> Box<dyn Workload> {
        Box::new(Self {
            descriptor: descriptor.clone(),
        })
    }
}

impl Workload for AppLaunch {
    fn descriptor(&self) -> &WorkloadDescriptor {
        &self.descriptor
    }

    fn run(&mut self, ctx: &mut RunContext<'_, '_>, params: &RunParams) -> Result<()> {
        let target = ctx.target();
        let package = ctx.package().to_string();

        // Cold start
        target.execute(&format!("am force-stop {package}"))?;

        ctx.tracing_start()?;
        let measured = (|| -> Result<()> {
            target.execute(&format!("monkey -p {package} -c android.intent.category.LAUNCHER 1"))?;
            info!(duration = ?params.duration, "{} launched", self.descriptor.name);
            thread::sleep(params.duration);
            Ok(())
        })();

        // Tracing is stopped and the package killed even when the launch failed; the first error wins.
        let stopped = ctx.tracing_stop();
        let killed = target.execute(&format!("am force-stop {package}")).map(|_| ());
        measured.and(stopped).and(killed)
    }
}

#[cfg(test)]
mod tests {
    use tracebench_core::CollectSpec;

    use super::*;
    use crate::error::HarnessError;
    use crate::lifecycle::LifecycleState;
    use crate::testing::{FakeBench, FakeKernelTracer, FakeTarget, scratch_dir};
    use crate::workload::WorkloadInstance;

    #[test]
    fn test_launch_sequence() {
        let bench = FakeBench::new(["com.android.benchmark"]);
        let env = bench.env();
        let descriptor = WorkloadDescriptor::new("Jankbench", "com.android.benchmark");
        let mut instance = WorkloadInstance::new(&env, AppLaunch::factory(&descriptor));

        instance
            .run(&scratch_dir("app_launch"), &CollectSpec::new(), &RunParams::default())
            .unwrap();

        assert_eq!(
            bench.target.commands(),
            vec![
                "am force-stop com.android.benchmark",
                "monkey -p com.android.benchmark -c android.intent.category.LAUNCHER 1",
                "am force-stop com.android.benchmark",
            ]
        );
    }

    #[test]
    fn test_failed_launch_still_stops_tracing() {
        let mut bench = FakeBench::new(["com.android.benchmark"]);
        bench.target = FakeTarget::new(["com.android.benchmark"])
            .with_log(bench.log.clone())
            .with_failure("monkey");
        let env = bench.env();
        let descriptor = WorkloadDescriptor::new("Jankbench", "com.android.benchmark");
        let mut instance = WorkloadInstance::new(&env, AppLaunch::factory(&descriptor));

        let err = instance
            .run(&scratch_dir("app_launch_fail"), &CollectSpec::parse("ftrace"), &RunParams::default())
            .unwrap_err();

        assert!(matches!(err, HarnessError::Device(_)));
        assert!(bench.log.contains("ftrace.stop"));
        assert_eq!(instance.state(), LifecycleState::Stopped);
        assert_eq!(
            bench.target.commands().last().map(String::as_str),
            Some("am force-stop com.android.benchmark")
        );
    }

    #[test]
    fn test_failed_stop_still_kills_package() {
        let mut bench = FakeBench::new(["com.android.benchmark"]);
        bench.ftrace = FakeKernelTracer::new(bench.log.clone()).failing_stop();
        let env = bench.env();
        let descriptor = WorkloadDescriptor::new("Jankbench", "com.android.benchmark");
        let mut instance = WorkloadInstance::new(&env, AppLaunch::factory(&descriptor));

        let err = instance
            .run(&scratch_dir("app_launch_stop_fail"), &CollectSpec::parse("ftrace"), &RunParams::default())
            .unwrap_err();

        assert!(matches!(err, HarnessError::Collector { .. }));
        assert_eq!(bench.target.commands().len(), 3);
        assert_eq!(
            bench.target.commands().last().map(String::as_str),
            Some("am force-stop com.android.benchmark")
        );
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let mut keys: Vec<String> = BUILTIN_WORKLOADS.iter().map(|(name, _)| name.to_lowercase()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), BUILTIN_WORKLOADS.len());
    }
}
