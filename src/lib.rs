#![forbid(unsafe_code)]
//! tracebench: run workloads on an instrumented device and collect telemetry around them
//!
//! The crate has two cores:
//!
//! - the [`registry`], which decides which workload variants are runnable on a target (their package is installed)
//!   and resolves a name to a fresh [`WorkloadInstance`];
//! - the [`lifecycle`] coordinator, which starts and stops the collectors a run selected (frame statistics,
//!   compositor statistics, ftrace, systrace, energy) in a fixed order and stores their results on the instance.
//!
//! Devices and collectors are reached through traits ([`device::Target`], [`collectors`]); `adb`-backed defaults are
//! provided, and [`testing`] has recording fakes for all of them.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` with `?` / `map_err`. The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests and in the [`testing`] fakes.
//! - **True invariants**: use `.expect("INVARIANT: reason")`.

pub mod cli;
pub mod collectors;
pub mod config;
pub mod device;
pub mod env;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod testing;
pub mod version;
pub mod workload;

pub use tracebench_core::{CollectSpec, CollectorId, artifacts};

pub use config::HarnessConfig;
pub use env::TestEnv;
pub use error::{HarnessError, Result};
pub use lifecycle::{LifecycleState, RunResults, TraceCoordinator};
pub use registry::{AvailabilitySet, WorkloadRegistry};
pub use workload::{RunContext, RunParams, Workload, WorkloadDescriptor, WorkloadInstance};
