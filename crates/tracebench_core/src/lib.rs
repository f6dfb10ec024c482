//! Provide the shared, pure vocabulary of the tracebench harness.
//!
//! This crate is intentionally small and dependency-free. It contains the pieces that both the harness library and
//! any tooling around it (CLI, report post-processing) must agree on:
//! - the collector registry ([`collectors`]): stable ids, canonical tags, artifact names,
//! - the collect-spec model ([`collect_spec`]): which collectors a run selects, parsed from the free-form tag string,
//! - the artifact file names ([`artifacts`]) that downstream tooling depends on.
//!
//! ## Notes
//!
//! - **No IO** and no global state. Anything that touches a device or the filesystem lives in the `tracebench` crate.

pub mod artifacts;
pub mod collect_spec;
pub mod collectors;

pub use collect_spec::CollectSpec;
pub use collectors::{CollectorCategory, CollectorId, CollectorInfo};
