//! Workload registry
//!
//! Maps workload names to runnable instances, gated by what is installed on the target.
//!
//! Variants are registered explicitly ([`WorkloadRegistry::register`]). Discovery intersects the registered variants
//! with the target's installed packages and caches the result as an [`AvailabilitySet`]: enumerating packages is a
//! device round-trip, so the set is built once, lazily, and only rebuilt on an explicit
//! [`WorkloadRegistry::check_available`] or after [`WorkloadRegistry::invalidate`]. Packages installed or removed
//! in between are not seen.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::env::TestEnv;
use crate::error::{HarnessError, Result};
use crate::workload::{AppLaunch, BUILTIN_WORKLOADS, WorkloadDescriptor, WorkloadFactory, WorkloadInstance};

struct Registration {
    descriptor: WorkloadDescriptor,
    factory: WorkloadFactory,
}

/// Registered workloads whose package is installed on the target, keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilitySet {
    workloads: BTreeMap<String, WorkloadDescriptor>,
}

impl AvailabilitySet {
    pub fn get(&self, name: &str) -> Option<&WorkloadDescriptor> {
        self.workloads.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Lower-cased names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workloads.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &WorkloadDescriptor> {
        self.workloads.values()
    }

    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }
}

/// Explicit registry of workload variants.
#[derive(Default)]
pub struct WorkloadRegistry {
    variants: BTreeMap<String, Registration>,
    available: Option<AvailabilitySet>,
}

impl WorkloadRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in app-launch variants.
    pub fn with_builtin_workloads() -> Self {
        let mut registry = Self::new();
        for (name, package) in BUILTIN_WORKLOADS {
            registry
                .register(WorkloadDescriptor::new(*name, *package), AppLaunch::factory)
                .expect("INVARIANT: built-in workload names are unique");
        }
        registry
    }

    /// Register a variant.
    ///
    /// ## Errors
    ///
    /// `DuplicateWorkload` if a variant with the same name, ignoring case, is already registered.
    pub fn register(&mut self, descriptor: WorkloadDescriptor, factory: WorkloadFactory) -> Result<()> {
        let key = descriptor.key();
        if self.variants.contains_key(&key) {
            return Err(HarnessError::DuplicateWorkload { name: descriptor.name });
        }
        debug!(workload = %descriptor.name, package = %descriptor.package, "registered workload");
        self.variants.insert(key, Registration { descriptor, factory });
        // A new variant may already be installed.
        self.available = None;
        Ok(())
    }

    /// Every registered descriptor, sorted by key.
    pub fn registered(&self) -> impl Iterator<Item = &WorkloadDescriptor> {
        self.variants.values().map(|r| &r.descriptor)
    }

    /// Query the target's packages and rebuild the availability set.
    #[tracing::instrument(skip_all)]
    pub fn check_available(&mut self, env: &TestEnv) -> Result<&AvailabilitySet> {
        let packages = env.target().list_packages()?;
        debug!("Packages:\n{:?}", packages);

        debug!("Building list of available workloads...");
        let mut workloads = BTreeMap::new();
        for (key, registration) in &self.variants {
            debug!("Checking workload [{}]...", registration.descriptor.name);
            if packages.contains(&registration.descriptor.package) {
                workloads.insert(key.clone(), registration.descriptor.clone());
            }
        }
        let available = AvailabilitySet { workloads };

        info!("Supported workloads available on target:");
        info!("  {}", available.names().collect::<Vec<_>>().join(", "));

        Ok(self.available.insert(available))
    }

    /// The availability set, building it on first use.
    pub fn available(&mut self, env: &TestEnv) -> Result<&AvailabilitySet> {
        if self.available.is_none() {
            return self.check_available(env);
        }
        Ok(self.available.get_or_insert_with(AvailabilitySet::default))
    }

    /// The cached availability set, if discovery has run.
    pub fn cached(&self) -> Option<&AvailabilitySet> {
        self.available.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.available.is_some()
    }

    /// Forget the availability set; the next resolve queries the target again.
    pub fn invalidate(&mut self) {
        self.available = None;
    }

    /// Resolve `name` (any case) to a fresh instance bound to `env`.
    ///
    /// ## Errors
    ///
    /// `NotAvailable` if no registered variant of that name has its package installed.
    pub fn get_instance<'env>(&mut self, env: &'env TestEnv, name: &str) -> Result<WorkloadInstance<'env>> {
        let key = name.to_lowercase();
        if !self.available(env)?.contains(&key) {
            return Err(HarnessError::NotAvailable { name: name.to_string() });
        }
        let Some(registration) = self.variants.get(&key) else {
            return Err(HarnessError::NotAvailable { name: name.to_string() });
        };
        Ok(WorkloadInstance::new(env, (registration.factory)(&registration.descriptor)))
    }
}
