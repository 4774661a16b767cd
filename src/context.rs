use log::{debug, warn};

use crate::{
    config::HarnessConfig,
    error::HarnessError,
    manager::ManagerHandle,
    report::{SoftFailure, ValidationReport},
};


/// A source of unique resource names.
///
/// Used whenever a definition is wrapped in an adoptive parent
/// and the wrapped resource has no name of its own.
pub trait NameSource: Send {
    /// Returns a name that was not returned before.
    fn next_name(&mut self) -> String;
}


/// Generates random (v4) UUIDs. This is the default [`NameSource`].
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidNameSource;

impl NameSource for UuidNameSource {
    fn next_name(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}


/// Generates `prefix-0`, `prefix-1`, ... in order.
#[derive(Clone, Debug)]
pub struct SequentialNameSource {
    prefix: String,

    next_index: u64,
}

impl SequentialNameSource {
    /// Creates a source whose first name is `{prefix}-0`.
    pub fn new<S>(prefix: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            prefix: prefix.into(),
            next_index: 0,
        }
    }
}

impl NameSource for SequentialNameSource {
    fn next_name(&mut self) -> String {
        let name = format!("{}-{}", self.prefix, self.next_index);
        self.next_index += 1;

        name
    }
}



/// State threaded through every create and validate call of one scenario.
///
/// Owns the execution configuration, the injected name source,
/// the soft failures recorded so far and the resources created so far.
pub struct ScenarioContext {
    name: String,

    config: HarnessConfig,

    name_source: Box<dyn NameSource>,

    failures: Vec<SoftFailure>,

    created_resources: Vec<ManagerHandle>,
}

impl ScenarioContext {
    /// Creates a context for the scenario `name`, generating names with [`UuidNameSource`].
    pub fn new<S>(name: S, config: HarnessConfig) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            config,
            name_source: Box::new(UuidNameSource),
            failures: Vec::new(),
            created_resources: Vec::new(),
        }
    }

    /// Replaces the name source (e.g. with a [`SequentialNameSource`] for deterministic names).
    pub fn with_name_source<N>(mut self, name_source: N) -> Self
    where
        N: NameSource + 'static,
    {
        self.name_source = Box::new(name_source);
        self
    }

    /// Name of the scenario.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The execution configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Whether this scenario is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Returns a fresh unique name from the injected name source.
    pub fn generate_name(&mut self) -> String {
        self.name_source.next_name()
    }

    /// Records a soft failure. Validation continues afterwards.
    pub fn record_failure(&mut self, failure: SoftFailure) {
        warn!("[{}] {}", self.name, failure);
        self.failures.push(failure);
    }

    /// Soft failures recorded so far.
    pub fn failures(&self) -> &[SoftFailure] {
        &self.failures
    }

    /// Whether any soft failure was recorded.
    pub fn has_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns a report of the failures recorded so far, leaving them in place.
    pub fn report(&self) -> ValidationReport {
        ValidationReport::new(self.name.clone(), self.failures.clone())
    }

    /// Consumes the context and returns the report of all recorded failures.
    pub fn into_report(self) -> ValidationReport {
        ValidationReport::new(self.name, self.failures)
    }

    /// Remembers a resource created during this scenario so [`Self::cleanup`] can remove it.
    pub fn track_created(&mut self, resource: ManagerHandle) {
        self.created_resources.push(resource);
    }

    /// Resources created during this scenario, in creation order.
    pub fn created_resources(&self) -> &[ManagerHandle] {
        &self.created_resources
    }

    /// Deletes every tracked resource, most recently created first.
    ///
    /// Resources that no longer exist are skipped by the back-ends.
    /// Tracking is cleared even if a deletion fails.
    pub fn cleanup(&mut self) -> Result<(), HarnessError> {
        let resources = std::mem::take(&mut self.created_resources);

        for resource in resources.iter().rev() {
            debug!("[{}] deleting {}", self.name, resource.canonical_name());

            resource
                .delete()
                .map_err(|error| HarnessError::backend("delete", resource.canonical_name(), error))?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("failures", &self.failures)
            .field("created_resources", &self.created_resources.len())
            .finish_non_exhaustive()
    }
}
