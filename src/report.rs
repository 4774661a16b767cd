use std::fmt::{self, Display, Formatter};


/// A recorded, non-fatal validation failure.
///
/// Soft failures do not stop validation: every divergence of a pass is recorded
/// and later reported together in a [`ValidationReport`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SoftFailure {
    /// The resource's existence disagrees with the definition.
    ///
    /// Property comparisons for the resource are skipped after this failure.
    Existence {
        /// Canonical name of the resource.
        resource: String,

        /// Whether the definition expected the resource to exist.
        expected_exists: bool,
    },

    /// A declared property differs from the real one.
    Property {
        /// Canonical name of the resource.
        resource: String,

        /// Human-readable name of the property.
        field: &'static str,

        /// The expected value, debug-formatted.
        expected: String,

        /// The real value, debug-formatted.
        actual: String,
    },

    /// The real object body hashes differently than the expected body.
    ContentHash {
        /// Canonical name of the object.
        resource: String,

        /// Hex digest of the expected body.
        expected: String,

        /// Hex digest of the real body.
        actual: String,
    },
}

impl SoftFailure {
    /// Canonical name of the resource the failure is attributed to.
    pub fn resource(&self) -> &str {
        match self {
            SoftFailure::Existence { resource, .. }
            | SoftFailure::Property { resource, .. }
            | SoftFailure::ContentHash { resource, .. } => resource,
        }
    }

    /// Name of the field that diverged.
    pub fn field(&self) -> &str {
        match self {
            SoftFailure::Existence { .. } => "existence",
            SoftFailure::Property { field, .. } => field,
            SoftFailure::ContentHash { .. } => "content hash",
        }
    }
}

impl Display for SoftFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SoftFailure::Existence {
                resource,
                expected_exists: true,
            } => write!(f, "{resource}: expected to exist, but does not"),
            SoftFailure::Existence {
                resource,
                expected_exists: false,
            } => write!(f, "{resource}: expected not to exist, but does"),
            SoftFailure::Property {
                resource,
                field,
                expected,
                actual,
            } => write!(
                f,
                "{resource}: {field} must match (expected {expected}, got {actual})"
            ),
            SoftFailure::ContentHash {
                resource,
                expected,
                actual,
            } => write!(
                f,
                "{resource}: bodies differ in hash (expected {expected}, got {actual})"
            ),
        }
    }
}



/// All soft failures recorded during one scenario.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ValidationReport {
    scenario: String,

    failures: Vec<SoftFailure>,
}

impl ValidationReport {
    /// Creates a report for `scenario` from its recorded failures.
    pub fn new<S>(scenario: S, failures: Vec<SoftFailure>) -> Self
    where
        S: Into<String>,
    {
        Self {
            scenario: scenario.into(),
            failures,
        }
    }

    /// Name of the scenario the report belongs to.
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// The recorded failures, in the order they were recorded.
    pub fn failures(&self) -> &[SoftFailure] {
        &self.failures
    }

    /// Whether no failure was recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures attributed to the resource with the given canonical name.
    pub fn failures_for<'r>(&'r self, resource: &'r str) -> impl Iterator<Item = &'r SoftFailure> {
        self.failures
            .iter()
            .filter(move |failure| failure.resource() == resource)
    }

    /// Returns `Ok(())` for a clean report, and the report itself as an error otherwise.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "scenario \"{}\" passed validation", self.scenario);
        }

        write!(
            f,
            "scenario \"{}\" failed validation with {} failure(s):",
            self.scenario,
            self.failures.len()
        )?;

        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
