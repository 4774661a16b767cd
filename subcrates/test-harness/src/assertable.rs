use resource_harness::{
    context::ScenarioContext,
    report::{SoftFailure, ValidationReport},
};


/// Assertions over the soft failures recorded during a scenario.
pub trait AssertableScenario {
    fn soft_failures(&self) -> &[SoftFailure];

    /// Asserts that no soft failure was recorded.
    #[track_caller]
    fn assert_no_failures(&self) {
        let failures = self.soft_failures();

        assert!(
            failures.is_empty(),
            "expected no soft failures, got {}:\n{}",
            failures.len(),
            format_failures(failures)
        );
    }

    /// Asserts that exactly `expected_count` soft failures were recorded.
    #[track_caller]
    fn assert_failure_count(&self, expected_count: usize) {
        let failures = self.soft_failures();

        assert_eq!(
            failures.len(),
            expected_count,
            "unexpected number of soft failures:\n{}",
            format_failures(failures)
        );
    }

    /// Asserts that exactly `expected_count` soft failures are attributed to `resource`.
    #[track_caller]
    fn assert_failures_for(&self, resource: &str, expected_count: usize) {
        let failures = self.soft_failures();

        let count = failures
            .iter()
            .filter(|failure| failure.resource() == resource)
            .count();

        assert_eq!(
            count,
            expected_count,
            "unexpected number of soft failures for {resource}:\n{}",
            format_failures(failures)
        );
    }
}

fn format_failures(failures: &[SoftFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {failure}"))
        .collect::<Vec<_>>()
        .join("\n")
}


impl AssertableScenario for ScenarioContext {
    fn soft_failures(&self) -> &[SoftFailure] {
        self.failures()
    }
}

impl AssertableScenario for ValidationReport {
    fn soft_failures(&self) -> &[SoftFailure] {
        self.failures()
    }
}
