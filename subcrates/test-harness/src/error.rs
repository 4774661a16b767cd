use resource_harness::{
    error::{BackendError, ConfigError, HarnessError},
    report::ValidationReport,
};
use thiserror::Error;

/// Main `Error` for use in unit and integration tests.
///
/// Implements `From` for:
/// - [`std::io::Error`],
/// - [`HarnessError`] and [`BackendError`],
/// - [`ConfigError`], and
/// - [`ValidationReport`] (so `report.into_result()?` fails a test with every soft failure listed).
#[derive(Error, Debug)]
pub enum TestError {
    #[error("std::io::Error")]
    IoError(
        #[from]
        #[source]
        std::io::Error,
    ),

    #[error("harness error")]
    HarnessError(
        #[from]
        #[source]
        HarnessError,
    ),

    #[error("back-end error")]
    BackendError(
        #[from]
        #[source]
        BackendError,
    ),

    #[error("configuration error")]
    ConfigError(
        #[from]
        #[source]
        ConfigError,
    ),

    #[error("{0}")]
    Validation(#[from] ValidationReport),
}

/// A main `Result` type for use in unit and integration tests (shorthand for the [`TestError`] error).
pub type TestResult<O = ()> = std::result::Result<O, TestError>;
