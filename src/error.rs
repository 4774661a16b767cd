//! Error types.
//!
//! Fatal conditions (precondition violations and back-end failures) are
//! returned as [`HarnessError`] and unwind the current create or validate call.
//! Soft failures are not errors: they are recorded on the
//! [`ScenarioContext`][crate::context::ScenarioContext] and reported
//! together as a [`ValidationReport`][crate::report::ValidationReport].

use std::path::PathBuf;

use thiserror::Error;

use crate::level::{Level, Location};


/// An error returned by a storage back-end collaborator.
#[derive(Error, Debug)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum BackendError {
    /// The resource (or a resource it requires, such as its container) does not exist.
    #[error("resource does not exist: {resource}")]
    NotFound {
        /// Canonical name of the missing resource.
        resource: String,
    },

    /// The back-end cannot perform this operation at all.
    #[error("operation \"{operation}\" is not supported by the {location} back-end")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,

        /// The back-end that refused the operation.
        location: Location,
    },

    /// The account does not expose the requested service.
    #[error("\"{service}\" is not a valid service for account \"{account}\"")]
    ServiceUnavailable {
        /// Name of the account.
        account: String,

        /// Requested service location.
        service: Location,
    },

    /// An underlying IO operation failed.
    ///
    /// The inner [`std::io::Error`] will likely describe the real cause of this error.
    #[error("IO error on path: {}", .path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,

        /// Underlying IO error.
        #[source]
        error: std::io::Error,
    },
}



/// A fatal error that aborts the current create or validate call.
#[derive(Error, Debug)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum HarnessError {
    /// A manager was used at a level other than the one required.
    ///
    /// This indicates a mismatched definition and manager,
    /// i.e. a bug in the test, not in the environment.
    #[error("expected a manager at the {expected} level, got one at the {actual} level")]
    LevelMismatch {
        /// Level the operation required.
        expected: Level,

        /// Level of the manager that was provided.
        actual: Level,
    },

    /// The base manager given to creation is deeper than the definition it should create.
    #[error(
        "base manager at the {manager} level is deeper than the definition target ({definition} level)"
    )]
    ManagerDeeperThanDefinition {
        /// Level of the base manager.
        manager: Level,

        /// Target level of the definition.
        definition: Level,
    },

    /// An adoptive parent was requested for a service-level definition.
    #[error("a {level}-level definition has no adoptive parent")]
    NoAdoptiveParent {
        /// Level of the definition.
        level: Level,
    },

    /// An adoptive child (or a child manager) was requested below the object level.
    #[error("a {level}-level resource has no child level")]
    NoAdoptiveChild {
        /// Level of the definition or manager.
        level: Level,
    },

    /// An adoptive child was requested for a definition that does not have exactly one child.
    #[error(
        "adoptive child matching requires exactly one child in the {level}-level definition, found {candidates}"
    )]
    AmbiguousAdoptiveChild {
        /// Level of the definition.
        level: Level,

        /// Number of child candidates that were found.
        candidates: usize,
    },

    /// A level callback received a definition whose shape does not match its level.
    #[error("expected a {expected}-level definition, got a {actual}-level definition")]
    UnexpectedDefinitionShape {
        /// Level the callback handles.
        expected: Level,

        /// Level of the definition it was given.
        actual: Level,
    },

    /// No registered account offers the requested service.
    #[error("no registered account offers the {location} service")]
    NoAccountForLocation {
        /// The requested service location.
        location: Location,
    },

    /// A back-end operation failed. No retries are performed at this layer.
    #[error("back-end operation \"{operation}\" failed on {resource}")]
    Backend {
        /// Name of the failed operation.
        operation: &'static str,

        /// Canonical name of the resource the operation was performed on.
        resource: String,

        /// Underlying back-end error.
        #[source]
        error: BackendError,
    },

    /// Object content could not be read while hashing it.
    #[error("unable to read object content of {resource}")]
    ContentRead {
        /// Canonical name of the resource whose content was being read.
        resource: String,

        /// Underlying IO error.
        #[source]
        error: std::io::Error,
    },
}

impl HarnessError {
    pub(crate) fn backend<S>(operation: &'static str, resource: S, error: BackendError) -> Self
    where
        S: Into<String>,
    {
        Self::Backend {
            operation,
            resource: resource.into(),
            error,
        }
    }
}



/// An error that can occur when reading [`HarnessConfig`][crate::config::HarnessConfig]
/// from the environment.
#[derive(Error, Debug)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum ConfigError {
    /// An environment variable holds a value that is not a recognised boolean.
    #[error("environment variable {variable} is not a boolean: \"{value}\"")]
    InvalidBoolean {
        /// Name of the environment variable.
        variable: &'static str,

        /// The unparseable value.
        value: String,
    },

    /// An environment variable is not valid unicode.
    #[error("environment variable {variable} is not valid unicode")]
    NotUnicode {
        /// Name of the environment variable.
        variable: &'static str,
    },
}



/// An error that can occur when parsing a human-readable size such as `"10K"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "miette", derive(miette::Diagnostic))]
pub enum SizeParseError {
    /// The numeric part is missing or not a number.
    #[error("invalid size number in \"{input}\"")]
    InvalidNumber {
        /// The input that was parsed.
        input: String,
    },

    /// The unit suffix is not recognised.
    #[error("unknown size unit \"{unit}\"")]
    UnknownUnit {
        /// The unrecognised suffix.
        unit: String,
    },

    /// The size does not fit into 64 bits.
    #[error("size \"{input}\" overflows")]
    Overflow {
        /// The input that was parsed.
        input: String,
    },
}
