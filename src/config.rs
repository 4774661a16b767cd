use std::{
    env::{self, VarError},
    path::PathBuf,
};

use crate::error::ConfigError;


/// Execution options for a test scenario.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct HarnessConfig {
    /// Whether the scenario is a dry run.
    ///
    /// In a dry run, root resources resolve to stateless mock managers
    /// and validation returns right after checking its preconditions.
    ///
    /// Defaults to `false`.
    pub dry_run: bool,

    /// Directory under which the local back-end's service root lives.
    ///
    /// Defaults to `None`, meaning the system temporary directory.
    pub local_root: Option<PathBuf>,
}

impl HarnessConfig {
    /// Environment variable read by [`HarnessConfig::from_env`] for [`HarnessConfig::dry_run`].
    pub const DRY_RUN_VARIABLE: &'static str = "RESOURCE_HARNESS_DRY_RUN";

    /// Environment variable read by [`HarnessConfig::from_env`] for [`HarnessConfig::local_root`].
    pub const LOCAL_ROOT_VARIABLE: &'static str = "RESOURCE_HARNESS_LOCAL_ROOT";

    /// Builds a configuration from the process environment.
    ///
    /// Unset or empty variables keep their default value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = read_variable(Self::DRY_RUN_VARIABLE)? {
            config.dry_run = parse_boolean(Self::DRY_RUN_VARIABLE, &value)?;
        }

        if let Some(value) = read_variable(Self::LOCAL_ROOT_VARIABLE)? {
            config.local_root = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    /// Returns the directory the local back-end should place its service root in.
    pub fn local_root_or_temp(&self) -> PathBuf {
        self.local_root.clone().unwrap_or_else(env::temp_dir)
    }
}


fn read_variable(variable: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(variable) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { variable }),
    }
}

fn parse_boolean(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            variable,
            value: value.to_string(),
        }),
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_boolean_spellings() {
        assert!(parse_boolean("X", "TRUE").unwrap());
        assert!(parse_boolean("X", " yes ").unwrap());
        assert!(!parse_boolean("X", "off").unwrap());
        assert!(!parse_boolean("X", "0").unwrap());
    }

    #[test]
    fn rejects_unknown_boolean() {
        let error = parse_boolean("X", "maybe").unwrap_err();

        assert!(matches!(
            error,
            ConfigError::InvalidBoolean { variable: "X", ref value } if value == "maybe"
        ));
    }

    #[test]
    fn default_is_a_wet_run_in_the_temporary_directory() {
        let config = HarnessConfig::default();

        assert!(!config.dry_run);
        assert_eq!(config.local_root_or_temp(), env::temp_dir());
    }
}
