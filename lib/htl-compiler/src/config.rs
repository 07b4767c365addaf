//! Compiler configuration.

use std::path::Path;

use figment::providers::{Env, Format as _, Serialized, Yaml};
use figment::{error::Kind, Figment};
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use tracing::debug;

const fn default_read_buffer_size() -> usize {
    8192
}

const fn default_check_scopes() -> bool {
    true
}

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Requested field's data type was not the expected data type.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Name of the invalid field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// A field holds a value outside of its valid range.
    #[snafu(display("Invalid value for field '{}': {}", field, reason))]
    InvalidValue {
        /// Name of the invalid field.
        field: &'static str,

        /// Description of the problem.
        reason: &'static str,
    },

    /// Generic configuration error.
    #[snafu(display("Failed to load configuration: {}", source))]
    Generic {
        /// Error source.
        source: figment::Error,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        match e.kind {
            Kind::InvalidType(actual_ty, expected_ty) => Self::InvalidFieldType {
                field: e.path.join("."),
                expected_ty,
                actual_ty: actual_ty.to_string(),
            },
            _ => Self::Generic { source: e },
        }
    }
}

/// Compiler configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CompilerConfiguration {
    /// Additional expression option names to accept without warning.
    ///
    /// Runtime extensions may understand options the compiler does not know about.
    #[serde(default)]
    pub known_expression_options: Vec<String>,

    /// Size, in characters, of the chunks the markup parser reads the template in.
    ///
    /// Defaults to 8192.
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Whether to check that every scope opened in the command stream is closed in order.
    ///
    /// Defaults to `true`.
    #[serde(default = "default_check_scopes")]
    pub check_scopes: bool,
}

impl Default for CompilerConfiguration {
    fn default() -> Self {
        Self {
            known_expression_options: Vec::new(),
            read_buffer_size: default_read_buffer_size(),
            check_scopes: default_check_scopes(),
        }
    }
}

impl CompilerConfiguration {
    fn validate(self) -> Result<Self, ConfigurationError> {
        if self.read_buffer_size == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "read_buffer_size",
                reason: "must be greater than zero",
            });
        }
        Ok(self)
    }
}

/// A configuration loader that can pull from various sources.
///
/// Sources added later take precedence over sources added earlier. The defaults of [`CompilerConfiguration`] are
/// always the lowest-priority source.
///
/// # Supported sources
///
/// - YAML file
/// - YAML string
/// - environment variables (must be prefixed; see [`from_environment`][Self::from_environment])
pub struct ConfigurationLoader {
    figment: Figment,
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(CompilerConfiguration::default())),
        }
    }
}

impl ConfigurationLoader {
    /// Loads the given YAML configuration file.
    ///
    /// # Errors
    ///
    /// If the file does not exist, an error will be returned. Invalid YAML is reported when the configuration is
    /// extracted.
    pub fn from_yaml<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigurationError::Generic {
                source: figment::Error::from(format!("configuration file '{}' does not exist", path.display())),
            });
        }
        debug!(file_path = %path.display(), "Loading YAML configuration file.");
        self.figment = self.figment.admerge(Yaml::file(path));
        Ok(self)
    }

    /// Loads configuration from a YAML document held in memory.
    pub fn from_yaml_str(mut self, yaml: &str) -> Self {
        self.figment = self.figment.admerge(Yaml::string(yaml));
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one. For example, with a
    /// prefix of `htl`, any environment variable starting with `htl_` would be matched.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, an error will be returned.
    pub fn from_environment(mut self, prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_string()
        } else {
            format!("{}_", prefix)
        };

        self.figment = self.figment.admerge(Env::prefixed(&prefix));
        Ok(self)
    }

    /// Consumes the loader, extracting the compiler configuration.
    ///
    /// ## Errors
    ///
    /// If the configuration could not be deserialized, or holds invalid values, an error will be returned.
    pub fn into_configuration(self) -> Result<CompilerConfiguration, ConfigurationError> {
        let config: CompilerConfiguration = self.figment.extract()?;
        config.validate()
    }
}
