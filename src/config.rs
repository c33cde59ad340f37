//! Collection configuration.
//!
//! Configuration can be built in code or loaded from a YAML document:
//!
//! ```yaml
//! external_dirs:
//!   - /etc/facter/facts.d
//! blocklist:
//!   - virtualization
//! environment_prefix: FACTER_
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings that shape how a [`crate::Collection`] gathers facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Directories searched for external facts when none are passed explicitly.
    /// Empty means the platform default directories.
    pub external_dirs: Vec<PathBuf>,
    /// Directories handed to the custom fact source when none are passed
    /// explicitly.
    pub custom_dirs: Vec<PathBuf>,
    /// Default resolvers (by name, case-insensitive) that are not registered.
    pub blocklist: Vec<String>,
    /// Prefix marking environment variables that become facts.
    pub environment_prefix: String,
    /// Lowercase fact names read from external sources.
    pub lowercase_external_names: bool,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            external_dirs: Vec::new(),
            custom_dirs: Vec::new(),
            blocklist: Vec::new(),
            environment_prefix: "FACTER_".to_string(),
            lowercase_external_names: true,
        }
    }
}

impl CollectionConfig {
    /// Parses a YAML configuration document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the document is not valid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    /// Loads a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, Some(path))
    }

    fn parse(yaml: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        // An empty document is a valid, all-default configuration.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            path: path.map(Path::to_path_buf),
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn with_external_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.external_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_custom_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.custom_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_blocklist<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocklist = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_environment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.environment_prefix = prefix.into();
        self
    }

    #[must_use]
    pub const fn with_lowercase_external_names(mut self, lowercase: bool) -> Self {
        self.lowercase_external_names = lowercase;
        self
    }

    /// Returns true if the named resolver is on the blocklist.
    #[must_use]
    pub fn is_blocked(&self, resolver: &str) -> bool {
        self.blocklist
            .iter()
            .any(|blocked| blocked.eq_ignore_ascii_case(resolver))
    }
}
