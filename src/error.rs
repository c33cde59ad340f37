//! Error types for facter.
//!
//! All errors are strongly typed using thiserror. Note that the common
//! "not there" outcomes (an unresolvable fact, a type mismatch on typed
//! access) are not errors at all: they surface as `None` from the query API.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the resolution machinery itself.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Resolution cycle detected for fact '{name}': {}", .chain.join(" -> "))]
    Cycle {
        name: String,
        chain: Vec<String>,
    },

    #[error("Resolver '{resolver}' has an invalid pattern: {reason}")]
    InvalidPattern {
        resolver: String,
        reason: String,
    },
}

/// Errors raised while loading a single external fact source.
#[derive(Debug, Error)]
pub enum ExternalFactError {
    #[error("Failed to read external fact source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} external facts in {}: {reason}", .path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("External fact executable {} exited with {status}: {stderr}", .path.display())]
    Execution {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Invalid external fact name '{name}' in {}", .path.display())]
    InvalidName {
        path: PathBuf,
        name: String,
    },
}

impl ExternalFactError {
    /// Returns the path of the source that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. }
            | Self::Parse { path, .. }
            | Self::Execution { path, .. }
            | Self::InvalidName { path, .. } => path,
        }
    }
}

/// Errors raised by a custom fact source.
#[derive(Debug, Error)]
pub enum CustomFactError {
    #[error("Failed to load custom facts from {}: {reason}", .directory.display())]
    Load {
        directory: PathBuf,
        reason: String,
    },
}

/// Errors raised while writing a collection.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write facts: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize facts as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to serialize facts as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown output format '{0}' (expected hash, json or yaml)")]
    UnknownFormat(String),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration{}: {reason}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        reason: String,
    },
}

/// Top-level error type for facter.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("External fact error: {0}")]
    External(#[from] ExternalFactError),

    #[error("{} external fact source(s) failed to load; first: {}", .failures.len(), .failures.first().map(ToString::to_string).unwrap_or_default())]
    ExternalFacts {
        failures: Vec<ExternalFactError>,
    },

    #[error("Custom fact error: {0}")]
    Custom(#[from] CustomFactError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl FactError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a resolution error.
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }

    /// Returns true if this error came from loading external facts.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_) | Self::ExternalFacts { .. })
    }

    /// Returns true if this error came from a custom fact source.
    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    /// Returns true if this is an output error.
    #[must_use]
    pub const fn is_output(&self) -> bool {
        matches!(self, Self::Output(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<std::io::Error> for FactError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(OutputError::Io(err))
    }
}

/// Result type alias for facter operations.
pub type FactResult<T> = Result<T, FactError>;
