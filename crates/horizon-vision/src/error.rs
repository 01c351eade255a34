//! Error types for Horizon Vision.

use std::path::PathBuf;

use crate::role::{Context, Role};

/// Result type alias for vision operations.
pub type Result<T> = std::result::Result<T, VisionError>;

/// Errors surfaced by the vision engine.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// No provider with this name is registered.
    #[error("vision enhancement provider '{0}' is not registered")]
    UnknownProvider(String),

    /// The provider does not implement a requested role.
    #[error("provider '{provider}' does not implement role {role}")]
    UnsupportedRole { provider: String, role: Role },

    /// A required argument was omitted.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// An argument combination is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A provider with this name is already registered.
    #[error("vision enhancement provider '{0}' is already registered")]
    DuplicateProvider(String),

    /// A descriptor declares a role its provider does not expose.
    #[error("provider '{provider}' declares role {role} but does not implement it")]
    CapabilityMismatch { provider: String, role: Role },

    /// A highlighter was asked to track a context it does not support.
    #[error("highlighter '{provider}' does not support the {context} context")]
    UnsupportedContext { provider: String, context: Context },

    /// A provider hook failed.
    #[error("provider '{provider}' failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl VisionError {
    /// Wrap a provider failure with the provider's name.
    pub fn provider(provider: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            provider: provider.into(),
            source,
        }
    }

    /// Create an unsupported role error.
    pub fn unsupported_role(provider: impl Into<String>, role: Role) -> Self {
        Self::UnsupportedRole {
            provider: provider.into(),
            role,
        }
    }
}

/// Errors returned by provider hooks and rendering sinks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider cannot run on this system.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The rendering or transform backend reported a failure.
    #[error("backend failure: {0}")]
    Backend(String),

    /// The provider does not implement this operation.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A color enhancer does not offer this transformation.
    #[error("unknown color transformation '{0}'")]
    UnknownTransformation(String),
}

/// Errors from loading, saving or switching configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write the settings file.
    #[error("failed to access settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for this schema.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No profile with this name exists.
    #[error("unknown configuration profile '{0}'")]
    UnknownProfile(String),
}

impl ConfigError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
