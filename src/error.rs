//! Error types for ndev-settings

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ndev-settings operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ndev-settings
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Settings Errors
    // -------------------------------------------------------------------------
    #[error("Setting not found: {0}")]
    SettingNotFound(String),

    #[error("Settings group not found: {0}")]
    GroupNotFound(String),

    #[error("Invalid setting value for {key}: {reason}")]
    InvalidSettingValue { key: String, reason: String },

    #[error("Invalid setting definition for {key}: {reason}")]
    InvalidSettingMetadata { key: String, reason: String },

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("Provider '{provider}' failed: {reason}")]
    Provider { provider: String, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings not initialized")]
    NotInitialized,

    #[error("Settings already initialized")]
    AlreadyInitialized,
}

impl Error {
    /// Check if this is a "not found" type error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::SettingNotFound(_) | Error::GroupNotFound(_))
    }

    /// Check if this is a validation error (bad definition or bad assignment)
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidSettingValue { .. } | Error::InvalidSettingMetadata { .. }
        )
    }

    pub(crate) fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidSettingValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_definition(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidSettingMetadata {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Error a provider function returns when it cannot register its settings
    pub fn provider(provider: impl Into<String>, reason: impl ToString) -> Self {
        Error::Provider {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }
}
