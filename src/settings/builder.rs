//! Builder for Settings
//!
//! This module contains [`SettingsBuilder`] which provides a fluent API
//! for creating a [`Settings`](super::Settings).

use crate::config::{SettingDefinition, SettingsConfigBuilder};
use crate::defaults::DEFAULT_SETTINGS;
use crate::error::Result;
use crate::providers::{ProviderSource, StaticProviderSource};
use std::path::PathBuf;
use std::sync::Arc;

use super::Settings;

/// Builder for creating [`Settings`] with a fluent API.
///
/// # Example
///
/// ```rust,no_run
/// use ndev_settings::{ManifestProviderSource, Settings};
///
/// let settings = Settings::builder("napari-ndev")
///     .config_dir("~/.config/napari-ndev")
///     .with_default_settings()
///     .provider_source(ManifestProviderSource::new("/usr/share/ndev/plugins"))
///     .build()
///     .unwrap();
///
/// for warning in settings.discovery_warnings() {
///     eprintln!("skipped: {warning}");
/// }
/// ```
pub struct SettingsBuilder {
    config_builder: SettingsConfigBuilder,
    source: Option<Arc<dyn ProviderSource>>,
    definitions: Vec<SettingDefinition>,
}

impl SettingsBuilder {
    /// Create a new builder with the required app name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            config_builder: SettingsConfigBuilder::new(app_name),
            source: None,
            definitions: Vec::new(),
        }
    }

    /// Set the configuration directory.
    ///
    /// Supports `~` expansion for home directory.
    #[must_use]
    pub fn config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_builder = self.config_builder.config_dir(path);
        self
    }

    /// Set the settings filename (default: "settings.yaml").
    #[must_use]
    pub fn settings_file(mut self, filename: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.settings_file(filename);
        self
    }

    /// Apply a bundled YAML document before the user settings file.
    #[must_use]
    pub fn default_document(mut self, yaml: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.default_document(yaml);
        self
    }

    /// Use the settings shipped with this crate as the bundled document.
    #[must_use]
    pub fn with_default_settings(self) -> Self {
        self.default_document(DEFAULT_SETTINGS)
    }

    /// Override the provider group scanned for registration functions.
    #[must_use]
    pub fn registration_group(mut self, group: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.registration_group(group);
        self
    }

    /// Override the provider group scanned for YAML documents.
    #[must_use]
    pub fn yaml_group(mut self, group: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.yaml_group(group);
        self
    }

    /// Set where installed providers are enumerated from.
    ///
    /// Without a source no plugins are discovered and every dynamic choice
    /// setting shows its fallback message. Pass an `Arc` to keep a handle to
    /// the source after building.
    #[must_use]
    pub fn provider_source(mut self, source: impl ProviderSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Register definitions directly, after everything discovered.
    ///
    /// Invalid definitions make [`build`](Self::build) fail.
    #[must_use]
    pub fn with_settings<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = SettingDefinition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Build the [`Settings`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`](crate::Error::InvalidSettingMetadata)
    /// if a definition passed to [`with_settings`](Self::with_settings) is invalid.
    pub fn build(self) -> Result<Settings> {
        let config = self.config_builder.build();
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(StaticProviderSource::new()));

        Settings::with_config(config, source, self.definitions)
    }
}
