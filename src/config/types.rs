//! Configuration for building a [`Settings`](crate::Settings) context

use std::path::PathBuf;

use crate::providers::{REGISTRATION_GROUP, YAML_GROUP};
use crate::storage::{StorageBackend, YamlStorage};

/// Configuration for settings discovery and persistence
#[derive(Debug, Clone)]
pub struct SettingsConfig<S: StorageBackend = YamlStorage> {
    /// Directory where the user settings file is stored
    pub config_dir: PathBuf,

    /// Filename for the user settings file (e.g., "settings.yaml")
    pub settings_file: String,

    /// Application name (used for the default config directory)
    pub app_name: String,

    /// Storage backend implementation
    pub storage: S,

    /// Bundled default document, applied before the user settings file
    pub default_document: Option<String>,

    /// Provider group whose entries are registration functions
    pub registration_group: String,

    /// Provider group whose entries point at YAML settings documents
    pub yaml_group: String,
}

impl Default for SettingsConfig<YamlStorage> {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("."),
            settings_file: "settings.yaml".into(),
            app_name: "ndev".into(),
            storage: YamlStorage::new(),
            default_document: None,
            registration_group: REGISTRATION_GROUP.into(),
            yaml_group: YAML_GROUP.into(),
        }
    }
}

impl<S: StorageBackend> SettingsConfig<S> {
    /// Get the full path to the user settings file
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(&self.settings_file)
    }
}

impl SettingsConfig<YamlStorage> {
    /// Create a new builder for SettingsConfig
    ///
    /// # Example
    /// ```rust
    /// use ndev_settings::SettingsConfig;
    ///
    /// let config = SettingsConfig::builder("napari-ndev")
    ///     .config_dir("/tmp/napari-ndev")
    ///     .build();
    /// assert!(config.settings_path().ends_with("settings.yaml"));
    /// ```
    pub fn builder(app_name: impl Into<String>) -> SettingsConfigBuilder {
        SettingsConfigBuilder::new(app_name)
    }
}

/// Builder for creating SettingsConfig with a fluent API
#[derive(Debug, Clone)]
pub struct SettingsConfigBuilder {
    config_dir: Option<PathBuf>,
    settings_file: String,
    app_name: String,
    default_document: Option<String>,
    registration_group: String,
    yaml_group: String,
}

impl SettingsConfigBuilder {
    /// Create a new builder with the required app name
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            config_dir: None,
            settings_file: "settings.yaml".into(),
            app_name: app_name.into(),
            default_document: None,
            registration_group: REGISTRATION_GROUP.into(),
            yaml_group: YAML_GROUP.into(),
        }
    }

    /// Set the configuration directory
    ///
    /// Supports `~` expansion for home directory.
    #[must_use]
    pub fn config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let expanded = match (path.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path,
        };
        self.config_dir = Some(expanded);
        self
    }

    /// Set the settings filename (default: "settings.yaml")
    #[must_use]
    pub fn settings_file(mut self, filename: impl Into<String>) -> Self {
        self.settings_file = filename.into();
        self
    }

    /// Apply a bundled YAML document before the user settings file
    #[must_use]
    pub fn default_document(mut self, yaml: impl Into<String>) -> Self {
        self.default_document = Some(yaml.into());
        self
    }

    /// Override the provider group scanned for registration functions
    #[must_use]
    pub fn registration_group(mut self, group: impl Into<String>) -> Self {
        self.registration_group = group.into();
        self
    }

    /// Override the provider group scanned for YAML documents
    #[must_use]
    pub fn yaml_group(mut self, group: impl Into<String>) -> Self {
        self.yaml_group = group.into();
        self
    }

    /// Build the SettingsConfig
    ///
    /// If `config_dir` is not set, uses the system config directory for the app.
    pub fn build(self) -> SettingsConfig<YamlStorage> {
        let config_dir = self.config_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|d| d.join(&self.app_name))
                .unwrap_or_else(|| PathBuf::from("."))
        });

        SettingsConfig {
            config_dir,
            settings_file: self.settings_file,
            app_name: self.app_name,
            storage: YamlStorage::new(),
            default_document: self.default_document,
            registration_group: self.registration_group,
            yaml_group: self.yaml_group,
        }
    }
}
