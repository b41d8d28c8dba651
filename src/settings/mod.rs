//! Settings facade
//!
//! This module contains [`Settings`], the explicit context object through which
//! a host reads, writes, resets and persists the merged settings.
//!
//! # Example
//!
//! ```rust
//! use ndev_settings::{Settings, SettingDefinition, StaticProviderSource};
//!
//! let dir = tempfile::tempdir()?;
//! let settings = Settings::builder("napari-ndev")
//!     .config_dir(dir.path())
//!     .provider_source(StaticProviderSource::new().with_plugin("bioio.readers", "bioio-czi"))
//!     .with_settings([
//!         SettingDefinition::dynamic_choice("preferred_reader", "bioio-ome-tiff", "bioio.readers")
//!             .group("Reader")
//!             .build()?,
//!     ])
//!     .build()?;
//!
//! settings.group("Reader")?.set("preferred_reader", "bioio-czi")?;
//! assert_eq!(settings.get("Reader", "preferred_reader")?.as_str(), Some("bioio-czi"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod access;
mod builder;
mod discovery;
mod io;

pub use access::{GroupView, SettingInfo, SettingInfoDefinition};
pub use builder::SettingsBuilder;
pub use discovery::DiscoveryWarning;

use crate::config::{SettingDefinition, SettingsConfig};
use crate::error::Result;
use crate::events::EventManager;
use crate::providers::ProviderSource;
use crate::registry::{SettingsRegistry, register_settings};
use crate::resolver::ChoiceResolver;
use crate::storage::{StorageBackend, YamlStorage};
use discovery::Discovery;
use std::sync::{Arc, RwLock};

/// Merged settings from every discovered source
///
/// The set of definitions is fixed once construction returns; values may
/// change at any time. `Settings` is `Send + Sync` and can be shared between
/// threads behind an `Arc` or installed as the process-wide instance with
/// [`init_settings`](crate::init_settings).
pub struct Settings<S: StorageBackend = YamlStorage> {
    config: SettingsConfig<S>,

    registry: RwLock<SettingsRegistry>,

    resolver: ChoiceResolver,

    /// Change listeners and extra validators
    events: Arc<EventManager>,

    /// Sources skipped during discovery
    warnings: Vec<DiscoveryWarning>,
}

impl Settings<YamlStorage> {
    /// Create a new builder for `Settings`
    pub fn builder(app_name: impl Into<String>) -> SettingsBuilder {
        SettingsBuilder::new(app_name)
    }
}

impl<S: StorageBackend> Settings<S> {
    /// Discover settings for `config`, then register `definitions` directly
    ///
    /// Discovery problems are recorded as warnings; only invalid direct
    /// definitions fail construction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`](crate::Error::InvalidSettingMetadata)
    /// if a direct definition is invalid.
    pub fn with_config<I>(
        config: SettingsConfig<S>,
        source: Arc<dyn ProviderSource>,
        definitions: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = SettingDefinition>,
    {
        let mut discovery = Discovery::new(source.as_ref()).run(&config);
        register_settings(discovery.registry_mut(), definitions)?;
        let (registry, warnings) = discovery.finish();

        Ok(Self {
            config,
            registry: RwLock::new(registry),
            resolver: ChoiceResolver::new(source),
            events: Arc::new(EventManager::new()),
            warnings,
        })
    }

    pub fn config(&self) -> &SettingsConfig<S> {
        &self.config
    }

    /// Event manager for change listeners and extra validators
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// Resolver used for dynamic choice settings
    pub fn resolver(&self) -> &ChoiceResolver {
        &self.resolver
    }

    /// Sources skipped during discovery, in the order they were encountered
    pub fn discovery_warnings(&self) -> &[DiscoveryWarning] {
        &self.warnings
    }
}

impl<S: StorageBackend> std::fmt::Debug for Settings<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("settings_path", &self.config.settings_path())
            .field("warnings", &self.warnings.len())
            .finish_non_exhaustive()
    }
}
