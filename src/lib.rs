//! # ndev-settings
//!
//! A settings registry for plugin ecosystems. Independently installed
//! libraries declare typed settings; the host merges them into one
//! [`Settings`] object and renders it.
//!
//! ## Features
//!
//! - **Typed Definitions**: toggles, bounded numbers, text, tuples, static choices
//! - **Dynamic Choices**: choice lists computed from the plugins installed right now
//! - **Discovery**: YAML documents and registration functions found through a [`ProviderSource`]
//! - **Fail Soft**: a broken plugin is skipped and reported, never fatal
//! - **Persistence**: one YAML settings file, written atomically
//! - **Change Events**: listeners and extra validators per setting
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ndev_settings::{ManifestProviderSource, Settings};
//!
//! let settings = Settings::builder("napari-ndev")
//!     .config_dir("~/.config/napari-ndev")
//!     .with_default_settings()
//!     .provider_source(ManifestProviderSource::new("~/.local/share/ndev/plugins"))
//!     .build()?;
//!
//! let reader = settings.group("Reader")?.get("preferred_reader")?;
//! settings.set("Export", "canvas_scale", 2.0)?;
//! settings.save()?;
//! # Ok::<(), ndev_settings::Error>(())
//! ```
//!
//! ## Contributing Settings From a Library
//!
//! A library ships a registration function (or a YAML document) and lists it
//! under [`REGISTRATION_GROUP`] (or [`YAML_GROUP`]):
//!
//! ```rust
//! use ndev_settings::{Result, SettingDefinition, SettingsRegistry, register_settings};
//!
//! pub fn register_bioio_settings(registry: &mut SettingsRegistry) -> Result<()> {
//!     register_settings(
//!         registry,
//!         [
//!             SettingDefinition::dynamic_choice("preferred_reader", "bioio-ome-tiff", "bioio.readers")
//!                 .group("Reader")
//!                 .description("Preferred reader to use when opening images")
//!                 .fallback_message("No bioio readers available")
//!                 .build()?,
//!             SettingDefinition::builder("max_memory_usage_gb", 4.0)
//!                 .group("Performance")
//!                 .min(0.1)
//!                 .max(64.0)
//!                 .step(0.1)
//!                 .build()?,
//!         ],
//!     )
//! }
//!
//! let mut registry = SettingsRegistry::new();
//! register_bioio_settings(&mut registry)?;
//! assert_eq!(registry.groups(), ["Performance", "Reader"]);
//! # Ok::<(), ndev_settings::Error>(())
//! ```
//!
//! ## Merge Order
//!
//! Later sources win for the same `(group, name)`:
//!
//! 1. definitions saved in the user settings file, then the bundled default document
//! 2. YAML documents from [`YAML_GROUP`]
//! 3. registration functions from [`REGISTRATION_GROUP`]
//! 4. definitions passed to [`SettingsBuilder::with_settings`]
//!
//! Values stored in the user settings file are applied last, on top of the
//! merged definitions; a value the current definition rejects is dropped.
//!
//! ## Values Live in Memory
//!
//! [`Settings::set`] and the reset methods change values in memory only; call
//! [`Settings::save`] to write the user settings file.

// Core modules
mod defaults;
mod docs;
mod error;
mod events;
mod global;
mod registry;
mod resolver;
mod settings;
mod sync;

pub mod document;
pub mod providers;
pub mod storage;

// Grouped modules
pub mod config;

// Re-exports from core
pub use defaults::DEFAULT_SETTINGS;
pub use docs::{DocsConfig, generate_docs, generate_docs_from_metadata};
pub use document::{SettingEntry, SettingsDocument, ValueReset, reset_values, reset_values_in_file};
pub use error::{Error, Result};
pub use events::{ChangeCallback, EventManager, Validator};
pub use global::{get_settings, init_settings};
pub use providers::{
    ManifestProviderSource, Provider, ProviderEntry, ProviderSource, REGISTRATION_GROUP,
    StaticProviderSource, YAML_GROUP,
};
pub use registry::{RegisteredSetting, SettingsRegistry, register_settings};
pub use resolver::{ChoiceOptions, ChoiceResolver};
pub use settings::{
    DiscoveryWarning, GroupView, SettingInfo, SettingInfoDefinition, Settings, SettingsBuilder,
};
pub use storage::{StorageBackend, YamlStorage};

// Re-exports from config
pub use config::{
    DEFAULT_FALLBACK_MESSAGE, DEFAULT_GROUP, DynamicChoices, SettingDefinition,
    SettingDefinitionBuilder, SettingType, SettingValue, SettingsConfig, SettingsConfigBuilder,
};
