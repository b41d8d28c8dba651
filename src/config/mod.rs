//! Core configuration types
//!
//! This module contains the foundational types for settings declarations:
//! - `SettingDefinition` - Declaration of one setting (default, description, constraints)
//! - `SettingValue` - Values a setting can hold
//! - `SettingsConfig` - Where the settings file lives and which provider groups are scanned

mod definition;
mod types;

pub use definition::{
    DEFAULT_FALLBACK_MESSAGE, DEFAULT_GROUP, DynamicChoices, SettingDefinition,
    SettingDefinitionBuilder, SettingType, SettingValue,
};

pub use types::{SettingsConfig, SettingsConfigBuilder};
