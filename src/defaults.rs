//! Settings shipped with the crate
//!
//! [`DEFAULT_SETTINGS`] is applied first during discovery when a host opts in
//! with [`SettingsBuilder::with_default_settings`](crate::SettingsBuilder::with_default_settings),
//! so every later source may override it.

/// Bundled settings document for the nDev reader and export widgets
pub const DEFAULT_SETTINGS: &str = include_str!("default_settings.yaml");
