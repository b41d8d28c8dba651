//! In-memory provider source

use super::{ProviderEntry, ProviderSource, REGISTRATION_GROUP, YAML_GROUP};
use crate::error::Result;
use crate::registry::SettingsRegistry;
use crate::sync::RwLockExt;
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Provider source backed by a list the host fills in code
///
/// Entries are returned in insertion order. Plugins can be installed or
/// removed while the source is shared, and the next enumeration reflects it.
///
/// # Example
///
/// ```rust
/// use ndev_settings::{ProviderSource, SettingDefinition, StaticProviderSource, register_settings};
///
/// let source = StaticProviderSource::new()
///     .with_plugin("bioio.readers", "bioio-ome-tiff")
///     .with_plugin("bioio.readers", "bioio-tifffile")
///     .with_registration("bioio", |registry| {
///         register_settings(
///             registry,
///             [SettingDefinition::builder("auto_detect_reader", true)
///                 .group("Reader")
///                 .build()?],
///         )
///     });
///
/// let readers = source.providers("bioio.readers")?;
/// assert_eq!(readers.len(), 2);
/// # Ok::<(), ndev_settings::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct StaticProviderSource {
    groups: RwLock<HashMap<String, Vec<ProviderEntry>>>,
}

impl StaticProviderSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under `group`
    #[must_use]
    pub fn with_entry(self, group: impl Into<String>, entry: ProviderEntry) -> Self {
        self.install(group, entry);
        self
    }

    /// Add a named plugin under `group`
    #[must_use]
    pub fn with_plugin(self, group: impl Into<String>, name: impl Into<String>) -> Self {
        self.with_entry(group, ProviderEntry::named(name))
    }

    /// Add a registration function to the registration group
    #[must_use]
    pub fn with_registration<F>(self, name: impl Into<String>, register: F) -> Self
    where
        F: Fn(&mut SettingsRegistry) -> Result<()> + Send + Sync + 'static,
    {
        self.with_entry(REGISTRATION_GROUP, ProviderEntry::registration(name, register))
    }

    /// Add a settings document to the YAML group
    #[must_use]
    pub fn with_yaml_file(self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.with_entry(YAML_GROUP, ProviderEntry::yaml_file(name, path))
    }

    /// Add an entry while the source is shared
    pub fn install(&self, group: impl Into<String>, entry: ProviderEntry) {
        let group = group.into();
        debug!("Installing provider '{}' in {group}", entry.name);
        self.groups
            .write_recovered()
            .entry(group)
            .or_default()
            .push(entry);
    }

    /// Remove every entry called `name` from `group`, returning whether any existed
    pub fn uninstall(&self, group: &str, name: &str) -> bool {
        let mut groups = self.groups.write_recovered();
        let Some(entries) = groups.get_mut(group) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.name != name);
        before != entries.len()
    }
}

impl ProviderSource for StaticProviderSource {
    fn providers(&self, group: &str) -> Result<Vec<ProviderEntry>> {
        Ok(self
            .groups
            .read_recovered()
            .get(group)
            .cloned()
            .unwrap_or_default())
    }
}
