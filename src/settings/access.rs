use crate::config::{SettingDefinition, SettingType, SettingValue};
use crate::error::{Error, Result};
use crate::registry::SettingsRegistry;
use crate::resolver::ChoiceOptions;
use crate::storage::StorageBackend;
use crate::sync::RwLockExt;

use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Settings;

/// One setting as a UI renders it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingInfo {
    pub definition: SettingInfoDefinition,
    pub value: SettingValue,
    pub setting_type: SettingType,
    pub is_default: bool,
    /// Options for select and dynamic select settings, resolved when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChoiceOptions>,
}

/// Serializable view of the declaration behind a [`SettingInfo`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingInfoDefinition {
    pub group: String,
    pub name: String,
    pub description: String,
    pub default: SettingValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl From<&SettingDefinition> for SettingInfoDefinition {
    fn from(definition: &SettingDefinition) -> Self {
        Self {
            group: definition.group.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            default: definition.default_value.clone(),
            min: definition.min_value,
            max: definition.max_value,
            step: definition.step,
        }
    }
}

/// Changed settings as `(key, old, new)`, collected under the lock
type Changes = Vec<(String, SettingValue, SettingValue)>;

impl<S: StorageBackend> Settings<S> {
    // =========================================================================
    // Reading
    // =========================================================================

    /// Current value of a setting: the override if set, else the default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] or [`Error::SettingNotFound`].
    pub fn get(&self, group: &str, name: &str) -> Result<SettingValue> {
        let registry = self.registry.read_recovered();
        Ok(registry.get(group, name)?.current().clone())
    }

    /// Current value of a setting deserialized into `T`.
    ///
    /// Tuples deserialize into sequences or tuples of floats.
    ///
    /// # Errors
    ///
    /// Returns a not-found error, or [`Error::Parse`] if the value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, group: &str, name: &str) -> Result<T> {
        let value = serde_json::to_value(self.get(group, name)?)
            .map_err(|e| Error::Parse(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| Error::Parse(format!("{group}.{name}: {e}")))
    }

    /// Scoped accessor for one group.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] for an unknown group.
    pub fn group(&self, group: &str) -> Result<GroupView<'_, S>> {
        if !self.registry.read_recovered().has_group(group) {
            return Err(Error::GroupNotFound(group.to_string()));
        }
        Ok(GroupView {
            settings: self,
            group: group.to_string(),
        })
    }

    /// Declaration of a setting.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unregistered `(group, name)`.
    pub fn definition(&self, group: &str, name: &str) -> Result<SettingDefinition> {
        let registry = self.registry.read_recovered();
        registry.definition(group, name).cloned()
    }

    /// Group names in display order.
    pub fn groups(&self) -> Vec<String> {
        let registry = self.registry.read_recovered();
        registry.groups().into_iter().map(str::to_string).collect()
    }

    /// Setting names of a group in display order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] for an unknown group.
    pub fn names(&self, group: &str) -> Result<Vec<String>> {
        let registry = self.registry.read_recovered();
        Ok(registry
            .names(group)?
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Whether a setting currently holds its default.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unregistered `(group, name)`.
    pub fn is_default(&self, group: &str, name: &str) -> Result<bool> {
        let registry = self.registry.read_recovered();
        Ok(registry.get(group, name)?.is_default())
    }

    /// Options a UI should show for a choice setting.
    ///
    /// Static choices are always enabled; dynamic choices are resolved now.
    ///
    /// # Errors
    ///
    /// Returns a not-found error, or [`Error::InvalidSettingValue`] if the
    /// setting has no choices.
    pub fn choices(&self, group: &str, name: &str) -> Result<ChoiceOptions> {
        let definition = self.definition(group, name)?;
        self.options_for(&definition)
            .ok_or_else(|| Error::invalid_value(definition.key(), "Setting has no choices"))
    }

    fn options_for(&self, definition: &SettingDefinition) -> Option<ChoiceOptions> {
        if let Some(choices) = &definition.choices {
            return Some(ChoiceOptions::enabled(choices.clone()));
        }
        definition
            .dynamic_choices
            .as_ref()
            .map(|dynamic| self.resolver.options(dynamic))
    }

    /// Every setting with its current value, in display order.
    pub fn metadata(&self) -> Vec<SettingInfo> {
        let snapshot: Vec<(SettingDefinition, SettingValue, bool)> = {
            let registry = self.registry.read_recovered();
            registry
                .iter()
                .map(|s| (s.definition.clone(), s.current().clone(), s.is_default()))
                .collect()
        };

        snapshot
            .into_iter()
            .map(|(definition, value, is_default)| SettingInfo {
                options: self.options_for(&definition),
                setting_type: definition.setting_type(),
                definition: SettingInfoDefinition::from(&definition),
                value,
                is_default,
            })
            .collect()
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Assign a value after validating it.
    ///
    /// Listeners are notified only when the stored value changes.
    ///
    /// # Errors
    ///
    /// Returns a not-found error, or [`Error::InvalidSettingValue`] when the
    /// value has the wrong kind, is out of range, is not a current choice, or
    /// is rejected by a validator registered on the [`EventManager`](crate::EventManager).
    pub fn set(&self, group: &str, name: &str, value: impl Into<SettingValue>) -> Result<()> {
        let value = value.into();
        let definition = self.definition(group, name)?;
        let key = definition.key();

        definition.validate_value(&value)?;
        self.check_dynamic_choice(&definition, &value)?;
        self.events
            .validate(&key, &value)
            .map_err(|reason| Error::invalid_value(&key, reason))?;

        let (old, new) = {
            let mut registry = self.registry.write_recovered();
            let old = registry.set_value(group, name, value)?;
            (old, registry.get(group, name)?.current().clone())
        };

        if old != new {
            debug!("Setting {key} changed from {old} to {new}");
            self.events.notify(&key, &old, &new);
        }
        Ok(())
    }

    fn check_dynamic_choice(&self, definition: &SettingDefinition, value: &SettingValue) -> Result<()> {
        let Some(dynamic) = &definition.dynamic_choices else {
            return Ok(());
        };
        // the declared default is the fallback and always allowed
        if *value == definition.default_value {
            return Ok(());
        }

        let installed = self.resolver.resolve(&dynamic.provider);
        let text = value.as_str().unwrap_or_default();
        if installed.iter().any(|name| name == text) {
            Ok(())
        } else {
            Err(Error::invalid_value(
                definition.key(),
                format!("'{text}' is not installed in {}", dynamic.provider),
            ))
        }
    }

    /// Restore one setting to its default, returning the default.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unregistered `(group, name)`.
    pub fn reset(&self, group: &str, name: &str) -> Result<SettingValue> {
        let (old, default) = {
            let mut registry = self.registry.write_recovered();
            let old = registry.clear_value(group, name)?;
            (old, registry.get(group, name)?.current().clone())
        };

        if old != default {
            let key = format!("{group}.{name}");
            debug!("Setting {key} reset to {default}");
            self.events.notify(&key, &old, &default);
        }
        Ok(default)
    }

    /// Restore every setting in a group to its default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] for an unknown group.
    pub fn reset_group(&self, group: &str) -> Result<()> {
        let changes = {
            let mut registry = self.registry.write_recovered();
            let names: Vec<String> = registry
                .names(group)?
                .into_iter()
                .map(str::to_string)
                .collect();
            Self::clear_all(&mut registry, names.iter().map(|name| (group, name.as_str())))
        };

        info!("Reset {} setting(s) in {group}", changes.len());
        self.notify_all(&changes);
        Ok(())
    }

    /// Restore every setting to its default.
    pub fn reset_all(&self) {
        let changes = {
            let mut registry = self.registry.write_recovered();
            let keys: Vec<(String, String)> = registry
                .iter()
                .map(|s| (s.definition.group.clone(), s.definition.name.clone()))
                .collect();
            Self::clear_all(
                &mut registry,
                keys.iter().map(|(group, name)| (group.as_str(), name.as_str())),
            )
        };

        info!("Reset {} setting(s) to defaults", changes.len());
        self.notify_all(&changes);
    }

    fn clear_all<'k>(
        registry: &mut SettingsRegistry,
        keys: impl Iterator<Item = (&'k str, &'k str)>,
    ) -> Changes {
        let mut changes = Vec::new();
        for (group, name) in keys {
            let Ok(setting) = registry.get(group, name) else {
                continue;
            };
            if setting.is_default() {
                continue;
            }
            let default = setting.definition.default_value.clone();
            if let Ok(old) = registry.clear_value(group, name) {
                changes.push((format!("{group}.{name}"), old, default));
            }
        }
        changes
    }

    fn notify_all(&self, changes: &Changes) {
        for (key, old, new) in changes {
            self.events.notify(key, old, new);
        }
    }
}

// =============================================================================
// Group View
// =============================================================================

/// Accessor scoped to one group: `settings.group("Export")?.get("compression_level")`
#[derive(Debug)]
pub struct GroupView<'a, S: StorageBackend> {
    settings: &'a Settings<S>,
    group: String,
}

impl<S: StorageBackend> GroupView<'_, S> {
    /// Group this view reads from
    pub fn name(&self) -> &str {
        &self.group
    }

    /// # Errors
    ///
    /// Returns [`Error::SettingNotFound`] for a name not registered in this group.
    pub fn get(&self, name: &str) -> Result<SettingValue> {
        self.settings.get(&self.group, name)
    }

    /// # Errors
    ///
    /// Returns a not-found or parse error.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.settings.get_as(&self.group, name)
    }

    /// # Errors
    ///
    /// See [`Settings::set`].
    pub fn set(&self, name: &str, value: impl Into<SettingValue>) -> Result<()> {
        self.settings.set(&self.group, name, value)
    }

    /// # Errors
    ///
    /// Returns [`Error::SettingNotFound`] for an unknown name.
    pub fn reset(&self, name: &str) -> Result<SettingValue> {
        self.settings.reset(&self.group, name)
    }

    /// Setting names in display order
    pub fn names(&self) -> Vec<String> {
        self.settings.names(&self.group).unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderEntry, StaticProviderSource};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    fn build(source: StaticProviderSource) -> (TempDir, Settings) {
        let dir = tempdir().unwrap();
        let settings = Settings::builder("ndev-test")
            .config_dir(dir.path())
            .provider_source(source)
            .with_settings([
                SettingDefinition::builder("canvas_scale", 1.0)
                    .group("Export")
                    .min(0.1)
                    .max(100.0)
                    .build()
                    .unwrap(),
                SettingDefinition::builder("compression_level", "medium")
                    .group("Export")
                    .choices(["none", "low", "medium", "high", "maximum"])
                    .build()
                    .unwrap(),
                SettingDefinition::dynamic_choice("preferred_reader", "bioio-ome-tiff", "bioio.readers")
                    .group("Reader")
                    .fallback_message("No bioio readers available")
                    .build()
                    .unwrap(),
            ])
            .build()
            .unwrap();
        (dir, settings)
    }

    #[test]
    fn test_defaults_before_any_override() {
        let (_dir, settings) = build(StaticProviderSource::new());
        assert_eq!(settings.get("Export", "canvas_scale").unwrap(), SettingValue::Float(1.0));
        assert!(settings.is_default("Export", "canvas_scale").unwrap());
    }

    #[test]
    fn test_dynamic_membership_checked_at_assignment() {
        let source = Arc::new(StaticProviderSource::new().with_plugin("bioio.readers", "bioio-czi"));
        let (_dir, settings) = build(StaticProviderSource::new());
        assert!(settings.set("Reader", "preferred_reader", "bioio-czi").is_err());

        let (_dir, settings) = {
            let dir = tempdir().unwrap();
            let settings = Settings::builder("ndev-test")
                .config_dir(dir.path())
                .provider_source(source.clone())
                .with_settings([SettingDefinition::dynamic_choice(
                    "preferred_reader",
                    "bioio-ome-tiff",
                    "bioio.readers",
                )
                .group("Reader")
                .build()
                .unwrap()])
                .build()
                .unwrap();
            (dir, settings)
        };

        settings.set("Reader", "preferred_reader", "bioio-czi").unwrap();
        assert!(settings.set("Reader", "preferred_reader", "bioio-lif").is_err());
        // the default is accepted even though no such reader is installed
        settings.set("Reader", "preferred_reader", "bioio-ome-tiff").unwrap();

        source.install("bioio.readers", ProviderEntry::named("bioio-lif"));
        settings.set("Reader", "preferred_reader", "bioio-lif").unwrap();
    }

    #[test]
    fn test_listener_only_on_change() {
        let (_dir, settings) = build(StaticProviderSource::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        settings.events().watch("Export.compression_level", move |_, _, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        settings.set("Export", "compression_level", "high").unwrap();
        settings.set("Export", "compression_level", "high").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        settings.reset("Export", "compression_level").unwrap();
        settings.reset("Export", "compression_level").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_can_read_settings() {
        let (_dir, settings) = build(StaticProviderSource::new());
        let settings = Arc::new(settings);
        let seen = Arc::new(AtomicUsize::new(0));

        let reader = Arc::downgrade(&settings);
        let s = seen.clone();
        settings.events().on_change(move |_, _, _| {
            let settings = reader.upgrade().unwrap();
            assert_eq!(settings.get("Export", "canvas_scale").unwrap(), SettingValue::Float(2.0));
            s.fetch_add(1, Ordering::SeqCst);
        });

        settings.set("Export", "canvas_scale", 2.0).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_validator_rejects() {
        let (_dir, settings) = build(StaticProviderSource::new());
        settings.events().add_validator("Export.canvas_scale", |value| {
            if value.as_f64().is_some_and(|scale| scale > 10.0) {
                Err("Scale above 10 exhausts GPU memory".into())
            } else {
                Ok(())
            }
        });

        let err = settings.set("Export", "canvas_scale", 50.0).unwrap_err();
        assert!(err.is_validation());
        settings.set("Export", "canvas_scale", 5.0).unwrap();
    }

    #[test]
    fn test_choices() {
        let (_dir, settings) = build(StaticProviderSource::new());

        let static_choices = settings.choices("Export", "compression_level").unwrap();
        assert!(static_choices.enabled);
        assert_eq!(static_choices.options.len(), 5);

        let dynamic = settings.choices("Reader", "preferred_reader").unwrap();
        assert_eq!(dynamic.options, ["No bioio readers available"]);
        assert!(!dynamic.enabled);

        assert!(settings.choices("Export", "canvas_scale").unwrap_err().is_validation());
    }

    #[test]
    fn test_reset_group_and_all() {
        let (_dir, settings) = build(StaticProviderSource::new());
        settings.set("Export", "canvas_scale", 3.0).unwrap();
        settings.set("Export", "compression_level", "low").unwrap();

        settings.reset_group("Export").unwrap();
        assert!(settings.is_default("Export", "canvas_scale").unwrap());
        assert!(settings.is_default("Export", "compression_level").unwrap());

        settings.set("Export", "canvas_scale", 3.0).unwrap();
        settings.reset_all();
        assert!(settings.is_default("Export", "canvas_scale").unwrap());

        assert!(settings.reset_group("NoSuchGroup").unwrap_err().is_not_found());
    }

    #[test]
    fn test_group_view() {
        let (_dir, settings) = build(StaticProviderSource::new());
        let export = settings.group("Export").unwrap();

        assert_eq!(export.name(), "Export");
        assert_eq!(export.names(), ["canvas_scale", "compression_level"]);
        export.set("canvas_scale", 4.0).unwrap();
        assert_eq!(export.get_as::<f64>("canvas_scale").unwrap(), 4.0);
        assert!(matches!(export.get("missing"), Err(Error::SettingNotFound(_))));
        assert!(matches!(settings.group("NoSuchGroup"), Err(Error::GroupNotFound(_))));
    }

    #[test]
    fn test_metadata_in_display_order() {
        let (_dir, settings) = build(StaticProviderSource::new().with_plugin("bioio.readers", "bioio-czi"));
        let metadata = settings.metadata();

        let keys: Vec<String> = metadata
            .iter()
            .map(|info| format!("{}.{}", info.definition.group, info.definition.name))
            .collect();
        assert_eq!(
            keys,
            [
                "Export.canvas_scale",
                "Export.compression_level",
                "Reader.preferred_reader"
            ]
        );
        assert_eq!(metadata[2].setting_type, SettingType::DynamicSelect);
        assert_eq!(
            metadata[2].options.as_ref().unwrap().options,
            ["bioio-czi"]
        );
        assert!(metadata[0].options.is_none());
    }
}
