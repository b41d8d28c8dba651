//! Settings registry
//!
//! The registry owns every [`SettingDefinition`] keyed by `(group, name)` along
//! with the user's override value, if any. Registration follows one rule: the
//! last registration for a given `(group, name)` wins.
//!
//! When a definition is replaced, an existing override survives if it is still
//! valid under the new definition; otherwise it is dropped and the setting falls
//! back to the new default.

use crate::config::{SettingDefinition, SettingValue};
use crate::document::SettingsDocument;
use crate::error::{Error, Result};
use log::{debug, warn};
use std::collections::BTreeMap;

/// A definition plus the user's override of its default
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredSetting {
    pub definition: SettingDefinition,
    /// Override value; `None` means the default is in effect
    pub value: Option<SettingValue>,
}

impl RegisteredSetting {
    /// Resolved value: the override if set, else the default
    pub fn current(&self) -> &SettingValue {
        self.value.as_ref().unwrap_or(&self.definition.default_value)
    }

    pub fn is_default(&self) -> bool {
        self.value.is_none()
    }
}

/// Mapping from `(group, name)` to registered settings
///
/// Groups and names iterate in alphabetical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsRegistry {
    groups: BTreeMap<String, BTreeMap<String, RegisteredSetting>>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one definition, replacing any previous one with the same key
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`] if the definition is invalid.
    pub fn register(&mut self, definition: SettingDefinition) -> Result<()> {
        definition.validate()?;
        self.insert(definition);
        Ok(())
    }

    fn insert(&mut self, definition: SettingDefinition) {
        let key = definition.key();
        let settings = self.groups.entry(definition.group.clone()).or_default();

        let carried = settings.remove(&definition.name).and_then(|previous| {
            debug!("Setting {key} redefined, later registration wins");
            previous.value
        });

        let value = carried.filter(|value| {
            if *value == definition.default_value {
                return false;
            }
            match definition.validate_value(value) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping stored value for {key}: {e}");
                    false
                }
            }
        });

        settings.insert(
            definition.name.clone(),
            RegisteredSetting { definition, value },
        );
    }

    /// Register every setting in a document and apply the values it carries
    ///
    /// The document is validated as a whole first; if any entry is invalid no
    /// definition is registered. Values that do not satisfy their definition are
    /// skipped with a warning. Returns the number of definitions registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`] for the first invalid entry.
    pub fn register_document(&mut self, document: &SettingsDocument) -> Result<usize> {
        let definitions = document.definitions()?;
        let count = definitions.len();
        for definition in definitions {
            self.insert(definition);
        }

        for (group, name, value) in document.values() {
            if let Err(e) = self.set_value(group, name, value.clone()) {
                warn!("Ignoring stored value for {group}.{name}: {e}");
            }
        }
        Ok(count)
    }

    /// Fold another registry into this one, as if its settings were registered now
    pub fn merge(&mut self, other: SettingsRegistry) {
        for setting in other.groups.into_values().flat_map(BTreeMap::into_values) {
            let RegisteredSetting { definition, value } = setting;
            let (group, name) = (definition.group.clone(), definition.name.clone());
            self.insert(definition);
            if let Some(value) = value {
                // already validated against this exact definition
                let _ = self.set_value(&group, &name, value);
            }
        }
    }

    /// Look up a registered setting
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] or [`Error::SettingNotFound`].
    pub fn get(&self, group: &str, name: &str) -> Result<&RegisteredSetting> {
        self.group(group)?
            .get(name)
            .ok_or_else(|| Error::SettingNotFound(format!("{group}.{name}")))
    }

    /// Look up a definition
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unregistered `(group, name)`.
    pub fn definition(&self, group: &str, name: &str) -> Result<&SettingDefinition> {
        self.get(group, name).map(|setting| &setting.definition)
    }

    fn group(&self, group: &str) -> Result<&BTreeMap<String, RegisteredSetting>> {
        self.groups
            .get(group)
            .ok_or_else(|| Error::GroupNotFound(group.to_string()))
    }

    fn get_mut(&mut self, group: &str, name: &str) -> Result<&mut RegisteredSetting> {
        self.groups
            .get_mut(group)
            .ok_or_else(|| Error::GroupNotFound(group.to_string()))?
            .get_mut(name)
            .ok_or_else(|| Error::SettingNotFound(format!("{group}.{name}")))
    }

    /// Store a value after static validation, returning the previous resolved value
    ///
    /// A value equal to the default clears the override.
    ///
    /// # Errors
    ///
    /// Returns a not-found error or [`Error::InvalidSettingValue`].
    pub fn set_value(&mut self, group: &str, name: &str, value: SettingValue) -> Result<SettingValue> {
        let setting = self.get_mut(group, name)?;
        setting.definition.validate_value(&value)?;
        let value = setting.definition.normalize(value);

        let old = setting.current().clone();
        setting.value = (value != setting.definition.default_value).then_some(value);
        Ok(old)
    }

    /// Drop the override for one setting, returning the previous resolved value
    ///
    /// # Errors
    ///
    /// Returns a not-found error for an unregistered `(group, name)`.
    pub fn clear_value(&mut self, group: &str, name: &str) -> Result<SettingValue> {
        let setting = self.get_mut(group, name)?;
        let old = setting.current().clone();
        setting.value = None;
        Ok(old)
    }

    pub fn contains(&self, group: &str, name: &str) -> bool {
        self.get(group, name).is_ok()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Group names in display order
    pub fn groups(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    /// Setting names of one group in display order
    ///
    /// # Errors
    ///
    /// Returns [`Error::GroupNotFound`] for an unknown group.
    pub fn names(&self, group: &str) -> Result<Vec<&str>> {
        Ok(self.group(group)?.keys().map(String::as_str).collect())
    }

    /// Iterate over every registered setting, group by group
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSetting> {
        self.groups.values().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Document with every definition and the overrides
    ///
    /// Settings holding their default carry no `value`, so a later change of
    /// the default is picked up when the document is loaded again.
    pub fn to_document(&self) -> SettingsDocument {
        let mut document = SettingsDocument::new();
        for setting in self.iter() {
            document.insert(&setting.definition, setting.value.clone());
        }
        document
    }
}

/// Register any number of definitions with a registry
///
/// This is the single entry point used both by hosts registering their own
/// settings and by provider functions discovered at startup. All definitions
/// are validated before any is inserted, so a failed call leaves the registry
/// untouched. Registering the same definitions twice has no further effect.
///
/// # Example
///
/// ```rust
/// use ndev_settings::{SettingDefinition, SettingsRegistry, register_settings};
///
/// let mut registry = SettingsRegistry::new();
/// register_settings(
///     &mut registry,
///     [
///         SettingDefinition::builder("auto_detect_reader", true)
///             .group("Reader")
///             .description("Automatically detect the best reader for each file type")
///             .build()?,
///         SettingDefinition::builder("default_tile_size", [512.0, 512.0])
///             .group("Performance")
///             .build()?,
///     ],
/// )?;
/// assert_eq!(registry.len(), 2);
/// # Ok::<(), ndev_settings::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidSettingMetadata`] for the first invalid definition.
pub fn register_settings<I>(registry: &mut SettingsRegistry, definitions: I) -> Result<()>
where
    I: IntoIterator<Item = SettingDefinition>,
{
    let definitions: Vec<SettingDefinition> = definitions.into_iter().collect();
    for definition in &definitions {
        definition.validate()?;
    }
    for definition in definitions {
        registry.insert(definition);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
