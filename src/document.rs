//! YAML settings documents
//!
//! A settings document maps group names to settings, and each setting to its
//! declaration plus (optionally) its current value:
//!
//! ```yaml
//! Export:
//!   canvas_scale:
//!     default: 1.0
//!     description: Scales exported figures and screenshots by this value
//!     value: 2.0
//!     min: 0.1
//!     max: 100.0
//! Reader:
//!   preferred_reader:
//!     default: bioio-ome-tiff
//!     description: Preferred reader to use when opening images
//!     dynamic_choices:
//!       provider: bioio.readers
//!       fallback_message: No readers found
//! ```
//!
//! The same schema is used for the bundled defaults, the user settings file
//! and documents contributed by YAML providers. Unknown fields are ignored.

use crate::config::{DynamicChoices, SettingDefinition, SettingValue};
use crate::error::{Error, Result};
use crate::storage::{StorageBackend, YamlStorage};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// One setting as written in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub default: SettingValue,

    #[serde(default)]
    pub description: String,

    /// Current value, when the document carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SettingValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_choices: Option<DynamicChoices>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl SettingEntry {
    /// Build the entry for a definition, optionally carrying a current value
    pub fn from_definition(definition: &SettingDefinition, value: Option<SettingValue>) -> Self {
        Self {
            default: definition.default_value.clone(),
            description: definition.description.clone(),
            value,
            choices: definition.choices.clone(),
            dynamic_choices: definition.dynamic_choices.clone(),
            min: definition.min_value,
            max: definition.max_value,
            step: definition.step,
        }
    }

    /// Convert into a validated definition
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`] if the entry is inconsistent.
    pub fn to_definition(&self, group: &str, name: &str) -> Result<SettingDefinition> {
        let definition = SettingDefinition {
            name: name.to_string(),
            group: group.to_string(),
            default_value: self.default.clone(),
            description: self.description.clone(),
            min_value: self.min,
            max_value: self.max,
            step: self.step,
            choices: self.choices.clone(),
            dynamic_choices: self.dynamic_choices.clone(),
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// A `value` field that was put back to its `default`
///
/// Values are kept as the YAML nodes found in the file, so resets of
/// entries the settings schema does not understand are still reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueReset {
    pub group: String,
    pub name: String,
    pub from: serde_yaml::Value,
    pub to: serde_yaml::Value,
}

impl fmt::Display for ValueReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reset {}.{} from {} to {}",
            self.group,
            self.name,
            inline_yaml(&self.from),
            inline_yaml(&self.to)
        )
    }
}

/// Single-line rendering of a YAML node: `2.5`, `bioio-czi`, `[1024, 1024]`
fn inline_yaml(node: &Value) -> String {
    match node {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => {
            let parts: Vec<String> = items.iter().map(inline_yaml).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Mapping(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", inline_yaml(k), inline_yaml(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, inline_yaml(&tagged.value)),
    }
}

/// Settings document: group name -> setting name -> entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsDocument {
    pub groups: BTreeMap<String, BTreeMap<String, SettingEntry>>,
}

impl SettingsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document declaring the given definitions, without values
    pub fn from_definitions<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = &'a SettingDefinition>,
    {
        let mut document = Self::new();
        for definition in definitions {
            document.insert(definition, None);
        }
        document
    }

    /// Parse a document; an empty or `null` document has no groups
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if the text is not a settings document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let groups: Option<BTreeMap<String, BTreeMap<String, SettingEntry>>> =
            serde_yaml::from_str(content)?;
        Ok(Self {
            groups: groups.unwrap_or_default(),
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Error::from)
    }

    /// Read a document from disk, returning `None` when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load<S: StorageBackend>(storage: &S, path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No settings document at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Some(Self::new()));
        }
        let groups: Option<BTreeMap<String, BTreeMap<String, SettingEntry>>> =
            storage.deserialize(&content)?;
        Ok(Some(Self {
            groups: groups.unwrap_or_default(),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn save<S: StorageBackend>(&self, storage: &S, path: &Path) -> Result<()> {
        storage.write(path, self)
    }

    /// Add or replace the entry for a definition
    pub fn insert(&mut self, definition: &SettingDefinition, value: Option<SettingValue>) {
        self.groups
            .entry(definition.group.clone())
            .or_default()
            .insert(
                definition.name.clone(),
                SettingEntry::from_definition(definition, value),
            );
    }

    pub fn get(&self, group: &str, name: &str) -> Option<&SettingEntry> {
        self.groups.get(group).and_then(|settings| settings.get(name))
    }

    /// Number of settings across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert every entry into a validated definition
    ///
    /// # Errors
    ///
    /// Fails on the first invalid entry; a document is accepted or rejected as a whole.
    pub fn definitions(&self) -> Result<Vec<SettingDefinition>> {
        self.groups
            .iter()
            .flat_map(|(group, settings)| {
                settings
                    .iter()
                    .map(move |(name, entry)| entry.to_definition(group, name))
            })
            .collect()
    }

    /// Iterate over `(group, name, value)` for entries carrying a value
    pub fn values(&self) -> impl Iterator<Item = (&str, &str, &SettingValue)> {
        self.groups.iter().flat_map(|(group, settings)| {
            settings.iter().filter_map(move |(name, entry)| {
                entry
                    .value
                    .as_ref()
                    .map(|value| (group.as_str(), name.as_str(), value))
            })
        })
    }
}

/// Set every `value` that differs from its `default` back to the default
///
/// Works on the raw YAML tree so that everything except the reset `value`
/// nodes is kept as written: unknown fields, key order and number formats.
/// Entries lacking either `default` or `value` are left alone. Integers and
/// floats compare by numeric value, so `1` and `1.0` are the same.
pub fn reset_values(document: &mut Value) -> Vec<ValueReset> {
    let mut resets = Vec::new();
    let Some(groups) = document.as_mapping_mut() else {
        return resets;
    };

    for (group, settings) in groups.iter_mut() {
        let Some(settings) = settings.as_mapping_mut() else {
            continue;
        };
        for (name, entry) in settings.iter_mut() {
            let Some(entry) = entry.as_mapping_mut() else {
                continue;
            };
            let (Some(default), Some(current)) = (entry.get("default"), entry.get("value")) else {
                continue;
            };
            if same_node(default, current) {
                continue;
            }

            let default = default.clone();
            resets.push(ValueReset {
                group: inline_yaml(group),
                name: inline_yaml(name),
                from: current.clone(),
                to: default.clone(),
            });
            entry.insert(Value::from("value"), default);
        }
    }
    resets
}

fn same_node(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        (Value::Sequence(xs), Value::Sequence(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_node(x, y))
        }
        _ => a == b,
    }
}

/// Reset all `value` fields to their `default` in a settings file
///
/// The file is rewritten only when something changed. Returns the resets that
/// were applied; an empty list means the file was left untouched.
///
/// # Errors
///
/// Returns [`Error::FileRead`] when the file is missing or unreadable, or
/// [`Error::Yaml`] if it is not valid YAML.
pub fn reset_values_in_file(path: &Path) -> Result<Vec<ValueReset>> {
    let storage = YamlStorage::new();
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut document: Value = if content.trim().is_empty() {
        Value::Null
    } else {
        storage.deserialize(&content)?
    };

    let resets = reset_values(&mut document);
    if !resets.is_empty() {
        storage.write(path, &document)?;
        info!(
            "Reset {} value(s) to defaults in {}",
            resets.len(),
            path.display()
        );
    }
    Ok(resets)
}

// =============================================================================
// Tests
// =============================================================================
