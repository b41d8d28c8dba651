//! Setting definitions and values
//!
//! # Overview
//!
//! A [`SettingDefinition`] is a pure declaration of one configurable value: its
//! group, name, default, description and constraints. Libraries build them with
//! [`SettingDefinition::builder`] and hand them to
//! [`register_settings`](crate::register_settings); the host reads the merged
//! result back through [`Settings`](crate::Settings).
//!
//! The widget kind ([`SettingType`]) is never declared directly. It is derived:
//!
//! - `choices` present: [`SettingType::Select`]
//! - `dynamic_choices` present: [`SettingType::DynamicSelect`]
//! - otherwise inferred from the default value (toggle, number, text, tuple)
//!
//! ```rust
//! use ndev_settings::{SettingDefinition, SettingType};
//!
//! let memory = SettingDefinition::builder("max_memory_usage_gb", 4.0)
//!     .group("Performance")
//!     .description("Maximum memory usage for image loading (GB)")
//!     .min(0.1)
//!     .max(64.0)
//!     .step(0.1)
//!     .build()?;
//! assert_eq!(memory.setting_type(), SettingType::Number);
//!
//! let level = SettingDefinition::builder("compression_level", "medium")
//!     .group("Export")
//!     .choices(["none", "low", "medium", "high", "maximum"])
//!     .build()?;
//! assert_eq!(level.setting_type(), SettingType::Select);
//!
//! let reader = SettingDefinition::dynamic_choice("preferred_reader", "bioio-ome-tiff", "bioio.readers")
//!     .group("Reader")
//!     .fallback_message("No bioio readers available")
//!     .build()?;
//! assert_eq!(reader.setting_type(), SettingType::DynamicSelect);
//! # Ok::<(), ndev_settings::Error>(())
//! ```
//!
//! # Validation
//!
//! `build()` rejects definitions where `min > max`, where both `choices` and
//! `dynamic_choices` are given, or where the default does not fit the kind
//! implied by the constraints (a numeric range with a string default, a choice
//! list with a boolean default, ...).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Group used when a definition does not name one
pub const DEFAULT_GROUP: &str = "External";

/// Option shown when a dynamic choice provider group is empty
pub const DEFAULT_FALLBACK_MESSAGE: &str = "No options available";

// =============================================================================
// Setting Values
// =============================================================================

/// A setting value: default, override, or candidate assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Fixed-length tuple of numbers, e.g. a `(height, width)` canvas size
    Tuple(Vec<f64>),
}

impl SettingValue {
    /// Human readable kind name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "boolean",
            SettingValue::Integer(_) | SettingValue::Float(_) => "number",
            SettingValue::Text(_) => "string",
            SettingValue::Tuple(_) => "tuple",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SettingValue::Integer(_) | SettingValue::Float(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value, widening integers
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Integer(n) => Some(*n as f64),
            SettingValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[f64]> {
        match self {
            SettingValue::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Setting type a value of this shape renders as, ignoring choice constraints
    fn inferred_type(&self) -> SettingType {
        match self {
            SettingValue::Bool(_) => SettingType::Toggle,
            SettingValue::Integer(_) | SettingValue::Float(_) => SettingType::Number,
            SettingValue::Text(_) => SettingType::Text,
            SettingValue::Tuple(_) => SettingType::Tuple,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Integer(n) => write!(f, "{n}"),
            SettingValue::Float(x) => write!(f, "{x}"),
            SettingValue::Text(s) => write!(f, "{s}"),
            SettingValue::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Integer(i64::from(value))
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

impl From<Vec<f64>> for SettingValue {
    fn from(value: Vec<f64>) -> Self {
        SettingValue::Tuple(value)
    }
}

impl<const N: usize> From<[f64; N]> for SettingValue {
    fn from(value: [f64; N]) -> Self {
        SettingValue::Tuple(value.to_vec())
    }
}

// =============================================================================
// Setting Types
// =============================================================================

/// Widget kind a setting renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    /// Boolean checkbox
    Toggle,
    /// Numeric spin box, optionally bounded
    Number,
    /// Free text
    Text,
    /// Combo box over a fixed list
    Select,
    /// Combo box over the providers currently installed in a group
    DynamicSelect,
    /// Tuple editor
    Tuple,
}

/// Choices computed from a provider group at lookup time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicChoices {
    /// Provider group whose entry names become the choices (e.g. `bioio.readers`)
    pub provider: String,
    /// Sole (disabled) option shown when the group is empty
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

impl DynamicChoices {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

// =============================================================================
// Setting Definition
// =============================================================================

/// Declaration of a single setting
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDefinition {
    /// Name, unique within the group
    pub name: String,
    /// Namespace the setting is displayed and looked up under
    pub group: String,
    pub default_value: SettingValue,
    pub description: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub step: Option<f64>,
    /// Static enumeration of allowed values
    pub choices: Option<Vec<String>>,
    /// Enumeration resolved from a provider group when read
    pub dynamic_choices: Option<DynamicChoices>,
}

impl SettingDefinition {
    /// Start building a definition in the default group
    pub fn builder(name: impl Into<String>, default: impl Into<SettingValue>) -> SettingDefinitionBuilder {
        SettingDefinitionBuilder::new(name, default)
    }

    /// Start building a setting whose choices are the providers of `provider_group`
    pub fn dynamic_choice(
        name: impl Into<String>,
        default: impl Into<String>,
        provider_group: impl Into<String>,
    ) -> SettingDefinitionBuilder {
        SettingDefinitionBuilder::new(name, default.into()).dynamic_choices(provider_group)
    }

    /// Fully qualified key, `Group.name`
    pub fn key(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }

    pub fn setting_type(&self) -> SettingType {
        if self.choices.is_some() {
            SettingType::Select
        } else if self.dynamic_choices.is_some() {
            SettingType::DynamicSelect
        } else {
            self.default_value.inferred_type()
        }
    }

    fn has_numeric_constraints(&self) -> bool {
        self.min_value.is_some() || self.max_value.is_some() || self.step.is_some()
    }

    /// Validate the definition itself
    ///
    /// Checks:
    /// - group and name are non-empty and contain no `.`
    /// - `choices` and `dynamic_choices` are not both present
    /// - numeric constraints imply a numeric default
    /// - `min <= max`, `step > 0`
    /// - choice settings have a string default (a member of `choices` when static)
    /// - the default satisfies the range
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let key = self.key();
        let invalid = |reason: String| Err(Error::invalid_definition(&key, reason));

        for (label, part) in [("group", &self.group), ("name", &self.name)] {
            if part.trim().is_empty() {
                return invalid(format!("{label} cannot be empty"));
            }
            if part.contains('.') {
                return invalid(format!("{label} '{part}' cannot contain '.'"));
            }
        }

        if self.choices.is_some() && self.dynamic_choices.is_some() {
            return invalid("choices and dynamic_choices are mutually exclusive".into());
        }

        if self.has_numeric_constraints() && !self.default_value.is_numeric() {
            return invalid(format!(
                "min/max/step require a numeric default, got {}",
                self.default_value.kind_name()
            ));
        }

        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                return invalid(format!("min ({min}) cannot be greater than max ({max})"));
            }
        }

        if let Some(step) = self.step {
            if step.is_nan() || step <= 0.0 {
                return invalid(format!("step must be positive, got {step}"));
            }
        }

        if let Some(ref choices) = self.choices {
            if choices.is_empty() {
                return invalid("choices cannot be empty".into());
            }
            match self.default_value.as_str() {
                Some(default) if choices.iter().any(|c| c == default) => {}
                Some(default) => {
                    return invalid(format!("default '{default}' is not one of the choices"));
                }
                None => {
                    return invalid(format!(
                        "choice settings require a string default, got {}",
                        self.default_value.kind_name()
                    ));
                }
            }
        }

        if let Some(ref dynamic) = self.dynamic_choices {
            if dynamic.provider.trim().is_empty() {
                return invalid("dynamic_choices provider cannot be empty".into());
            }
            if self.default_value.as_str().is_none() {
                return invalid(format!(
                    "choice settings require a string default, got {}",
                    self.default_value.kind_name()
                ));
            }
        }

        self.check_range(&self.default_value)
            .map_err(|reason| Error::invalid_definition(&key, format!("Default value is invalid: {reason}")))
    }

    /// Validate a candidate value against type, range and static choices
    ///
    /// Dynamic choice membership needs a resolver and is checked by
    /// [`Settings::set`](crate::Settings::set).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingValue`] when the value is rejected.
    pub fn validate_value(&self, value: &SettingValue) -> Result<()> {
        self.check_value(value)
            .map_err(|reason| Error::invalid_value(self.key(), reason))
    }

    /// Store integers as floats when the default is a float
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn normalize(&self, value: SettingValue) -> SettingValue {
        match (&self.default_value, value) {
            (SettingValue::Float(_), SettingValue::Integer(n)) => SettingValue::Float(n as f64),
            (_, value) => value,
        }
    }

    fn check_value(&self, value: &SettingValue) -> std::result::Result<(), String> {
        match self.setting_type() {
            SettingType::Toggle => {
                if value.as_bool().is_none() {
                    return Err(format!("Value must be a boolean, got {}", value.kind_name()));
                }
            }
            SettingType::Number => {
                if !value.is_numeric() {
                    return Err(format!("Value must be a number, got {}", value.kind_name()));
                }
                self.check_range(value)?;
            }
            SettingType::Text | SettingType::DynamicSelect => {
                if value.as_str().is_none() {
                    return Err(format!("Value must be a string, got {}", value.kind_name()));
                }
            }
            SettingType::Select => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("Value must be a string, got {}", value.kind_name()))?;
                let choices = self.choices.as_deref().unwrap_or_default();
                if !choices.iter().any(|c| c == text) {
                    return Err(format!(
                        "'{text}' is not one of the available options: {}",
                        choices.join(", ")
                    ));
                }
            }
            SettingType::Tuple => {
                let items = value
                    .as_tuple()
                    .ok_or_else(|| format!("Value must be a tuple, got {}", value.kind_name()))?;
                let expected = self.default_value.as_tuple().map_or(0, <[f64]>::len);
                if items.len() != expected {
                    return Err(format!(
                        "Tuple must have {expected} elements, got {}",
                        items.len()
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_range(&self, value: &SettingValue) -> std::result::Result<(), String> {
        let Some(num) = value.as_f64() else {
            return Ok(());
        };
        if let Some(min) = self.min_value {
            if num < min {
                return Err(format!("Value must be at least {min}"));
            }
        }
        if let Some(max) = self.max_value {
            if num > max {
                return Err(format!("Value must be at most {max}"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent builder for [`SettingDefinition`]
#[derive(Debug, Clone)]
pub struct SettingDefinitionBuilder {
    definition: SettingDefinition,
}

impl SettingDefinitionBuilder {
    pub fn new(name: impl Into<String>, default: impl Into<SettingValue>) -> Self {
        Self {
            definition: SettingDefinition {
                name: name.into(),
                group: DEFAULT_GROUP.to_string(),
                default_value: default.into(),
                description: String::new(),
                min_value: None,
                max_value: None,
                step: None,
                choices: None,
                dynamic_choices: None,
            },
        }
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.definition.group = group.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    #[must_use]
    pub fn min(mut self, val: f64) -> Self {
        self.definition.min_value = Some(val);
        self
    }

    #[must_use]
    pub fn max(mut self, val: f64) -> Self {
        self.definition.max_value = Some(val);
        self
    }

    #[must_use]
    pub fn step(mut self, val: f64) -> Self {
        self.definition.step = Some(val);
        self
    }

    /// Restrict the value to a fixed list of strings
    #[must_use]
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict the value to the providers registered under `provider_group`
    #[must_use]
    pub fn dynamic_choices(mut self, provider_group: impl Into<String>) -> Self {
        self.definition.dynamic_choices = Some(DynamicChoices::new(provider_group));
        self
    }

    /// Message shown when the dynamic provider group is empty
    ///
    /// Has no effect unless [`dynamic_choices`](Self::dynamic_choices) was set.
    #[must_use]
    pub fn fallback_message(mut self, message: impl Into<String>) -> Self {
        if let Some(dynamic) = self.definition.dynamic_choices.take() {
            self.definition.dynamic_choices = Some(dynamic.fallback_message(message));
        }
        self
    }

    /// Validate and produce the definition
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSettingMetadata`] if the definition is inconsistent.
    pub fn build(self) -> Result<SettingDefinition> {
        self.definition.validate()?;
        Ok(self.definition)
    }
}

// =============================================================================
// Tests
// =============================================================================
