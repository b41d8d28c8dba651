//! Documentation generator for registered settings
//!
//! Renders a markdown reference of every setting: its group, type, default,
//! constraints and choices.

use crate::config::{SettingType, SettingValue};
use crate::settings::{SettingInfo, Settings};
use crate::storage::StorageBackend;
use std::fmt::Write;

/// Configuration for docs generation
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    /// Title for the documentation
    pub title: Option<String>,
    /// Description/introduction text
    pub description: Option<String>,
    /// Include the value currently in effect next to the default
    pub show_current: bool,
    /// One section per group instead of a flat list
    pub group_sections: bool,
}

impl DocsConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            group_sections: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    #[must_use]
    pub fn with_current_values(mut self) -> Self {
        self.show_current = true;
        self
    }

    #[must_use]
    pub fn flat(mut self) -> Self {
        self.group_sections = false;
        self
    }
}

/// Generate markdown documentation for every registered setting
#[must_use]
pub fn generate_docs<S: StorageBackend>(settings: &Settings<S>, config: DocsConfig) -> String {
    generate_docs_from_metadata(&settings.metadata(), config)
}

/// Generate docs from a metadata snapshot, in the order given
#[must_use]
pub fn generate_docs_from_metadata(metadata: &[SettingInfo], config: DocsConfig) -> String {
    let mut output = String::new();

    let title = config
        .title
        .unwrap_or_else(|| "Settings Reference".to_string());
    let _ = writeln!(output, "# {title}\n");

    if let Some(desc) = config.description {
        let _ = writeln!(output, "{desc}\n");
    }

    if config.group_sections {
        let mut current_group: Option<&str> = None;
        for info in metadata {
            let group = info.definition.group.as_str();
            if current_group != Some(group) {
                let _ = writeln!(output, "\n## {group}\n");
                current_group = Some(group);
            }
            format_setting(&mut output, info, config.show_current);
        }
    } else {
        output.push_str("## Settings\n\n");
        for info in metadata {
            format_setting(&mut output, info, config.show_current);
        }
    }

    output
}

fn format_setting(out: &mut String, info: &SettingInfo, show_current: bool) {
    let definition = &info.definition;
    let _ = writeln!(out, "### `{}.{}`\n", definition.group, definition.name);

    if !definition.description.is_empty() {
        let _ = writeln!(out, "{}\n", definition.description);
    }

    out.push_str("| Property | Value |\n");
    out.push_str("|----------|-------|\n");
    let _ = writeln!(out, "| **Type** | {} |", format_type(info.setting_type));
    let _ = writeln!(out, "| **Default** | `{}` |", format_value(&definition.default));
    if show_current && !info.is_default {
        let _ = writeln!(out, "| **Current** | `{}` |", format_value(&info.value));
    }

    match (definition.min, definition.max) {
        (Some(min), Some(max)) => {
            let _ = writeln!(out, "| **Range** | {min} - {max} |");
        }
        (Some(min), None) => {
            let _ = writeln!(out, "| **Minimum** | {min} |");
        }
        (None, Some(max)) => {
            let _ = writeln!(out, "| **Maximum** | {max} |");
        }
        (None, None) => {}
    }
    if let Some(step) = definition.step {
        let _ = writeln!(out, "| **Step** | {step} |");
    }

    out.push('\n');

    if let Some(options) = &info.options {
        if options.enabled {
            out.push_str("**Options:**\n\n");
            for option in &options.options {
                let _ = writeln!(out, "- `{option}`");
            }
        } else {
            let _ = writeln!(out, "**Options:** _{}_", options.options.join(", "));
        }
        out.push('\n');
    }

    out.push_str("---\n\n");
}

fn format_type(t: SettingType) -> &'static str {
    match t {
        SettingType::Toggle => "Boolean",
        SettingType::Number => "Number",
        SettingType::Text => "String",
        SettingType::Select => "Select",
        SettingType::DynamicSelect => "Select (installed plugins)",
        SettingType::Tuple => "Tuple",
    }
}

fn format_value(v: &SettingValue) -> String {
    match v {
        SettingValue::Text(s) => format!("\"{s}\""),
        other => other.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
