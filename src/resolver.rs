//! Dynamic choice resolution
//!
//! A dynamic choice setting lists whatever providers are installed under a
//! group at the moment it is read. Nothing is cached: each call asks the
//! [`ProviderSource`] again.

use crate::config::DynamicChoices;
use crate::providers::ProviderSource;
use log::warn;
use serde::Serialize;
use std::sync::Arc;

/// Options a UI should render for a choice setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOptions {
    pub options: Vec<String>,
    /// `false` when the only option is the fallback message
    pub enabled: bool,
}

impl ChoiceOptions {
    pub(crate) fn enabled(options: Vec<String>) -> Self {
        Self {
            options,
            enabled: true,
        }
    }

    pub(crate) fn fallback(message: &str) -> Self {
        Self {
            options: vec![message.to_string()],
            enabled: false,
        }
    }
}

/// Computes the current choices of dynamic choice settings
#[derive(Clone)]
pub struct ChoiceResolver {
    source: Arc<dyn ProviderSource>,
}

impl ChoiceResolver {
    pub fn new(source: Arc<dyn ProviderSource>) -> Self {
        Self { source }
    }

    /// Names of the providers installed under `group`, in enumeration order
    ///
    /// Duplicate names keep their first position. A source failure yields an
    /// empty list.
    pub fn resolve(&self, group: &str) -> Vec<String> {
        let entries = match self.source.providers(group) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not enumerate providers in {group}: {e}");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !names.contains(&entry.name) {
                names.push(entry.name);
            }
        }
        names
    }

    /// Display options, falling back to a single disabled message
    pub fn options(&self, dynamic: &DynamicChoices) -> ChoiceOptions {
        let names = self.resolve(&dynamic.provider);
        if names.is_empty() {
            ChoiceOptions::fallback(&dynamic.fallback_message)
        } else {
            ChoiceOptions::enabled(names)
        }
    }
}

impl std::fmt::Debug for ChoiceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoiceResolver").finish_non_exhaustive()
    }
}
