//! Merging settings from every source at startup
//!
//! Sources are applied in precedence order; each later source may replace a
//! definition an earlier one registered:
//!
//! 1. definitions saved in the user settings file, then the bundled default document
//! 2. YAML documents from the YAML provider group
//! 3. registration functions from the registration provider group
//!
//! Direct registrations made through the builder come next and are applied by
//! the caller. The user file only declares settings no other source declares
//! any more; its `value`s are applied in [`Discovery::finish`], after every
//! definition is known, and dropped when the current definition rejects them.
//!
//! Problems in the stages above never abort discovery: the offending source is
//! skipped as a unit and a [`DiscoveryWarning`] recorded.

use crate::config::{SettingValue, SettingsConfig};
use crate::document::SettingsDocument;
use crate::error::Result;
use crate::providers::{Provider, ProviderEntry, ProviderSource};
use crate::registry::{SettingsRegistry, register_settings};
use crate::storage::{StorageBackend, YamlStorage};
use log::{debug, info, warn};
use std::fmt;

/// A settings source skipped during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    /// Where the provider came from: a provider group or a document label
    pub source: String,
    /// Provider or document that was skipped
    pub provider: String,
    pub reason: String,
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.source, self.provider, self.reason)
    }
}

/// Label used for the bundled default document
pub(crate) const DEFAULT_DOCUMENT_SOURCE: &str = "default document";

/// Label used for the user settings file
pub(crate) const USER_FILE_SOURCE: &str = "user settings";

/// Stored user value waiting for every definition to be registered
type PendingValue = (String, String, SettingValue);

/// Registry under construction plus the warnings gathered so far
pub(crate) struct Discovery<'a> {
    source: &'a dyn ProviderSource,
    registry: SettingsRegistry,
    warnings: Vec<DiscoveryWarning>,
    user_values: Vec<PendingValue>,
}

impl<'a> Discovery<'a> {
    pub(crate) fn new(source: &'a dyn ProviderSource) -> Self {
        Self {
            source,
            registry: SettingsRegistry::new(),
            warnings: Vec::new(),
            user_values: Vec::new(),
        }
    }

    /// Run every discovery stage for `config`
    pub(crate) fn run<S: StorageBackend>(mut self, config: &SettingsConfig<S>) -> Self {
        self.load_user_file(config);

        if let Some(yaml) = &config.default_document {
            self.apply_document(
                DEFAULT_DOCUMENT_SOURCE,
                &config.app_name,
                SettingsDocument::from_yaml(yaml),
            );
        }

        for entry in self.enumerate(&config.yaml_group) {
            self.load_yaml_provider(&config.yaml_group, entry);
        }

        for entry in self.enumerate(&config.registration_group) {
            self.run_registration(&config.registration_group, entry);
        }

        info!(
            "Discovered {} settings in {} groups ({} skipped sources)",
            self.registry.len(),
            self.registry.groups().len(),
            self.warnings.len()
        );
        self
    }

    /// Apply the stored user values and hand back the merged registry
    pub(crate) fn finish(mut self) -> (SettingsRegistry, Vec<DiscoveryWarning>) {
        for (group, name, value) in std::mem::take(&mut self.user_values) {
            if let Err(e) = self.registry.set_value(&group, &name, value) {
                warn!("Ignoring stored value for {group}.{name}: {e}");
            }
        }
        (self.registry, self.warnings)
    }

    pub(crate) fn registry_mut(&mut self) -> &mut SettingsRegistry {
        &mut self.registry
    }

    /// Register the user file's definitions as fallbacks and keep its values for later
    fn load_user_file<S: StorageBackend>(&mut self, config: &SettingsConfig<S>) {
        let path = config.settings_path();
        let label = path.display().to_string();
        let document = match SettingsDocument::load(&config.storage, &path) {
            Ok(Some(document)) => document,
            Ok(None) => return,
            Err(e) => return self.warn(USER_FILE_SOURCE, &label, e),
        };

        match document
            .definitions()
            .and_then(|definitions| register_settings(&mut self.registry, definitions))
        {
            Ok(()) => debug!("Loaded {} saved settings from {label}", document.len()),
            Err(e) => self.warn(USER_FILE_SOURCE, &label, e),
        }

        self.user_values = document
            .values()
            .map(|(group, name, value)| (group.to_string(), name.to_string(), value.clone()))
            .collect();
    }

    fn enumerate(&mut self, group: &str) -> Vec<ProviderEntry> {
        match self.source.providers(group) {
            Ok(entries) => {
                debug!("{} providers in {group}", entries.len());
                entries
            }
            Err(e) => {
                self.warn(group, "*", e);
                Vec::new()
            }
        }
    }

    fn load_yaml_provider(&mut self, group: &str, entry: ProviderEntry) {
        let Provider::YamlPath(locate) = &entry.provider else {
            let reason = format!("expected a YAML document, found a {}", entry.provider.kind());
            self.warn(group, &entry.name, reason);
            return;
        };

        let path = match locate() {
            Ok(path) => path,
            Err(e) => return self.warn(group, &entry.name, e),
        };

        let document = match SettingsDocument::load(&YamlStorage::new(), &path) {
            Ok(Some(document)) => Ok(document),
            Ok(None) => {
                let reason = format!("settings file not found: {}", path.display());
                return self.warn(group, &entry.name, reason);
            }
            Err(e) => Err(e),
        };
        self.apply_document(group, &entry.name, document);
    }

    fn run_registration(&mut self, group: &str, entry: ProviderEntry) {
        let Provider::Registration(register) = &entry.provider else {
            let reason = format!(
                "expected a registration function, found a {}",
                entry.provider.kind()
            );
            self.warn(group, &entry.name, reason);
            return;
        };

        let mut staged = SettingsRegistry::new();
        match register(&mut staged) {
            Ok(()) => {
                debug!("Provider '{}' registered {} settings", entry.name, staged.len());
                self.registry.merge(staged);
            }
            Err(e) => self.warn(group, &entry.name, e),
        }
    }

    fn apply_document(&mut self, source: &str, provider: &str, document: Result<SettingsDocument>) {
        let registered = document.and_then(|document| self.registry.register_document(&document));
        match registered {
            Ok(count) => debug!("Loaded {count} settings from {provider} ({source})"),
            Err(e) => self.warn(source, provider, e),
        }
    }

    fn warn(&mut self, source: &str, provider: &str, reason: impl ToString) {
        let warning = DiscoveryWarning {
            source: source.to_string(),
            provider: provider.to_string(),
            reason: reason.to_string(),
        };
        warn!("Skipping settings source {warning}");
        self.warnings.push(warning);
    }
}
