//! Provider discovery
//!
//! Installed libraries contribute to the settings system through named
//! provider groups. The core never enumerates plugins itself: a
//! [`ProviderSource`] supplied by the host yields `(name, provider)` pairs for a
//! group, and the discovery and dynamic choice code work only against that
//! trait.
//!
//! Two groups are consumed during discovery:
//!
//! - [`REGISTRATION_GROUP`]: entries are [`Provider::Registration`] functions
//!   that register definitions with a [`SettingsRegistry`]
//! - [`YAML_GROUP`]: entries are [`Provider::YamlPath`] functions returning the
//!   path of a settings document
//!
//! Any other group (e.g. `bioio.readers`) is only enumerated by name, to build
//! the choices of dynamic choice settings.
//!
//! Two sources ship with the crate:
//!
//! - [`StaticProviderSource`]: an in-memory list the host fills in code
//! - [`ManifestProviderSource`]: one YAML manifest per installed plugin in a directory

mod manifest;
mod static_source;

pub use manifest::ManifestProviderSource;
pub use static_source::StaticProviderSource;

use crate::error::Result;
use crate::registry::SettingsRegistry;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Group of registration-function providers
pub const REGISTRATION_GROUP: &str = "ndev_settings.providers";

/// Group of YAML-document providers
pub const YAML_GROUP: &str = "ndev_settings.yaml_providers";

/// Function registering settings with the registry it is handed
pub type RegistrationFn = Arc<dyn Fn(&mut SettingsRegistry) -> Result<()> + Send + Sync>;

/// Function returning the path of a settings document
pub type YamlPathFn = Arc<dyn Fn() -> Result<PathBuf> + Send + Sync>;

/// What a provider entry contributes when loaded
#[derive(Clone)]
pub enum Provider {
    /// Registers definitions through [`register_settings`](crate::register_settings)
    Registration(RegistrationFn),
    /// Points at a YAML settings document
    YamlPath(YamlPathFn),
    /// Contributes nothing but its name (e.g. an installed image reader)
    Named,
}

impl Provider {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Provider::Registration(_) => "registration function",
            Provider::YamlPath(_) => "YAML document",
            Provider::Named => "named plugin",
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// One provider registered under a group
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    /// Identifier of the provider; doubles as the choice value for dynamic choices
    pub name: String,
    pub provider: Provider,
}

impl ProviderEntry {
    /// An entry contributing only its name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: Provider::Named,
        }
    }

    /// An entry whose function registers settings
    pub fn registration<F>(name: impl Into<String>, register: F) -> Self
    where
        F: Fn(&mut SettingsRegistry) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            provider: Provider::Registration(Arc::new(register)),
        }
    }

    /// An entry whose function returns the path of a settings document
    pub fn yaml<F>(name: impl Into<String>, locate: F) -> Self
    where
        F: Fn() -> Result<PathBuf> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            provider: Provider::YamlPath(Arc::new(locate)),
        }
    }

    /// An entry pointing at a fixed settings document
    pub fn yaml_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::yaml(name, move || Ok(path.clone()))
    }
}

/// Enumerates the providers installed under a group
///
/// Implementations decide the enumeration order; discovery applies providers
/// in exactly the order returned. Every call should reflect the current set
/// of installed plugins.
pub trait ProviderSource: Send + Sync {
    /// List the providers registered under `group`
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying plugin metadata cannot be read.
    fn providers(&self, group: &str) -> Result<Vec<ProviderEntry>>;
}

impl<T: ProviderSource + ?Sized> ProviderSource for Arc<T> {
    fn providers(&self, group: &str) -> Result<Vec<ProviderEntry>> {
        (**self).providers(group)
    }
}
