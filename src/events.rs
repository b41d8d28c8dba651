//! Change listeners and value validators
//!
//! Keys are dotted `"Group.name"` strings. Listeners fire only when a stored
//! value actually changes, after the registry lock has been released, so a
//! callback may read settings again.

use crate::config::SettingValue;
use crate::sync::RwLockExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// Callback receiving (`key`, `old_value`, `new_value`)
pub type ChangeCallback = Arc<dyn Fn(&str, &SettingValue, &SettingValue) + Send + Sync>;

/// Host-supplied check run before a value is stored
pub type Validator = Arc<dyn Fn(&SettingValue) -> Result<(), String> + Send + Sync>;

/// Manages event listeners for settings changes
pub struct EventManager {
    /// Called for every change
    global_listeners: RwLock<Vec<ChangeCallback>>,

    /// Called only for their own key
    key_listeners: RwLock<HashMap<String, Vec<ChangeCallback>>>,

    validators: RwLock<HashMap<String, Vec<Validator>>>,
}

impl EventManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_listeners: RwLock::new(Vec::new()),
            key_listeners: RwLock::new(HashMap::new()),
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Register a listener called for every setting change
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&str, &SettingValue, &SettingValue) + Send + Sync + 'static,
    {
        self.global_listeners
            .write_recovered()
            .push(Arc::new(callback));
    }

    /// Register a listener for one setting key (e.g. `"Reader.preferred_reader"`)
    pub fn watch<F>(&self, key: &str, callback: F)
    where
        F: Fn(&str, &SettingValue, &SettingValue) + Send + Sync + 'static,
    {
        self.key_listeners
            .write_recovered()
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Register an extra validator for one setting key
    ///
    /// Validators run after the definition's own checks; the first error
    /// rejects the update.
    pub fn add_validator<F>(&self, key: &str, validator: F)
    where
        F: Fn(&SettingValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .write_recovered()
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(validator));
    }

    /// Run the validators registered for `key`
    ///
    /// # Errors
    ///
    /// Returns the first validator's error message.
    pub fn validate(&self, key: &str, value: &SettingValue) -> Result<(), String> {
        let validators = self
            .validators
            .read_recovered()
            .get(key)
            .cloned()
            .unwrap_or_default();

        validators.iter().try_for_each(|validator| validator(value))
    }

    /// Notify listeners about a change
    pub fn notify(&self, key: &str, old_value: &SettingValue, new_value: &SettingValue) {
        // Snapshot the callbacks so a listener may register others
        let global: Vec<ChangeCallback> = self.global_listeners.read_recovered().clone();
        let keyed: Vec<ChangeCallback> = self
            .key_listeners
            .read_recovered()
            .get(key)
            .cloned()
            .unwrap_or_default();

        for callback in global.iter().chain(keyed.iter()) {
            callback(key, old_value, new_value);
        }
    }

    /// Remove all listeners for a specific key
    pub fn unwatch(&self, key: &str) {
        self.key_listeners.write_recovered().remove(key);
    }

    /// Clear all listeners (validators stay registered)
    pub fn clear(&self) {
        self.global_listeners.write_recovered().clear();
        self.key_listeners.write_recovered().clear();
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("global_listeners", &self.global_listeners.read_recovered().len())
            .field("key_listeners", &self.key_listeners.read_recovered().len())
            .field("validators", &self.validators.read_recovered().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
