use crate::document::SettingsDocument;
use crate::error::Result;
use crate::storage::StorageBackend;
use crate::sync::RwLockExt;

use log::info;
use std::path::PathBuf;

use super::Settings;

impl<S: StorageBackend> Settings<S> {
    /// Path of the user settings file written by [`save`](Self::save)
    pub fn settings_path(&self) -> PathBuf {
        self.config.settings_path()
    }

    /// Document with every definition, its constraints and any override
    pub fn to_document(&self) -> SettingsDocument {
        self.registry.read_recovered().to_document()
    }

    /// Write every setting to the user settings file.
    ///
    /// Values changed through [`set`](Self::set) or the reset methods live in
    /// memory until this is called. Only overrides carry a `value`; the saved
    /// definitions are used on the next start just for settings no other source
    /// declares. The file is written atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        let path = self.settings_path();
        let document = self.to_document();
        document.save(&self.config.storage, &path)?;
        info!("Saved {} settings to {}", document.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Settings;
    use crate::config::{SettingDefinition, SettingValue};
    use tempfile::tempdir;

    fn scene_handling() -> SettingDefinition {
        SettingDefinition::builder("scene_handling", "Open Scene Widget")
            .group("Reader")
            .choices(["Open Scene Widget", "View All Scenes", "View First Scene Only"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_save_and_reload_keeps_values() {
        let dir = tempdir().unwrap();
        let settings = Settings::builder("ndev-test")
            .config_dir(dir.path())
            .with_settings([scene_handling()])
            .build()
            .unwrap();
        settings.set("Reader", "scene_handling", "View All Scenes").unwrap();
        settings.save().unwrap();
        assert!(settings.settings_path().exists());

        let reloaded = Settings::builder("ndev-test")
            .config_dir(dir.path())
            .with_settings([scene_handling()])
            .build()
            .unwrap();
        assert_eq!(
            reloaded.get("Reader", "scene_handling").unwrap(),
            SettingValue::from("View All Scenes")
        );
        assert!(reloaded.discovery_warnings().is_empty());
    }

    #[test]
    fn test_set_does_not_write() {
        let dir = tempdir().unwrap();
        let settings = Settings::builder("ndev-test")
            .config_dir(dir.path())
            .with_settings([scene_handling()])
            .build()
            .unwrap();

        settings.set("Reader", "scene_handling", "View All Scenes").unwrap();
        assert!(!settings.settings_path().exists());
    }

    #[test]
    fn test_to_document_round_trips_definitions() {
        let dir = tempdir().unwrap();
        let settings = Settings::builder("ndev-test")
            .config_dir(dir.path())
            .with_settings([scene_handling()])
            .build()
            .unwrap();

        let yaml = settings.to_document().to_yaml().unwrap();
        let parsed = crate::SettingsDocument::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.definitions().unwrap(), vec![scene_handling()]);
    }
}
