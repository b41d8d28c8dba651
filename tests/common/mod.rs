//! Common test utilities for ndev-settings integration tests
//!
//! Provides plugin fixtures modelled on real imaging libraries, a temporary
//! settings directory, and helper functions.

#![allow(dead_code)]

use ndev_settings::{
    ProviderEntry, Result, SettingDefinition, Settings, SettingsBuilder, SettingsDocument,
    SettingsRegistry, StaticProviderSource, register_settings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// Plugin Fixtures
// =============================================================================

/// Registration function shipped by the bioio plugin
pub fn register_bioio_settings(registry: &mut SettingsRegistry) -> Result<()> {
    register_settings(
        registry,
        [
            SettingDefinition::dynamic_choice("preferred_reader", "bioio-ome-tiff", "bioio.readers")
                .group("Reader")
                .description("Preferred reader to use when opening images")
                .fallback_message("No bioio readers available")
                .build()?,
            SettingDefinition::builder("auto_detect_reader", true)
                .group("Reader")
                .description("Automatically detect the best reader for each file type")
                .build()?,
            SettingDefinition::builder("max_memory_usage_gb", 4.0)
                .group("Performance")
                .description("Maximum memory usage for image loading (GB)")
                .min(0.1)
                .max(64.0)
                .step(0.1)
                .build()?,
            SettingDefinition::builder("compression_level", "medium")
                .group("Export")
                .description("Default compression level for saved images")
                .choices(["none", "low", "medium", "high", "maximum"])
                .build()?,
        ],
    )
}

/// Registration function shipped by the ndevio plugin
pub fn register_ndevio_settings(registry: &mut SettingsRegistry) -> Result<()> {
    register_settings(
        registry,
        [
            SettingDefinition::dynamic_choice("preferred_export_format", "ome-tiff", "ndevio.writers")
                .group("Export")
                .description("Preferred format for exporting images")
                .fallback_message("No export formats available")
                .build()?,
            SettingDefinition::builder("default_tile_size", [512.0, 512.0])
                .group("Performance")
                .description("Default tile size for tiled images (height, width)")
                .build()?,
            SettingDefinition::builder("preserve_original_metadata", true)
                .group("Export")
                .description("Preserve original image metadata when possible")
                .build()?,
        ],
    )
}

/// Settings document shipped by an OME-Zarr reader plugin
pub const BIOIO_OME_ZARR_YAML: &str = r"
BioioOmeZarr:
  chunk_size:
    default: [1024, 1024]
    description: Chunk size for reading
  compression:
    default: lz4
    description: Compression codec
    choices: [blosc, lz4, gzip]
  parallel_read:
    default: true
    description: Read chunks in parallel
";

/// Settings document shipped by a microscopy plugin
pub const MICROSCOPY_YAML: &str = r"
Microscopy:
  objective_correction:
    default: true
    description: Apply objective correction
  pixel_size_um:
    default: 0.1
    description: Pixel size in micrometres
    min: 0.001
    max: 100.0
  illumination_correction:
    default: flatfield
    description: Illumination correction method
";

// =============================================================================
// Test Fixtures
// =============================================================================

/// Temporary config directory plus a provider source tests can install into
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub plugins: Arc<StaticProviderSource>,
}

impl TestFixture {
    /// Fixture with no plugins installed
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            plugins: Arc::new(StaticProviderSource::new()),
        }
    }

    /// Fixture with the bioio and ndevio plugins and a few readers installed
    pub fn with_plugins() -> Self {
        let fixture = Self::new();
        fixture.install_registration("bioio", register_bioio_settings);
        fixture.install_registration("ndevio", register_ndevio_settings);
        for reader in ["bioio-ome-tiff", "bioio-czi", "bioio-tifffile"] {
            fixture.install_plugin("bioio.readers", reader);
        }
        fixture
    }

    pub fn install_plugin(&self, group: &str, name: &str) {
        self.plugins.install(group, ProviderEntry::named(name));
    }

    pub fn install_registration<F>(&self, name: &str, register: F)
    where
        F: Fn(&mut SettingsRegistry) -> Result<()> + Send + Sync + 'static,
    {
        self.plugins.install(
            ndev_settings::REGISTRATION_GROUP,
            ProviderEntry::registration(name, register),
        );
    }

    /// Write a YAML document into the fixture dir and register it as a YAML provider
    pub fn install_yaml(&self, name: &str, content: &str) -> PathBuf {
        let path = self.write_file(&format!("{name}.yaml"), content);
        self.plugins.install(
            ndev_settings::YAML_GROUP,
            ProviderEntry::yaml_file(name, path.clone()),
        );
        path
    }

    pub fn write_file(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(file_name);
        std::fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Builder pointed at the fixture dir and its provider source
    pub fn builder(&self) -> SettingsBuilder {
        Settings::builder("ndev-test")
            .config_dir(self.temp_dir.path())
            .provider_source(self.plugins.clone())
    }

    /// Settings with the bundled defaults and everything installed so far
    pub fn settings(&self) -> Settings {
        self.builder()
            .with_default_settings()
            .build()
            .expect("Failed to build settings")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.temp_dir.path().join("settings.yaml")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the user settings file, if it exists
pub fn read_settings_file(fixture: &TestFixture) -> Option<SettingsDocument> {
    let content = std::fs::read_to_string(fixture.settings_path()).ok()?;
    SettingsDocument::from_yaml(&content).ok()
}
