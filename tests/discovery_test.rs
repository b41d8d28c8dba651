//! Discovery Integration Tests
//!
//! Tests for merging settings from installed plugins:
//! - Registration functions and YAML documents
//! - Precedence between sources
//! - Fail-soft handling of broken plugins
//! - Dynamic choices tracking installed plugins

mod common;

use common::{BIOIO_OME_ZARR_YAML, MICROSCOPY_YAML, TestFixture, register_bioio_settings};
use ndev_settings::{
    Error, ManifestProviderSource, REGISTRATION_GROUP, SettingDefinition, SettingValue, Settings,
    YAML_GROUP, register_settings,
};

// =============================================================================
// Registration Providers
// =============================================================================

#[test]
fn test_registration_providers_merge() {
    let fixture = TestFixture::with_plugins();
    let settings = fixture.settings();

    assert_eq!(settings.groups(), ["Export", "Performance", "Reader"]);
    assert_eq!(
        settings.names("Export").unwrap(),
        [
            "canvas_scale",
            "canvas_size",
            "compression_level",
            "override_canvas_size",
            "preferred_export_format",
            "preserve_original_metadata",
        ]
    );
    assert!(settings.discovery_warnings().is_empty());
}

#[test]
fn test_later_provider_wins() {
    let fixture = TestFixture::new();
    fixture.install_registration("a", |registry| {
        register_settings(
            registry,
            [SettingDefinition::builder("compression_enabled", true)
                .group("Export")
                .build()?],
        )
    });
    fixture.install_registration("b", |registry| {
        register_settings(
            registry,
            [SettingDefinition::builder("compression_enabled", false)
                .group("Export")
                .build()?],
        )
    });

    let settings = fixture.settings();
    assert_eq!(
        settings.definition("Export", "compression_enabled").unwrap().default_value,
        SettingValue::Bool(false)
    );
}

#[test]
fn test_registration_overrides_yaml_provider() {
    let fixture = TestFixture::new();
    fixture.install_yaml(
        "reader-defaults",
        "Reader:\n  auto_detect_reader:\n    default: false\n",
    );
    fixture.install_registration("bioio", register_bioio_settings);

    let settings = fixture.settings();
    assert_eq!(
        settings.get("Reader", "auto_detect_reader").unwrap(),
        SettingValue::Bool(true)
    );
}

#[test]
fn test_registering_same_provider_twice_is_harmless() {
    let fixture = TestFixture::new();
    fixture.install_registration("bioio", register_bioio_settings);
    let once = fixture.settings().metadata();

    fixture.install_registration("bioio-again", register_bioio_settings);
    let twice = fixture.settings().metadata();

    assert_eq!(once, twice);
}

// =============================================================================
// YAML Providers
// =============================================================================

#[test]
fn test_yaml_providers_load() {
    let fixture = TestFixture::new();
    fixture.install_yaml("bioio-ome-zarr", BIOIO_OME_ZARR_YAML);
    fixture.install_yaml("microscopy", MICROSCOPY_YAML);

    let settings = fixture.settings();
    let zarr = settings.group("BioioOmeZarr").unwrap();
    assert_eq!(
        zarr.get_as::<Vec<f64>>("chunk_size").unwrap(),
        vec![1024.0, 1024.0]
    );
    assert_eq!(zarr.get("compression").unwrap(), SettingValue::from("lz4"));
    assert!(zarr.get_as::<bool>("parallel_read").unwrap());

    let microscopy = settings.group("Microscopy").unwrap();
    assert_eq!(
        microscopy.get("pixel_size_um").unwrap(),
        SettingValue::Float(0.1)
    );
    assert_eq!(
        microscopy.get("illumination_correction").unwrap(),
        SettingValue::from("flatfield")
    );
}

#[test]
fn test_user_values_survive_provider_defaults() {
    let fixture = TestFixture::new();
    fixture.install_yaml("bioio-ome-zarr", BIOIO_OME_ZARR_YAML);
    fixture.write_file(
        "settings.yaml",
        r"
BioioOmeZarr:
  compression:
    default: blosc
    value: gzip
Export:
  canvas_scale:
    default: 1.0
    value: 3.0
",
    );

    let settings = fixture.settings();

    // user value kept, definition replaced by the provider's
    assert_eq!(
        settings.get("BioioOmeZarr", "compression").unwrap(),
        SettingValue::from("gzip")
    );
    assert_eq!(
        settings.definition("BioioOmeZarr", "compression").unwrap().default_value,
        SettingValue::from("lz4")
    );
    assert_eq!(
        settings.get("Export", "canvas_scale").unwrap(),
        SettingValue::Float(3.0)
    );
    // other provider settings still load
    assert!(settings.get_as::<bool>("BioioOmeZarr", "parallel_read").unwrap());
}

#[test]
fn test_user_value_dropped_when_provider_narrows_choices() {
    let fixture = TestFixture::new();
    fixture.install_yaml("bioio-ome-zarr", BIOIO_OME_ZARR_YAML);
    fixture.write_file(
        "settings.yaml",
        "BioioOmeZarr:\n  compression:\n    default: lz4\n    value: zstd\n",
    );

    let settings = fixture.settings();
    assert_eq!(
        settings.get("BioioOmeZarr", "compression").unwrap(),
        SettingValue::from("lz4")
    );
}

#[test]
fn test_saved_file_does_not_freeze_bundled_defaults() {
    let fixture = TestFixture::new();
    let release_1 = "Export:\n  canvas_scale:\n    default: 1.0\n    min: 0.1\n    max: 100.0\n  override_canvas_size:\n    default: false\n";
    let release_2 = "Export:\n  canvas_scale:\n    default: 2.0\n    min: 0.1\n    max: 500.0\n  override_canvas_size:\n    default: false\n";

    {
        let settings = fixture.builder().default_document(release_1).build().unwrap();
        settings.set("Export", "override_canvas_size", true).unwrap();
        settings.save().unwrap();
    }
    {
        let settings = fixture.builder().default_document(release_2).build().unwrap();
        let scale = settings.definition("Export", "canvas_scale").unwrap();
        assert_eq!(scale.default_value, SettingValue::Float(2.0));
        assert_eq!(scale.max_value, Some(500.0));
        assert_eq!(
            settings.get("Export", "canvas_scale").unwrap(),
            SettingValue::Float(2.0)
        );
        settings.set("Export", "canvas_scale", 300.0).unwrap();

        // the saved override still applies on top of the new definitions
        assert!(settings.get_as::<bool>("Export", "override_canvas_size").unwrap());
    }
}

// =============================================================================
// Fail Soft
// =============================================================================

#[test]
fn test_malformed_yaml_provider_skipped() {
    let fixture = TestFixture::new();
    fixture.install_yaml("broken", "Broken:\n  setting: [unclosed\n");
    fixture.install_yaml("microscopy", MICROSCOPY_YAML);

    let settings = fixture.settings();
    let warnings = settings.discovery_warnings();

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].source, YAML_GROUP);
    assert_eq!(warnings[0].provider, "broken");
    assert!(settings.group("Microscopy").is_ok());
    assert!(settings.group("Broken").is_err());
}

#[test]
fn test_invalid_yaml_document_skipped_as_unit() {
    let fixture = TestFixture::new();
    fixture.install_yaml(
        "half-valid",
        r"
Imaging:
  gain:
    default: 1.0
    min: 0.0
    max: 10.0
  mode:
    default: fast
    choices: [slow, normal]
",
    );

    let settings = fixture.settings();
    assert!(settings.group("Imaging").is_err());
    assert_eq!(settings.discovery_warnings().len(), 1);
    assert!(settings.discovery_warnings()[0].reason.contains("Imaging.mode"));
}

#[test]
fn test_failing_registration_skipped() {
    let fixture = TestFixture::new();
    fixture.install_registration("crashing", |_| {
        Err(Error::provider("crashing", "missing optional dependency"))
    });
    fixture.install_registration("bioio", register_bioio_settings);

    let settings = fixture.settings();
    let warnings = settings.discovery_warnings();

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].source, REGISTRATION_GROUP);
    assert_eq!(warnings[0].provider, "crashing");
    assert!(warnings[0].reason.contains("missing optional dependency"));
    assert!(settings.group("Performance").is_ok());
}

#[test]
fn test_invalid_definition_from_provider_skipped() {
    let fixture = TestFixture::new();
    fixture.install_registration("bad-bounds", |registry| {
        let mut definition = SettingDefinition::builder("gain", 1.0).group("Imaging").build()?;
        definition.min_value = Some(10.0);
        definition.max_value = Some(1.0);
        register_settings(registry, [definition])
    });

    let settings = fixture.settings();
    assert!(settings.group("Imaging").is_err());
    assert_eq!(settings.discovery_warnings().len(), 1);
}

#[test]
fn test_missing_yaml_file_skipped() {
    let fixture = TestFixture::new();
    fixture.plugins.install(
        YAML_GROUP,
        ndev_settings::ProviderEntry::yaml_file("gone", fixture.temp_dir.path().join("gone.yaml")),
    );

    let settings = fixture.settings();
    assert_eq!(settings.discovery_warnings().len(), 1);
    assert_eq!(settings.groups(), ["Export", "Reader"]);
}

#[test]
fn test_corrupt_user_file_is_a_warning() {
    let fixture = TestFixture::new();
    fixture.write_file("settings.yaml", "Export: [not, a, group]\n");

    let settings = fixture.settings();
    assert_eq!(settings.discovery_warnings().len(), 1);
    assert_eq!(
        settings.get("Export", "canvas_scale").unwrap(),
        SettingValue::Float(1.0)
    );
}

// =============================================================================
// Dynamic Choices
// =============================================================================

#[test]
fn test_dynamic_choices_track_installed_plugins() {
    let fixture = TestFixture::with_plugins();
    let settings = fixture.settings();

    let readers = settings.choices("Reader", "preferred_reader").unwrap();
    assert!(readers.enabled);
    assert_eq!(
        readers.options,
        ["bioio-ome-tiff", "bioio-czi", "bioio-tifffile"]
    );

    assert!(settings.set("Reader", "preferred_reader", "bioio-lif").is_err());
    fixture.install_plugin("bioio.readers", "bioio-lif");
    settings.set("Reader", "preferred_reader", "bioio-lif").unwrap();
}

#[test]
fn test_dynamic_fallback_when_no_providers() {
    let fixture = TestFixture::with_plugins();
    let settings = fixture.settings();

    let formats = settings.choices("Export", "preferred_export_format").unwrap();
    assert_eq!(formats.options, ["No export formats available"]);
    assert!(!formats.enabled);

    // the declared default stays assignable without any writer installed
    settings.set("Export", "preferred_export_format", "ome-tiff").unwrap();
    assert!(settings.set("Export", "preferred_export_format", "ome-zarr").is_err());
}

// =============================================================================
// Manifest Source
// =============================================================================

#[test]
fn test_manifest_source_end_to_end() {
    let config = tempfile::tempdir().unwrap();
    let plugins = tempfile::tempdir().unwrap();

    // settings documents must not be mistaken for manifests
    std::fs::write(plugins.path().join("microscopy.settings"), MICROSCOPY_YAML).unwrap();
    std::fs::write(
        plugins.path().join("microscopy.yaml"),
        r"
name: ndev-microscopy
entry_points:
  ndev_settings.yaml_providers:
    - name: microscopy
      path: microscopy.settings
  bioio.readers:
    - name: bioio-lif
",
    )
    .unwrap();
    std::fs::write(
        plugins.path().join("czi.yaml"),
        "entry_points:\n  bioio.readers:\n    - name: bioio-czi\n",
    )
    .unwrap();

    let settings = Settings::builder("ndev-test")
        .config_dir(config.path())
        .provider_source(ManifestProviderSource::new(plugins.path()))
        .with_settings([SettingDefinition::dynamic_choice(
            "preferred_reader",
            "bioio-ome-tiff",
            "bioio.readers",
        )
        .group("Reader")
        .build()
        .unwrap()])
        .build()
        .unwrap();

    assert!(settings.discovery_warnings().is_empty());
    assert_eq!(
        settings.get("Microscopy", "illumination_correction").unwrap(),
        SettingValue::from("flatfield")
    );
    assert_eq!(
        settings.choices("Reader", "preferred_reader").unwrap().options,
        ["bioio-czi", "bioio-lif"]
    );
}
