//! Global Settings Tests
//!
//! The process-wide instance can be installed only once, so the whole
//! lifecycle lives in a single test of its own binary.

use ndev_settings::{Error, SettingValue, Settings, get_settings, init_settings};

#[test]
fn test_global_settings_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let build = || {
        Settings::builder("ndev-test")
            .config_dir(dir.path())
            .with_default_settings()
            .build()
            .unwrap()
    };

    assert!(matches!(get_settings(), Err(Error::NotInitialized)));

    let installed = init_settings(build()).unwrap();
    installed.set("Export", "canvas_scale", 2.0).unwrap();

    assert!(matches!(init_settings(build()), Err(Error::AlreadyInitialized)));

    let first = get_settings().unwrap();
    let second = get_settings().unwrap();
    assert!(std::ptr::eq(first, installed));
    assert!(std::ptr::eq(first, second));
    assert_eq!(
        second.get("Export", "canvas_scale").unwrap(),
        SettingValue::Float(2.0)
    );
}
