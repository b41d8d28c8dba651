//! Process-wide settings instance
//!
//! Hosts that want a single shared [`Settings`] install it once at startup and
//! read it from anywhere afterwards. Everything else in the crate works on an
//! explicit `Settings` value; this module is optional.
//!
//! ```rust,no_run
//! use ndev_settings::{Settings, get_settings, init_settings};
//!
//! init_settings(Settings::builder("napari-ndev").with_default_settings().build()?)?;
//!
//! let scale = get_settings()?.get("Export", "canvas_scale")?;
//! # Ok::<(), ndev_settings::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::settings::Settings;
use log::debug;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Install the process-wide settings instance
///
/// # Errors
///
/// Returns [`Error::AlreadyInitialized`] if an instance was installed before;
/// the new one is dropped.
pub fn init_settings(settings: Settings) -> Result<&'static Settings> {
    let mut installed = false;
    let instance = SETTINGS.get_or_init(|| {
        installed = true;
        settings
    });

    if installed {
        debug!("Installed global settings from {}", instance.settings_path().display());
        Ok(instance)
    } else {
        Err(Error::AlreadyInitialized)
    }
}

/// The process-wide settings instance; the same reference on every call
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before [`init_settings`] has been called.
pub fn get_settings() -> Result<&'static Settings> {
    SETTINGS.get().ok_or(Error::NotInitialized)
}
