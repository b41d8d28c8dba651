//! Directory of plugin manifests
//!
//! Each installed plugin drops one YAML manifest into a shared directory:
//!
//! ```yaml
//! name: bioio-czi
//! entry_points:
//!   bioio.readers:
//!     - name: bioio-czi
//!   ndev_settings.yaml_providers:
//!     - name: bioio
//!       path: bioio_settings.yaml
//! ```
//!
//! Relative `path` values resolve against the manifest's directory.

use super::{ProviderEntry, ProviderSource};
use crate::error::{Error, Result};
use crate::storage::{StorageBackend, YamlStorage};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct PluginManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    entry_points: HashMap<String, Vec<ManifestEntry>>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: String,
    #[serde(default)]
    path: Option<PathBuf>,
}

/// Provider source reading plugin manifests from a directory
///
/// Manifests are visited in file-name order and entries within a manifest in
/// declaration order. The directory is rescanned on every call, so plugins
/// installed after startup are picked up by the next lookup. A missing
/// directory means no plugins are installed; a malformed manifest is logged
/// and skipped.
#[derive(Debug, Clone)]
pub struct ManifestProviderSource {
    dir: PathBuf,
    storage: YamlStorage,
}

impl ManifestProviderSource {
    /// Read manifests from `dir`; a leading `~` expands to the home directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir: PathBuf = dir.into();
        let dir = match (dir.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => dir,
        };
        Self {
            dir,
            storage: YamlStorage::new(),
        }
    }

    /// Directory scanned for manifests
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| Error::DirectoryRead {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();

        paths.sort();
        Ok(paths)
    }
}

impl ProviderSource for ManifestProviderSource {
    fn providers(&self, group: &str) -> Result<Vec<ProviderEntry>> {
        let mut found = Vec::new();

        for path in self.manifest_paths()? {
            let manifest: PluginManifest = match self.storage.read(&path) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!("Skipping plugin manifest {}: {e}", path.display());
                    continue;
                }
            };

            let Some(entries) = manifest.entry_points.get(group) else {
                continue;
            };

            debug!(
                "Manifest {} ({}) provides {} entries for {group}",
                path.display(),
                manifest.name.as_deref().unwrap_or("unnamed"),
                entries.len()
            );

            for entry in entries {
                found.push(match &entry.path {
                    Some(target) => ProviderEntry::yaml_file(&entry.name, self.dir.join(target)),
                    None => ProviderEntry::named(&entry.name),
                });
            }
        }

        Ok(found)
    }
}
