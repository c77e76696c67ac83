//! Installed plugin scanner

use crate::error::{ScanError, ScanResult};
use crate::inventory::PluginEntry;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct RawInstalledPlugins {
    #[serde(default)]
    plugins: HashMap<String, Vec<RawPluginInstall>>,
}

#[derive(Debug, Deserialize)]
struct RawPluginInstall {
    #[serde(rename = "installPath")]
    install_path: String,
    #[serde(default)]
    version: Option<String>,
}

/// Scan installed plugins and merge their enabled state
///
/// Plugins that only appear in `enabledPlugins` (not installed locally) are
/// still listed so a bundle can carry them. The result is sorted by key.
///
/// # Errors
/// Returns an error if `installed_plugins.json` exists but cannot be read or parsed
pub fn scan_plugins(
    plugins_dir: &Path,
    enabled_plugins: &BTreeMap<String, bool>,
) -> ScanResult<Vec<PluginEntry>> {
    let mut entries: BTreeMap<String, PluginEntry> = BTreeMap::new();

    let installed_file = plugins_dir.join("installed_plugins.json");
    if installed_file.exists() {
        let content = fs::read_to_string(&installed_file)?;
        let raw: RawInstalledPlugins =
            serde_json::from_str(&content).map_err(ScanError::JsonParse)?;

        for (plugin_key, installs) in raw.plugins {
            // Default to enabled if settings.json does not mention it
            let enabled = enabled_plugins.get(&plugin_key).copied().unwrap_or(true);
            let mut entry = PluginEntry::from_key(&plugin_key, enabled);
            if let Some(install) = installs.into_iter().next() {
                entry.path = Some(PathBuf::from(install.install_path));
                entry.version = install.version;
            }
            entries.insert(plugin_key, entry);
        }
    }

    for (key, enabled) in enabled_plugins {
        entries
            .entry(key.clone())
            .or_insert_with(|| PluginEntry::from_key(key, *enabled));
    }

    Ok(entries.into_values().collect())
}
