//! Wizard configuration (`config.toml`)

use crate::error::{CoreError, CoreResult};
use ccbundle_scanner::discover::{CrawlOptions, DEFAULT_EXCLUDES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "ccbundle";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    pub discovery: DiscoveryConfig,
    pub picker: PickerConfig,
}

/// `[discovery]`: where and how deep the background crawls look
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directories to crawl; a leading `~` is the home directory
    pub roots: Vec<String>,
    pub max_depth: usize,
    pub claude_md: bool,
    pub mcp: bool,
    pub commands_skills: bool,
    /// Directory names never descended into
    pub exclude: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            roots: vec!["~".to_string()],
            max_depth: 4,
            claude_md: true,
            mcp: true,
            commands_skills: true,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// `[picker]`: initial viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub viewport_height: usize,
    pub viewport_width: usize,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            viewport_height: 20,
            viewport_width: 80,
        }
    }
}

impl WizardConfig {
    /// `<config_dir>/ccbundle/config.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from [`Self::default_path`]; a missing file gives defaults
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::Read {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|source| CoreError::Config { path, source })
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> CoreResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Crawl settings for a session rooted at `home`
    #[must_use]
    pub fn crawl_options(&self, home: &Path) -> CrawlOptions {
        let roots = self
            .discovery
            .roots
            .iter()
            .map(|root| expand_tilde(root, home))
            .collect();
        let mut options = CrawlOptions::new(home, roots);
        options.max_depth = self.discovery.max_depth;
        options.exclude.clone_from(&self.discovery.exclude);
        options
    }
}

fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix('~') {
        Some("") => home.to_path_buf(),
        Some(rest) if rest.starts_with('/') => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}
