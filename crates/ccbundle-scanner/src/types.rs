//! Shared types for the ccbundle scanner

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Scope where an artifact was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "plugin_id")]
pub enum Scope {
    /// User-level (~/.claude/)
    User,
    /// Project-level (.claude/ inside some repository)
    Project,
    /// Provided by an installed plugin
    Plugin(String),
}

impl Scope {
    /// The owning plugin id, if this artifact ships with a plugin
    #[must_use]
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Self::Plugin(id) => Some(id),
            Self::User | Self::Project => None,
        }
    }

    /// Short label used as a row tag
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Plugin(_) => "plugin",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            other => other
                .strip_prefix("plugin:")
                .map(|id| Scope::Plugin(id.to_string()))
                .ok_or_else(|| format!("Invalid scope: {s}")),
        }
    }
}

/// Host system information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    /// Operating system
    pub os: String,
    /// Current username
    pub username: String,
    /// Home directory path
    pub home_dir: PathBuf,
}

impl HostInfo {
    /// Describe the host for a scan rooted at `home_dir`
    #[must_use]
    pub fn for_home(home_dir: PathBuf) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            username: whoami_username(),
            home_dir,
        }
    }
}

fn whoami_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Render `path` relative to `home` as `~/...` when it lives below it
#[must_use]
pub fn tilde_path(path: &std::path::Path, home: &std::path::Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}
