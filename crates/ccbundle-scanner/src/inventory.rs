//! Inventory types for scan results

use crate::artifacts::{ClaudeMdFragment, CommandInfo, SkillInfo};
use crate::settings::{HookEntry, McpServer, Permissions};
use crate::types::{HostInfo, Scope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Read-only snapshot of the local Claude Code configuration, grouped the
/// way the bundle wizard presents it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// Host system information
    pub host: HostInfo,
    /// Installed plugins
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
    /// Top-level settings.json keys not owned by another section
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
    /// Fragments of the user CLAUDE.md
    #[serde(default)]
    pub claude_md: Vec<ClaudeMdFragment>,
    /// Permission rules
    #[serde(default)]
    pub permissions: Permissions,
    /// MCP servers with the scope that declared them
    #[serde(default)]
    pub mcp_servers: Vec<ScopedMcpServer>,
    /// keybindings.json content, if the file exists
    #[serde(default)]
    pub keybindings: Option<serde_json::Value>,
    /// Hook commands from settings.json
    #[serde(default)]
    pub hooks: Vec<HookEntry>,
    /// Commands (user and plugin provided)
    #[serde(default)]
    pub commands: Vec<CommandInfo>,
    /// Skills (user and plugin provided)
    #[serde(default)]
    pub skills: Vec<SkillInfo>,
    /// When the scan was performed
    pub scanned_at: DateTime<Utc>,
}

impl Inventory {
    /// An empty inventory for `home`
    #[must_use]
    pub fn empty(home: PathBuf) -> Self {
        Self {
            host: HostInfo::for_home(home),
            plugins: Vec::new(),
            settings: BTreeMap::new(),
            claude_md: Vec::new(),
            permissions: Permissions::default(),
            mcp_servers: Vec::new(),
            keybindings: None,
            hooks: Vec::new(),
            commands: Vec::new(),
            skills: Vec::new(),
            scanned_at: Utc::now(),
        }
    }

    /// Look up an installed plugin by its `name@marketplace` key
    #[must_use]
    pub fn plugin(&self, key: &str) -> Option<&PluginEntry> {
        self.plugins.iter().find(|p| p.key == key)
    }
}

/// An installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    /// `name@marketplace` identifier
    pub key: String,
    /// Plugin name
    pub name: String,
    /// Marketplace it came from
    pub marketplace: Option<String>,
    /// Installed version
    #[serde(default)]
    pub version: Option<String>,
    /// Whether settings.json enables it
    pub enabled: bool,
    /// Install directory, if known
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl PluginEntry {
    /// Build an entry from a `name@marketplace` key
    #[must_use]
    pub fn from_key(key: &str, enabled: bool) -> Self {
        let (name, marketplace) = match key.split_once('@') {
            Some((name, marketplace)) => (name.to_string(), Some(marketplace.to_string())),
            None => (key.to_string(), None),
        };
        Self {
            key: key.to_string(),
            name,
            marketplace,
            version: None,
            enabled,
            path: None,
        }
    }
}

/// An MCP server and the scope that declared it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedMcpServer {
    /// Server configuration
    pub server: McpServer,
    /// Declaring scope
    pub scope: Scope,
}
