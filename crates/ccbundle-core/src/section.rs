//! The fixed set of bundle sections

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One configurable category of a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Plugins,
    Settings,
    ClaudeMd,
    Permissions,
    McpServers,
    Keybindings,
    Hooks,
    CommandsSkills,
}

impl Section {
    /// All sections in tab order
    pub const ALL: [Section; 8] = [
        Section::Plugins,
        Section::Settings,
        Section::ClaudeMd,
        Section::Permissions,
        Section::McpServers,
        Section::Keybindings,
        Section::Hooks,
        Section::CommandsSkills,
    ];

    /// Human-readable tab label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Plugins => "Plugins",
            Self::Settings => "Settings",
            Self::ClaudeMd => "CLAUDE.md",
            Self::Permissions => "Permissions",
            Self::McpServers => "MCP Servers",
            Self::Keybindings => "Keybindings",
            Self::Hooks => "Hooks",
            Self::CommandsSkills => "Commands & Skills",
        }
    }

    /// Machine name used in files and on the command line
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plugins => "plugins",
            Self::Settings => "settings",
            Self::ClaudeMd => "claude_md",
            Self::Permissions => "permissions",
            Self::McpServers => "mcp_servers",
            Self::Keybindings => "keybindings",
            Self::Hooks => "hooks",
            Self::CommandsSkills => "commands_skills",
        }
    }

    /// Whether items in this section can be owned by a plugin
    #[must_use]
    pub fn has_plugin_owned_items(self) -> bool {
        matches!(self, Self::McpServers | Self::CommandsSkills)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("Unknown section: {s}"))
    }
}
