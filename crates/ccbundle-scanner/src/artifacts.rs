//! Artifact types: skills, commands, and CLAUDE.md fragments

use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Skill information parsed from SKILL.md
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Path to the SKILL.md file
    pub path: PathBuf,
    /// Skill name
    pub name: String,
    /// Skill description
    pub description: String,
    /// Whether the skill can be invoked by users
    #[serde(default)]
    pub user_invocable: bool,
    /// Allowed tools
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// SHA256 hash of SKILL.md content
    pub sha256: String,
    /// Scope where found
    pub scope: Scope,
}

/// Command information parsed from .md file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Path to the command file
    pub path: PathBuf,
    /// Command name (derived from filename)
    pub name: String,
    /// Command description
    pub description: Option<String>,
    /// SHA256 hash of file content
    pub sha256: String,
    /// Scope where found
    pub scope: Scope,
}

impl SkillInfo {
    /// Item key: `skill:<name>`, or `skill:<plugin>:<name>` for plugin skills
    #[must_use]
    pub fn key(&self) -> String {
        artifact_key("skill", &self.scope, &self.name)
    }
}

impl CommandInfo {
    /// Item key: `cmd:<name>`, or `cmd:<plugin>:<name>` for plugin commands
    #[must_use]
    pub fn key(&self) -> String {
        artifact_key("cmd", &self.scope, &self.name)
    }
}

/// Key prefix for commands in the Commands & Skills section
pub const COMMAND_KEY_PREFIX: &str = "cmd:";
/// Key prefix for skills in the Commands & Skills section
pub const SKILL_KEY_PREFIX: &str = "skill:";

fn artifact_key(kind: &str, scope: &Scope, name: &str) -> String {
    match scope.plugin_id() {
        Some(plugin) => {
            let plugin_name = plugin.split('@').next().unwrap_or(plugin);
            format!("{kind}:{plugin_name}:{name}")
        }
        None => format!("{kind}:{name}"),
    }
}

/// One `## ` section of a CLAUDE.md file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaudeMdFragment {
    /// Stable key (slug of the heading, made unique within the file)
    pub key: String,
    /// Heading text, or `(preamble)` for content before the first heading
    pub heading: String,
    /// Fragment body including its heading line
    pub content: String,
}
