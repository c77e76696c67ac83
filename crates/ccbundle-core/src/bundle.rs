//! Bundle options: the selection handed to the persistence layer
//!
//! Every collection follows the nil-vs-empty convention: `None` means
//! "everything", `Some(empty)` means "explicitly nothing", and a populated
//! value means "exactly these".

use crate::diff::ProfileDefinition;
use crate::error::{CoreError, CoreResult};
use crate::section::Section;
use ccbundle_scanner::artifacts::{COMMAND_KEY_PREFIX, SKILL_KEY_PREFIX};
use ccbundle_scanner::settings::Permissions;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Key prefix of allow rules in the Permissions section
pub const ALLOW_KEY_PREFIX: &str = "allow:";
/// Key prefix of deny rules in the Permissions section
pub const DENY_KEY_PREFIX: &str = "deny:";

/// Selected configuration, per section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleOptions {
    /// Plugin keys (`name@marketplace`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,
    /// Top-level settings keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Vec<String>>,
    /// CLAUDE.md fragment keys and discovered CLAUDE.md paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_md: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Permissions>,
    /// MCP server names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<Vec<String>>,
    /// Whole-map switch; `None` includes keybindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keybindings: Option<bool>,
    /// Hook keys (`event|matcher|command`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Vec<String>>,
    /// Command names, without the `cmd:` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
    /// Skill names, without the `skill:` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

/// The selectable keys of one section and which of them are selected
#[derive(Debug, Clone, Default)]
pub struct SectionSelection {
    pub selected: BTreeSet<String>,
    /// Every candidate key is selected
    pub complete: bool,
}

impl BundleOptions {
    /// Whether `key` of `section` is part of this selection
    #[must_use]
    pub fn includes(&self, section: Section, key: &str) -> bool {
        self.lookup(section, key).unwrap_or(true)
    }

    /// Whether `key` of `section` is named explicitly (a `None` collection names nothing)
    #[must_use]
    pub fn explicitly_lists(&self, section: Section, key: &str) -> bool {
        self.lookup(section, key).unwrap_or(false)
    }

    /// `None` when the relevant collection is absent, else membership
    fn lookup(&self, section: Section, key: &str) -> Option<bool> {
        let contains = |list: &Option<Vec<String>>, key: &str| list.as_ref().map(|l| l.iter().any(|k| k == key));
        match section {
            Section::Plugins => contains(&self.plugins, key),
            Section::Settings => contains(&self.settings, key),
            Section::ClaudeMd => contains(&self.claude_md, key),
            Section::McpServers => contains(&self.mcp, key),
            Section::Hooks => contains(&self.hooks, key),
            Section::Keybindings => self.keybindings,
            Section::Permissions => self.permissions.as_ref().map(|p| {
                if let Some(rule) = key.strip_prefix(ALLOW_KEY_PREFIX) {
                    p.allow.iter().any(|r| r == rule)
                } else if let Some(rule) = key.strip_prefix(DENY_KEY_PREFIX) {
                    p.deny.iter().any(|r| r == rule)
                } else {
                    false
                }
            }),
            Section::CommandsSkills => {
                if let Some(name) = key.strip_prefix(COMMAND_KEY_PREFIX) {
                    contains(&self.commands, name)
                } else if let Some(name) = key.strip_prefix(SKILL_KEY_PREFIX) {
                    contains(&self.skills, name)
                } else {
                    None
                }
            }
        }
    }

    /// Record the selection of one section
    pub fn set_section(&mut self, section: Section, selection: &SectionSelection) {
        let list = || (!selection.complete).then(|| selection.selected.iter().cloned().collect::<Vec<_>>());
        let stripped = |prefix: &str| {
            (!selection.complete).then(|| {
                selection
                    .selected
                    .iter()
                    .filter_map(|k| k.strip_prefix(prefix))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
        };
        match section {
            Section::Plugins => self.plugins = list(),
            Section::Settings => self.settings = list(),
            Section::ClaudeMd => self.claude_md = list(),
            Section::McpServers => self.mcp = list(),
            Section::Hooks => self.hooks = list(),
            Section::Keybindings => self.keybindings = (!selection.complete).then_some(false),
            Section::Permissions => {
                self.permissions = (!selection.complete).then(|| Permissions {
                    allow: stripped(ALLOW_KEY_PREFIX).unwrap_or_default(),
                    deny: stripped(DENY_KEY_PREFIX).unwrap_or_default(),
                });
            }
            Section::CommandsSkills => {
                self.commands = stripped(COMMAND_KEY_PREFIX);
                self.skills = stripped(SKILL_KEY_PREFIX);
            }
        }
    }
}

/// A previously saved bundle, used to seed an edit session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingConfig {
    #[serde(flatten)]
    pub options: BundleOptions,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, ProfileDefinition>,
}

impl ExistingConfig {
    /// Read a bundle previously written as JSON
    pub fn from_json_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(keys: &[&str], complete: bool) -> SectionSelection {
        SectionSelection {
            selected: keys.iter().map(|k| (*k).to_string()).collect(),
            complete,
        }
    }

    #[test]
    fn test_nil_vs_empty() {
        let mut options = BundleOptions::default();
        options.set_section(Section::Plugins, &selection(&["a@m"], true));
        options.set_section(Section::Hooks, &selection(&[], false));
        options.set_section(Section::Settings, &selection(&["model"], false));
        assert_eq!(options.plugins, None);
        assert_eq!(options.hooks, Some(Vec::new()));
        assert_eq!(options.settings, Some(vec!["model".to_string()]));

        assert!(options.includes(Section::Plugins, "anything"));
        assert!(!options.includes(Section::Hooks, "x"));
        assert!(!options.explicitly_lists(Section::Plugins, "anything"));
        assert!(options.explicitly_lists(Section::Settings, "model"));
    }

    #[test]
    fn test_commands_and_skills_split_by_prefix() {
        let mut options = BundleOptions::default();
        options.set_section(Section::CommandsSkills, &selection(&["cmd:deploy", "skill:review"], false));
        assert_eq!(options.commands, Some(vec!["deploy".to_string()]));
        assert_eq!(options.skills, Some(vec!["review".to_string()]));
        assert!(options.includes(Section::CommandsSkills, "cmd:deploy"));
        assert!(!options.includes(Section::CommandsSkills, "cmd:other"));
    }

    #[test]
    fn test_permissions_and_keybindings() {
        let mut options = BundleOptions::default();
        options.set_section(Section::Permissions, &selection(&["allow:Bash(ls)", "deny:Read(.env)"], false));
        options.set_section(Section::Keybindings, &selection(&[], false));
        let permissions = options.permissions.clone().unwrap();
        assert_eq!(permissions.allow, ["Bash(ls)"]);
        assert_eq!(permissions.deny, ["Read(.env)"]);
        assert!(options.includes(Section::Permissions, "allow:Bash(ls)"));
        assert!(!options.includes(Section::Permissions, "allow:Bash(rm)"));
        assert_eq!(options.keybindings, Some(false));
        assert!(!options.includes(Section::Keybindings, "keybindings"));
    }

    #[test]
    fn test_existing_config_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        std::fs::write(
            &path,
            r#"{"plugins": ["a@m"], "profiles": {"work": {"plugins": {"add": ["b@m"]}}}}"#,
        )
        .unwrap();
        let existing = ExistingConfig::from_json_file(&path).unwrap();
        assert_eq!(existing.options.plugins, Some(vec!["a@m".to_string()]));
        assert!(existing.profiles.contains_key("work"));
        assert!(ExistingConfig::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}
