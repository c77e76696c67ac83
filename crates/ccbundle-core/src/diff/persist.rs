//! Sparse persisted profiles and their conversion to live section diffs

use super::{ProfileDiffs, SectionDiff};
use crate::catalog::{ValueTable, KEYBINDINGS_KEY};
use crate::secrets::SecretRedactor;
use crate::section::Section;
use ccbundle_scanner::artifacts::{COMMAND_KEY_PREFIX, SKILL_KEY_PREFIX};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Added and removed keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDiff {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub add: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub remove: BTreeSet<String>,
}

impl KeyDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    fn to_section_diff(&self) -> SectionDiff {
        SectionDiff {
            adds: self.add.clone(),
            removes: self.remove.clone(),
        }
    }
}

impl From<SectionDiff> for KeyDiff {
    fn from(diff: SectionDiff) -> Self {
        Self {
            add: diff.adds,
            remove: diff.removes,
        }
    }
}

/// Added entries with their values, and removed keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueDiff {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub add: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub remove: BTreeSet<String>,
}

impl ValueDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    fn to_section_diff(&self) -> SectionDiff {
        SectionDiff {
            adds: self.add.keys().cloned().collect(),
            removes: self.remove.clone(),
        }
    }
}

/// A profile as stored: only what differs from base
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "KeyDiff::is_empty")]
    pub plugins: KeyDiff,
    #[serde(default, skip_serializing_if = "ValueDiff::is_empty")]
    pub settings: ValueDiff,
    #[serde(default, skip_serializing_if = "KeyDiff::is_empty")]
    pub claude_md: KeyDiff,
    /// `allow:<rule>` / `deny:<rule>` keys
    #[serde(default, skip_serializing_if = "KeyDiff::is_empty")]
    pub permissions: KeyDiff,
    #[serde(default, skip_serializing_if = "ValueDiff::is_empty")]
    pub mcp: ValueDiff,
    /// `Some(true)` adds keybindings, `Some(false)` drops them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keybindings: Option<bool>,
    #[serde(default, skip_serializing_if = "KeyDiff::is_empty")]
    pub hooks: KeyDiff,
    /// Command names without the `cmd:` prefix
    #[serde(default, skip_serializing_if = "KeyDiff::is_empty")]
    pub commands: KeyDiff,
    /// Skill names without the `skill:` prefix
    #[serde(default, skip_serializing_if = "KeyDiff::is_empty")]
    pub skills: KeyDiff,
}

impl ProfileDefinition {
    /// No overrides at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
            && self.settings.is_empty()
            && self.claude_md.is_empty()
            && self.permissions.is_empty()
            && self.mcp.is_empty()
            && self.keybindings.is_none()
            && self.hooks.is_empty()
            && self.commands.is_empty()
            && self.skills.is_empty()
    }
}

/// Expand a stored profile into live per-section diffs
#[must_use]
pub fn profile_to_section_diffs(profile: &ProfileDefinition) -> ProfileDiffs {
    let keybindings = match profile.keybindings {
        Some(true) => SectionDiff {
            adds: BTreeSet::from([KEYBINDINGS_KEY.to_string()]),
            removes: BTreeSet::new(),
        },
        Some(false) => SectionDiff {
            adds: BTreeSet::new(),
            removes: BTreeSet::from([KEYBINDINGS_KEY.to_string()]),
        },
        None => SectionDiff::default(),
    };
    let commands_skills = profile
        .commands
        .to_section_diff()
        .with_prefix(COMMAND_KEY_PREFIX)
        .union(profile.skills.to_section_diff().with_prefix(SKILL_KEY_PREFIX));

    [
        (Section::Plugins, profile.plugins.to_section_diff()),
        (Section::Settings, profile.settings.to_section_diff()),
        (Section::ClaudeMd, profile.claude_md.to_section_diff()),
        (Section::Permissions, profile.permissions.to_section_diff()),
        (Section::McpServers, profile.mcp.to_section_diff()),
        (Section::Keybindings, keybindings),
        (Section::Hooks, profile.hooks.to_section_diff()),
        (Section::CommandsSkills, commands_skills),
    ]
    .into_iter()
    .filter(|(_, diff)| !diff.is_empty())
    .collect()
}

/// Collapse live diffs into the sparse stored form
///
/// Added settings and MCP servers carry their values from `values`. Each
/// added MCP server config passes through `redactor` here, once, so stored
/// profiles hold environment references instead of credentials. Adds whose
/// value is unknown are dropped with a warning.
pub fn diffs_to_profile(diffs: &ProfileDiffs, values: &ValueTable, redactor: &dyn SecretRedactor) -> ProfileDefinition {
    let mut profile = ProfileDefinition::default();
    for (&section, diff) in diffs {
        match section {
            Section::Plugins => profile.plugins = diff.clone().into(),
            Section::ClaudeMd => profile.claude_md = diff.clone().into(),
            Section::Permissions => profile.permissions = diff.clone().into(),
            Section::Hooks => profile.hooks = diff.clone().into(),
            Section::Settings => {
                profile.settings = value_diff(section, diff, |key| {
                    values.settings.get(key).map(crate::value::SettingValue::to_json)
                });
            }
            Section::McpServers => {
                profile.mcp = value_diff(section, diff, |key| {
                    values.mcp.get(key).map(|config| redactor.redact(key, config))
                });
            }
            Section::Keybindings => {
                profile.keybindings = if diff.adds.contains(KEYBINDINGS_KEY) {
                    Some(true)
                } else if diff.removes.contains(KEYBINDINGS_KEY) {
                    Some(false)
                } else {
                    None
                };
            }
            Section::CommandsSkills => {
                profile.commands = diff.strip_prefix(COMMAND_KEY_PREFIX).into();
                profile.skills = diff.strip_prefix(SKILL_KEY_PREFIX).into();
            }
        }
    }
    profile
}

fn value_diff(section: Section, diff: &SectionDiff, lookup: impl Fn(&str) -> Option<Value>) -> ValueDiff {
    let mut add = BTreeMap::new();
    for key in &diff.adds {
        match lookup(key.as_str()) {
            Some(value) => {
                add.insert(key.clone(), value);
            }
            None => warn!(%section, key = %key, "Dropping profile addition with no known value"),
        }
    }
    ValueDiff {
        add,
        remove: diff.removes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::EnvRefRedactor;
    use crate::value::SettingValue;
    use serde_json::json;
    use std::cell::Cell;

    struct CountingRedactor(Cell<usize>);

    impl SecretRedactor for CountingRedactor {
        fn redact(&self, _server: &str, config: &Value) -> Value {
            self.0.set(self.0.get() + 1);
            config.clone()
        }
    }

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|k| (*k).to_string()).collect()
    }

    fn sample_values() -> ValueTable {
        let mut values = ValueTable::default();
        values.settings.insert("model".into(), SettingValue::Text("opus".into()));
        values.mcp.insert(
            "github".into(),
            json!({"command": "npx", "env": {"GITHUB_TOKEN": "ghp_secret"}}),
        );
        values
    }

    #[test]
    fn test_diffs_to_profile_is_sparse() {
        let mut diffs = ProfileDiffs::new();
        diffs.insert(
            Section::Plugins,
            SectionDiff {
                adds: keys(&["b@m"]),
                removes: BTreeSet::new(),
            },
        );
        let profile = diffs_to_profile(&diffs, &ValueTable::default(), &EnvRefRedactor);
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json, json!({"plugins": {"add": ["b@m"]}}));
    }

    #[test]
    fn test_mcp_adds_are_redacted_once() {
        let mut diffs = ProfileDiffs::new();
        diffs.insert(
            Section::McpServers,
            SectionDiff {
                adds: keys(&["github"]),
                removes: keys(&["old"]),
            },
        );
        let counter = CountingRedactor(Cell::new(0));
        diffs_to_profile(&diffs, &sample_values(), &counter);
        assert_eq!(counter.0.get(), 1);

        let profile = diffs_to_profile(&diffs, &sample_values(), &EnvRefRedactor);
        assert_eq!(profile.mcp.add["github"]["env"]["GITHUB_TOKEN"], "${GITHUB_TOKEN}");
        assert_eq!(profile.mcp.remove, keys(&["old"]));
    }

    #[test]
    fn test_unknown_values_are_dropped() {
        let mut diffs = ProfileDiffs::new();
        diffs.insert(
            Section::Settings,
            SectionDiff {
                adds: keys(&["model", "ghost"]),
                removes: BTreeSet::new(),
            },
        );
        let profile = diffs_to_profile(&diffs, &sample_values(), &EnvRefRedactor);
        assert_eq!(profile.settings.add.len(), 1);
        assert_eq!(profile.settings.add["model"], json!("opus"));
    }

    #[test]
    fn test_profile_round_trips_through_diffs() {
        let profile = ProfileDefinition {
            plugins: KeyDiff {
                add: keys(&["x@m"]),
                remove: keys(&["y@m"]),
            },
            keybindings: Some(false),
            commands: KeyDiff {
                add: keys(&["deploy"]),
                remove: BTreeSet::new(),
            },
            skills: KeyDiff {
                add: BTreeSet::new(),
                remove: keys(&["review"]),
            },
            ..ProfileDefinition::default()
        };
        let diffs = profile_to_section_diffs(&profile);
        assert_eq!(diffs.len(), 3);
        assert_eq!(diffs[&Section::CommandsSkills].adds, keys(&["cmd:deploy"]));
        assert_eq!(diffs[&Section::CommandsSkills].removes, keys(&["skill:review"]));
        assert_eq!(diffs[&Section::Keybindings].removes, keys(&[KEYBINDINGS_KEY]));

        let back = diffs_to_profile(&diffs, &ValueTable::default(), &EnvRefRedactor);
        assert_eq!(back, profile);
    }

    #[test]
    fn test_empty_profile() {
        let profile = ProfileDefinition::default();
        assert!(profile.is_empty());
        assert!(profile_to_section_diffs(&profile).is_empty());
    }
}
