//! Settings.json parser

use crate::error::{ScanError, ScanResult};
use crate::settings::{HookEntry, Permissions};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys of settings.json that the bundle presents in their own sections
pub const SECTION_OWNED_KEYS: &[&str] = &["permissions", "hooks", "enabledPlugins"];

/// settings.json split into the pieces each bundle section consumes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSettings {
    /// Remaining top-level keys
    pub values: BTreeMap<String, Value>,
    /// Permission rules
    pub permissions: Permissions,
    /// `enabledPlugins` map
    pub enabled_plugins: BTreeMap<String, bool>,
    /// Flattened hook commands
    pub hooks: Vec<HookEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPermissions {
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    deny: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawHookGroup {
    matcher: Option<String>,
    #[serde(default)]
    hooks: Vec<Value>,
}

/// Parse a settings.json document
///
/// # Errors
/// Returns an error if the content is not a JSON object
pub fn parse_settings(content: &str) -> ScanResult<ParsedSettings> {
    let root: serde_json::Map<String, Value> =
        serde_json::from_str(content).map_err(ScanError::JsonParse)?;

    let mut parsed = ParsedSettings::default();

    for (key, value) in root {
        match key.as_str() {
            "permissions" => match serde_json::from_value::<RawPermissions>(value) {
                Ok(raw) => {
                    parsed.permissions = Permissions {
                        allow: raw.allow,
                        deny: raw.deny,
                    };
                }
                Err(e) => tracing::warn!("Ignoring malformed permissions block: {e}"),
            },
            "hooks" => parsed.hooks = flatten_hooks(&value),
            "enabledPlugins" => {
                if let Value::Object(map) = value {
                    parsed.enabled_plugins = map
                        .into_iter()
                        .map(|(k, v)| (k, v.as_bool().unwrap_or(false)))
                        .collect();
                }
            }
            _ => {
                parsed.values.insert(key, value);
            }
        }
    }

    Ok(parsed)
}

/// Flatten the `hooks` block into one entry per command
///
/// Entries without a `command` keep their raw JSON so they still show up
/// (and round-trip) instead of being dropped.
fn flatten_hooks(value: &Value) -> Vec<HookEntry> {
    let Value::Object(events) = value else {
        tracing::warn!("Ignoring hooks block that is not an object");
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (event, groups) in events {
        let Value::Array(groups) = groups else {
            continue;
        };
        for group in groups {
            let Ok(group) = serde_json::from_value::<RawHookGroup>(group.clone()) else {
                entries.push(HookEntry {
                    event: event.clone(),
                    matcher: None,
                    command: group.to_string(),
                });
                continue;
            };
            let matcher = group.matcher.filter(|m| !m.is_empty());
            for hook in group.hooks {
                let command = hook
                    .get("command")
                    .and_then(Value::as_str)
                    .map_or_else(|| hook.to_string(), str::to_string);
                entries.push(HookEntry {
                    event: event.clone(),
                    matcher: matcher.clone(),
                    command,
                });
            }
        }
    }
    entries
}
