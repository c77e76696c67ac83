//! Picker rows for each section, built from an inventory snapshot

use crate::bundle::{BundleOptions, ALLOW_KEY_PREFIX, DENY_KEY_PREFIX};
use crate::item::Item;
use crate::section::Section;
use crate::value::SettingValue;
use ccbundle_scanner::discover::{DiscoveredItem, DiscoveredValue};
use ccbundle_scanner::settings::HookEntry;
use ccbundle_scanner::Inventory;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Key of the single Keybindings row
pub const KEYBINDINGS_KEY: &str = "keybindings";

const SETTING_PREVIEW_CHARS: usize = 48;
const OTHER_MARKETPLACE: &str = "Other";

/// Values behind item keys, for sections whose persisted form needs more than the key
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    pub settings: BTreeMap<String, SettingValue>,
    /// MCP server configs as they appear under `mcpServers`
    pub mcp: BTreeMap<String, Value>,
    /// CLAUDE.md fragment and file contents
    pub claude_md: BTreeMap<String, String>,
    pub keybindings: Option<Value>,
}

impl ValueTable {
    #[must_use]
    pub fn from_inventory(inventory: &Inventory) -> Self {
        let mut table = Self {
            settings: inventory
                .settings
                .iter()
                .map(|(k, v)| (k.clone(), SettingValue::from(v.clone())))
                .collect(),
            keybindings: inventory.keybindings.clone(),
            ..Self::default()
        };
        for scoped in &inventory.mcp_servers {
            table
                .mcp
                .entry(scoped.server.name.clone())
                .or_insert_with(|| scoped.server.to_config_json());
        }
        for fragment in &inventory.claude_md {
            table.claude_md.insert(fragment.key.clone(), fragment.content.clone());
        }
        table
    }

    /// Remember the value of a discovered item (first value per key wins)
    pub fn absorb(&mut self, found: &DiscoveredItem) {
        match &found.value {
            DiscoveredValue::McpServer(server) => {
                self.mcp
                    .entry(found.key.clone())
                    .or_insert_with(|| server.to_config_json());
            }
            DiscoveredValue::ClaudeMd { content, .. } => {
                self.claude_md
                    .entry(found.key.clone())
                    .or_insert_with(|| content.clone());
            }
            DiscoveredValue::Command(_) | DiscoveredValue::Skill(_) => {}
        }
    }
}

/// Builds the initial rows of every section
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    inventory: &'a Inventory,
    existing: Option<&'a BundleOptions>,
}

impl<'a> Catalog<'a> {
    /// `existing` seeds selection in an edit session
    #[must_use]
    pub fn new(inventory: &'a Inventory, existing: Option<&'a BundleOptions>) -> Self {
        Self { inventory, existing }
    }

    fn default_selected(&self, section: Section, key: &str, fresh: bool) -> bool {
        match self.existing {
            Some(options) => options.includes(section, key),
            None => fresh,
        }
    }

    /// Rows of `section`; `selected_plugins` locks the rows those plugins own
    #[must_use]
    pub fn items(&self, section: Section, selected_plugins: &BTreeSet<String>) -> Vec<Item> {
        match section {
            Section::Plugins => self.plugin_items(),
            Section::Settings => self.setting_items(),
            Section::ClaudeMd => self.claude_md_items(),
            Section::Permissions => self.permission_items(),
            Section::McpServers => self.mcp_items(selected_plugins),
            Section::Keybindings => self.keybinding_items(),
            Section::Hooks => self.hook_items(),
            Section::CommandsSkills => self.command_skill_items(selected_plugins),
        }
    }

    /// Plugin keys selected by default
    #[must_use]
    pub fn selected_plugins(&self) -> BTreeSet<String> {
        self.plugin_items()
            .into_iter()
            .filter(|item| item.selected)
            .filter_map(|item| item.key)
            .collect()
    }

    fn plugin_items(&self) -> Vec<Item> {
        let mut by_marketplace: BTreeMap<&str, Vec<Item>> = BTreeMap::new();
        for plugin in &self.inventory.plugins {
            let marketplace = plugin.marketplace.as_deref().unwrap_or(OTHER_MARKETPLACE);
            let mut item = Item::new(&plugin.key, &plugin.name)
                .with_provider_tag(marketplace)
                .selected(self.default_selected(Section::Plugins, &plugin.key, plugin.enabled));
            if let Some(version) = &plugin.version {
                item = item.with_tag(version);
            }
            by_marketplace.entry(marketplace).or_default().push(item);
        }
        by_marketplace
            .into_iter()
            .flat_map(|(marketplace, items)| std::iter::once(Item::header(marketplace)).chain(items))
            .collect()
    }

    fn setting_items(&self) -> Vec<Item> {
        let mut items = Vec::new();
        for (key, value) in &self.inventory.settings {
            let value = SettingValue::from(value.clone());
            items.push(
                Item::new(key, format!("{key}: {}", value.preview(SETTING_PREVIEW_CHARS)))
                    .with_tag(value.kind())
                    .selected(self.default_selected(Section::Settings, key, true)),
            );
        }
        with_header("settings.json", items)
    }

    fn claude_md_items(&self) -> Vec<Item> {
        let items = self
            .inventory
            .claude_md
            .iter()
            .map(|fragment| {
                Item::new(&fragment.key, &fragment.heading)
                    .selected(self.default_selected(Section::ClaudeMd, &fragment.key, true))
            })
            .collect();
        with_header("~/.claude/CLAUDE.md", items)
    }

    fn permission_items(&self) -> Vec<Item> {
        let permissions = &self.inventory.permissions;
        let rules = |prefix: &str, rules: &[String]| -> Vec<Item> {
            rules
                .iter()
                .map(|rule| {
                    let key = format!("{prefix}{rule}");
                    let selected = self.default_selected(Section::Permissions, &key, true);
                    Item::new(key, rule).selected(selected)
                })
                .collect()
        };
        let mut items = with_header("Allow", rules(ALLOW_KEY_PREFIX, &permissions.allow));
        items.extend(with_header("Deny", rules(DENY_KEY_PREFIX, &permissions.deny)));
        items
    }

    fn mcp_items(&self, selected_plugins: &BTreeSet<String>) -> Vec<Item> {
        let mut seen = HashSet::new();
        let mut user = Vec::new();
        let mut by_plugin: BTreeMap<&str, Vec<Item>> = BTreeMap::new();

        for scoped in &self.inventory.mcp_servers {
            let server = &scoped.server;
            if !seen.insert(server.name.as_str()) {
                continue;
            }
            let item = Item::new(&server.name, &server.name).with_tag(server.transport.as_str());
            match scoped.scope.plugin_id() {
                Some(plugin) => by_plugin
                    .entry(plugin)
                    .or_default()
                    .push(item.owned_by(plugin, selected_plugins.contains(plugin))),
                None => user.push(item.selected(self.default_selected(Section::McpServers, &server.name, true))),
            }
        }

        let mut items = with_header("User", user);
        for (plugin, servers) in by_plugin {
            items.push(Item::header(plugin_header(plugin)));
            items.push(Item::description("Bundled with the plugin; follows its selection"));
            items.extend(servers);
        }
        items
    }

    fn keybinding_items(&self) -> Vec<Item> {
        if self.inventory.keybindings.is_none() {
            return Vec::new();
        }
        vec![
            Item::description("keybindings.json is bundled as a whole"),
            Item::new(KEYBINDINGS_KEY, "~/.claude/keybindings.json")
                .selected(self.default_selected(Section::Keybindings, KEYBINDINGS_KEY, true)),
        ]
    }

    fn hook_items(&self) -> Vec<Item> {
        let mut by_event: BTreeMap<&str, Vec<Item>> = BTreeMap::new();
        let mut seen = HashSet::new();
        for hook in &self.inventory.hooks {
            let key = hook_key(&hook.event, hook.matcher.as_deref(), &hook.command);
            if !seen.insert(key.clone()) {
                continue;
            }
            let display = hook_label(&key);
            let selected = self.default_selected(Section::Hooks, &key, true);
            by_event
                .entry(&hook.event)
                .or_default()
                .push(Item::new(key, display).selected(selected));
        }
        by_event
            .into_iter()
            .flat_map(|(event, items)| std::iter::once(Item::header(event)).chain(items))
            .collect()
    }

    fn command_skill_items(&self, selected_plugins: &BTreeSet<String>) -> Vec<Item> {
        let row = |key: String, display: String, tag: Option<&str>, plugin: Option<&str>| {
            let mut item = Item::new(&key, display);
            if let Some(tag) = tag.filter(|t| !t.is_empty()) {
                item = item.with_tag(tag);
            }
            match plugin {
                Some(plugin) => item.owned_by(plugin, selected_plugins.contains(plugin)),
                None => {
                    let selected = self.default_selected(Section::CommandsSkills, &key, true);
                    item.selected(selected)
                }
            }
        };

        let commands = self
            .inventory
            .commands
            .iter()
            .map(|c| row(c.key(), format!("/{}", c.name), c.description.as_deref(), c.scope.plugin_id()))
            .collect();
        let skills = self
            .inventory
            .skills
            .iter()
            .map(|s| row(s.key(), s.name.clone(), Some(s.description.as_str()), s.scope.plugin_id()))
            .collect();

        let mut items = with_header("Commands", commands);
        items.extend(with_header("Skills", skills));
        items
    }
}

/// Header label of rows provided by `plugin`
#[must_use]
pub fn plugin_header(plugin: &str) -> String {
    format!("plugin: {plugin}")
}

/// Prefix `items` with a header, or return nothing for an empty group
fn with_header(label: &str, items: Vec<Item>) -> Vec<Item> {
    if items.is_empty() {
        return items;
    }
    std::iter::once(Item::header(label)).chain(items).collect()
}

/// Encode a hook as `event|matcher|command`, escaping `|` and `\` in the matcher
#[must_use]
pub fn hook_key(event: &str, matcher: Option<&str>, command: &str) -> String {
    let matcher = matcher.unwrap_or_default().replace('\\', "\\\\").replace('|', "\\|");
    format!("{event}|{matcher}|{command}")
}

/// Decode a key produced by [`hook_key`]
#[must_use]
pub fn parse_hook_key(key: &str) -> Option<HookEntry> {
    let (event, rest) = key.split_once('|')?;
    if event.is_empty() {
        return None;
    }
    let mut matcher = String::new();
    let mut chars = rest.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => matcher.push(chars.next()?.1),
            '|' => {
                return Some(HookEntry {
                    event: event.to_string(),
                    matcher: (!matcher.is_empty()).then_some(matcher),
                    command: rest[idx + 1..].to_string(),
                });
            }
            _ => matcher.push(c),
        }
    }
    None
}

/// Row text of a hook key: `[matcher] command`, or the raw key when it does not parse
#[must_use]
pub fn hook_label(key: &str) -> String {
    match parse_hook_key(key) {
        Some(HookEntry {
            matcher: Some(matcher),
            command,
            ..
        }) => format!("[{matcher}] {command}"),
        Some(hook) => hook.command,
        None => key.to_string(),
    }
}
