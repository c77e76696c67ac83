//! Wizard session: tabs, propagation, ownership, and output

use ccbundle_core::ccbundle_scanner::artifacts::CommandInfo;
use ccbundle_core::ccbundle_scanner::settings::{McpServer, McpTransport, Permissions};
use ccbundle_core::ccbundle_scanner::types::Scope;
use ccbundle_core::ccbundle_scanner::{
    DiscoveredItem, DiscoveredValue, Inventory, PluginEntry, Provenance, ScopedMcpServer,
};
use ccbundle_core::diff::{KeyDiff, ValueDiff};
use ccbundle_core::picker::{Direction, PickerAction};
use ccbundle_core::{
    BundleOptions, EnvRefRedactor, ExistingConfig, ProfileDefinition, ScanKind, Section, Tab, WizardConfig,
    WizardSession,
};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn keys(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}

fn server(name: &str, env: &[(&str, &str)]) -> McpServer {
    McpServer {
        name: name.to_string(),
        transport: McpTransport::Stdio,
        command: Some("npx".to_string()),
        args: vec![format!("@example/{name}")],
        env: env.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
        url: None,
        headers: BTreeMap::new(),
    }
}

fn command(name: &str, scope: Scope) -> CommandInfo {
    CommandInfo {
        path: PathBuf::from(format!("/commands/{name}.md")),
        name: name.to_string(),
        description: None,
        sha256: String::new(),
        scope,
    }
}

fn inventory(home: &Path) -> Inventory {
    let mut inventory = Inventory::empty(home.to_path_buf());
    inventory.plugins = vec![
        PluginEntry::from_key("lint@tools", true),
        PluginEntry::from_key("docs@tools", false),
    ];
    inventory.settings = BTreeMap::from([
        ("model".to_string(), json!("opus")),
        ("theme".to_string(), json!("dark")),
    ]);
    inventory.permissions = Permissions {
        allow: vec!["Bash(ls)".to_string()],
        deny: Vec::new(),
    };
    inventory.mcp_servers = vec![
        ScopedMcpServer {
            server: server("github", &[("GITHUB_TOKEN", "ghp_secret")]),
            scope: Scope::User,
        },
        ScopedMcpServer {
            server: server("linter", &[]),
            scope: Scope::Plugin("lint@tools".to_string()),
        },
    ];
    inventory.commands = vec![
        command("deploy", Scope::User),
        command("fix", Scope::Plugin("lint@tools".to_string())),
    ];
    inventory
}

fn session(home: &Path) -> WizardSession {
    WizardSession::new(&inventory(home), None, &WizardConfig::default())
}

fn selected(session: &WizardSession, tab: &Tab, section: Section) -> BTreeSet<String> {
    session.picker(tab, section).map(|p| p.selected_keys()).unwrap_or_default()
}

fn profile(name: &str) -> Tab {
    Tab::Profile(name.to_string())
}

#[test]
fn test_fresh_session_defaults() {
    let home = TempDir::new().unwrap();
    let session = session(home.path());

    assert_eq!(session.active_tab(), &Tab::Base);
    assert_eq!(session.active_section(), Section::Plugins);
    assert_eq!(session.selected_plugins(), keys(&["lint@tools"]));

    let mcp = session.picker(&Tab::Base, Section::McpServers).unwrap();
    let linter = mcp.item_by_key("linter").unwrap();
    assert!(linter.read_only && linter.selected);
    let commands = session.picker(&Tab::Base, Section::CommandsSkills).unwrap();
    assert!(commands.item_by_key("cmd:lint:fix").is_some_and(|i| i.read_only));
    assert!(commands.has_action());
    assert!(!session.picker(&Tab::Base, Section::Settings).unwrap().has_action());
}

#[test]
fn test_build_options_uses_nil_for_complete_sections() {
    let home = TempDir::new().unwrap();
    let session = session(home.path());

    let options = session.build_options();
    assert_eq!(options.plugins, Some(vec!["lint@tools".to_string()]));
    assert_eq!(options.settings, None);
    assert_eq!(options.mcp, None);
    assert_eq!(options.commands, None);
    assert_eq!(options.permissions, None);
    assert_eq!(options.keybindings, None);
}

#[test]
fn test_leaving_a_profile_saves_and_base_edits_flow_in() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());
    session.focus_section(Section::Settings);
    assert!(session.create_profile("work"));

    assert!(session.focus_tab(profile("work")));
    assert_eq!(session.active_picker().and_then(|p| p.current_item()).and_then(|i| i.key.as_deref()), Some("model"));
    assert!(session.toggle());
    assert!(session.focus_tab(Tab::Base));

    let diff = session.store().get("work", Section::Settings).unwrap();
    assert_eq!(diff.removes, keys(&["model"]));
    assert!(diff.adds.is_empty());

    session.navigate(Direction::Down);
    assert!(session.toggle());
    assert_eq!(selected(&session, &Tab::Base, Section::Settings), keys(&["model"]));
    assert!(selected(&session, &profile("work"), Section::Settings).is_empty());

    session.select_all();
    assert_eq!(selected(&session, &profile("work"), Section::Settings), keys(&["theme"]));
}

#[test]
fn test_section_switch_inside_profile_saves() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());
    session.create_profile("work");
    session.focus_tab(profile("work"));
    session.focus_section(Section::Permissions);
    session.select_none();
    session.focus_section(Section::Settings);

    let diff = session.store().get("work", Section::Permissions).unwrap();
    assert_eq!(diff.removes, keys(&["allow:Bash(ls)"]));
    assert_eq!(selected(&session, &Tab::Base, Section::Permissions), keys(&["allow:Bash(ls)"]));
}

#[test]
fn test_base_plugin_toggle_moves_ownership_everywhere() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());
    session.create_profile("work");

    assert_eq!(session.active_picker().and_then(|p| p.current_item()).and_then(|i| i.key.as_deref()), Some("lint@tools"));
    assert!(session.toggle());

    for tab in [Tab::Base, profile("work")] {
        let mcp = session.picker(&tab, Section::McpServers).unwrap();
        let linter = mcp.item_by_key("linter").unwrap();
        assert!(!linter.read_only, "{tab}");
        assert!(!linter.selected, "{tab}");
        let commands = session.picker(&tab, Section::CommandsSkills).unwrap();
        assert!(commands.item_by_key("cmd:lint:fix").is_some_and(|i| !i.read_only && !i.selected));
    }

    assert!(session.toggle());
    for tab in [Tab::Base, profile("work")] {
        let linter = session.picker(&tab, Section::McpServers).unwrap().item_by_key("linter").unwrap();
        assert!(linter.read_only && linter.selected, "{tab}");
    }
}

#[test]
fn test_profile_plugin_toggle_only_affects_that_profile() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());
    session.create_profile("work");
    session.focus_tab(profile("work"));
    assert!(session.toggle());

    let linter = |tab: &Tab| {
        session
            .picker(tab, Section::McpServers)
            .and_then(|p| p.item_by_key("linter"))
            .map(|i| (i.read_only, i.selected))
    };
    assert_eq!(linter(&profile("work")), Some((false, false)));
    assert_eq!(linter(&Tab::Base), Some((true, true)));

    let definitions = session.profile_definitions(&EnvRefRedactor);
    let work = &definitions["work"];
    assert_eq!(work.plugins.remove, keys(&["lint@tools"]));
    assert!(work.mcp.is_empty());
    assert!(work.commands.is_empty());
}

#[test]
fn test_profile_definitions_redact_added_servers() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());
    session.focus_section(Section::McpServers);
    assert!(session.toggle());
    assert_eq!(session.build_options().mcp, Some(Vec::new()));

    session.create_profile("oss");
    session.set_profile_description("oss", "Open source work");
    session.focus_tab(profile("oss"));
    assert!(session.toggle());

    let definitions = session.profile_definitions(&EnvRefRedactor);
    let oss = &definitions["oss"];
    assert_eq!(oss.description.as_deref(), Some("Open source work"));
    assert_eq!(oss.mcp.add["github"]["env"]["GITHUB_TOKEN"], "${GITHUB_TOKEN}");
    assert_eq!(oss.mcp.add["github"]["command"], "npx");
    assert!(oss.plugins.is_empty());
}

#[test]
fn test_unknown_profile_operations_are_noops() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());

    assert!(!session.focus_tab(profile("ghost")));
    assert_eq!(session.active_tab(), &Tab::Base);
    assert!(!session.set_profile_description("ghost", "boo"));
    assert!(!session.remove_profile("ghost"));
    assert!(session.picker(&profile("ghost"), Section::Plugins).is_none());
}

#[test]
fn test_removing_active_profile_returns_to_base() {
    let home = TempDir::new().unwrap();
    let mut session = session(home.path());
    session.create_profile("work");
    assert!(!session.create_profile("work"));
    session.focus_tab(profile("work"));

    assert!(session.remove_profile("work"));
    assert_eq!(session.active_tab(), &Tab::Base);
    assert_eq!(session.profile_names().count(), 0);
    assert!(session.active_picker().is_some_and(|p| p.is_focused()));
}

#[test]
fn test_edit_session_loads_existing_profiles() {
    let home = TempDir::new().unwrap();
    let existing = ExistingConfig {
        options: BundleOptions {
            plugins: Some(vec!["lint@tools".to_string(), "docs@tools".to_string()]),
            settings: Some(vec!["theme".to_string()]),
            ..BundleOptions::default()
        },
        profiles: BTreeMap::from([(
            "oss".to_string(),
            ProfileDefinition {
                description: Some("Open source".to_string()),
                plugins: KeyDiff {
                    add: BTreeSet::new(),
                    remove: keys(&["docs@tools"]),
                },
                settings: ValueDiff {
                    add: BTreeMap::from([("editor".to_string(), json!("vim"))]),
                    remove: BTreeSet::new(),
                },
                ..ProfileDefinition::default()
            },
        )]),
    };
    let mut session = WizardSession::new(&inventory(home.path()), Some(&existing), &WizardConfig::default());

    assert_eq!(session.selected_plugins(), keys(&["docs@tools", "lint@tools"]));
    assert_eq!(selected(&session, &Tab::Base, Section::Settings), keys(&["theme"]));
    assert_eq!(selected(&session, &profile("oss"), Section::Plugins), keys(&["lint@tools"]));

    let definitions = session.profile_definitions(&EnvRefRedactor);
    let oss = &definitions["oss"];
    assert_eq!(oss.description.as_deref(), Some("Open source"));
    assert_eq!(oss.plugins.remove, keys(&["docs@tools"]));
    assert_eq!(oss.settings.add.get("editor"), Some(&json!("vim")));
}

#[test]
fn test_profile_tab_visit_keeps_adds_without_rows() {
    let home = TempDir::new().unwrap();
    let existing = ExistingConfig {
        options: BundleOptions::default(),
        profiles: BTreeMap::from([(
            "p".to_string(),
            ProfileDefinition {
                plugins: KeyDiff {
                    add: keys(&["remote@market"]),
                    remove: BTreeSet::new(),
                },
                settings: ValueDiff {
                    add: BTreeMap::from([("editor".to_string(), json!("vim"))]),
                    remove: BTreeSet::new(),
                },
                ..ProfileDefinition::default()
            },
        )]),
    };
    let inventory = Inventory::empty(home.path().to_path_buf());
    let mut session = WizardSession::new(&inventory, Some(&existing), &WizardConfig::default());

    assert!(session.focus_tab(profile("p")));
    session.focus_section(Section::Settings);
    assert!(session.focus_tab(Tab::Base));

    let definitions = session.profile_definitions(&EnvRefRedactor);
    let p = &definitions["p"];
    assert_eq!(p.plugins.add, keys(&["remote@market"]));
    assert_eq!(p.settings.add.get("editor"), Some(&json!("vim")));
}

#[test]
fn test_discovery_into_active_profile_keeps_stored_remove() {
    let home = TempDir::new().unwrap();
    let found = "~/code/app/CLAUDE.md";
    let existing = ExistingConfig {
        options: BundleOptions {
            claude_md: Some(vec![found.to_string()]),
            ..BundleOptions::default()
        },
        profiles: BTreeMap::from([(
            "p".to_string(),
            ProfileDefinition {
                claude_md: KeyDiff {
                    add: BTreeSet::new(),
                    remove: keys(&[found]),
                },
                ..ProfileDefinition::default()
            },
        )]),
    };
    let mut session = WizardSession::new(&inventory(home.path()), Some(&existing), &WizardConfig::default());
    assert!(session.focus_tab(profile("p")));
    session.focus_section(Section::ClaudeMd);

    let started = session.start_discovery_with(
        ScanKind::ClaudeMd,
        Box::new(move || {
            Ok(vec![DiscoveredItem {
                key: found.to_string(),
                value: DiscoveredValue::ClaudeMd {
                    path: PathBuf::from(found),
                    content: "# App".to_string(),
                },
                provenance: Provenance {
                    source: "~/code/app".to_string(),
                    owner_plugin: None,
                },
            }])
        }),
    );
    assert!(started);
    assert_eq!(session.wait_for_discovery(), 1);

    assert!(selected(&session, &Tab::Base, Section::ClaudeMd).contains(found));
    let row = session
        .picker(&profile("p"), Section::ClaudeMd)
        .and_then(|picker| picker.item_by_key(found).cloned())
        .expect("row merged into profile");
    assert!(row.base_inherited);
    assert!(!row.selected);

    session.focus_section(Section::Plugins);
    let definitions = session.profile_definitions(&EnvRefRedactor);
    assert_eq!(definitions["p"].claude_md.remove, keys(&[found]));
}

#[test]
fn test_search_action_starts_and_merges_discovery() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("code").join("app");
    fs::create_dir_all(&project).unwrap();
    fs::write(project.join("CLAUDE.md"), "# App\n\nUse tabs.\n").unwrap();

    let mut session = session(home.path());
    session.create_profile("work");
    session.focus_section(Section::ClaudeMd);
    assert!(session.active_picker().is_some_and(|p| p.is_on_action_row()));

    assert_eq!(session.activate(), Some(PickerAction::Scan));
    assert!(session.coordinator().is_scanning(ccbundle_core::ScanKind::ClaudeMd));
    assert!(session.active_picker().is_some_and(|p| p.is_searching()));
    assert_eq!(session.activate(), None);

    assert_eq!(session.wait_for_discovery(), 1);
    let base = session.picker(&Tab::Base, Section::ClaudeMd).unwrap();
    assert!(!base.is_searching());
    assert_eq!(base.selected_keys().len(), 1);
    let key = base.selected_keys().into_iter().next().unwrap();
    assert!(key.ends_with("CLAUDE.md"));
    assert!(session.values().claude_md.contains_key(&key));

    let copy = session.picker(&profile("work"), Section::ClaudeMd).unwrap();
    assert!(copy.item_by_key(&key).is_some_and(|i| i.selected && i.base_inherited));
    assert!(!copy.is_searching());
}

#[test]
fn test_disabled_discovery_does_not_start() {
    let home = TempDir::new().unwrap();
    let mut config = WizardConfig::default();
    config.discovery.mcp = false;
    let mut session = WizardSession::new(&inventory(home.path()), None, &config);

    assert!(!session.start_discovery(ccbundle_core::ScanKind::Mcp));
    assert_eq!(session.start_all_discovery(), 2);
    session.wait_for_discovery();
    assert!(!session.coordinator().has_pending());
}
