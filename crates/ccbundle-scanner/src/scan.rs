//! Main scanner implementation

use crate::artifacts::{CommandInfo, SkillInfo};
use crate::error::{ScanError, ScanResult};
use crate::inventory::{Inventory, PluginEntry, ScopedMcpServer};
use crate::parser::{parse_command, parse_mcp_servers, parse_settings, parse_skill, split_fragments};
use crate::plugins::scan_plugins;
use crate::types::Scope;
use std::fs;
use std::path::{Path, PathBuf};

/// Scans one user's Claude Code configuration into an [`Inventory`]
#[derive(Debug, Clone)]
pub struct Scanner {
    home: PathBuf,
}

impl Scanner {
    /// Create a scanner rooted at `home` (the directory holding `.claude/`)
    #[must_use]
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Create a scanner for the current user's home directory
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn for_current_user() -> ScanResult<Self> {
        dirs::home_dir().map(Self::new).ok_or(ScanError::HomeNotFound)
    }

    /// Home directory this scanner reads from
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The `~/.claude` directory
    #[must_use]
    pub fn claude_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    /// Perform a full inventory scan
    ///
    /// Missing files produce empty sections. Unparseable skills or commands are
    /// skipped with a warning.
    ///
    /// # Errors
    /// Returns an error if an existing settings or plugin index file cannot be
    /// read or is not valid JSON
    pub fn scan(&self) -> ScanResult<Inventory> {
        let claude_dir = self.claude_dir();
        let mut inventory = Inventory::empty(self.home.clone());
        tracing::debug!("Scanning inventory under {}", claude_dir.display());

        let settings_path = claude_dir.join("settings.json");
        let settings = if settings_path.exists() {
            parse_settings(&fs::read_to_string(&settings_path)?)?
        } else {
            crate::parser::ParsedSettings::default()
        };

        inventory.plugins = scan_plugins(&claude_dir.join("plugins"), &settings.enabled_plugins)?;
        inventory.settings = settings.values;
        inventory.permissions = settings.permissions;
        inventory.hooks = settings.hooks;

        let claude_md = claude_dir.join("CLAUDE.md");
        if claude_md.exists() {
            inventory.claude_md = split_fragments(&fs::read_to_string(&claude_md)?);
        }

        let keybindings = claude_dir.join("keybindings.json");
        if keybindings.exists() {
            match serde_json::from_str(&fs::read_to_string(&keybindings)?) {
                Ok(value) => inventory.keybindings = Some(value),
                Err(e) => tracing::warn!("Ignoring unparseable {}: {e}", keybindings.display()),
            }
        }

        inventory.mcp_servers = self.scan_mcp(&inventory.plugins)?;
        inventory.commands = scan_commands_directory(&claude_dir.join("commands"), &Scope::User);
        inventory.skills = scan_skills_directory(&claude_dir.join("skills"), &Scope::User);

        tracing::info!(
            plugins = inventory.plugins.len(),
            settings = inventory.settings.len(),
            fragments = inventory.claude_md.len(),
            mcp_servers = inventory.mcp_servers.len(),
            hooks = inventory.hooks.len(),
            commands = inventory.commands.len(),
            skills = inventory.skills.len(),
            "Inventory scan complete"
        );
        Ok(inventory)
    }

    /// User MCP servers from `~/.claude.json` plus servers shipped by plugins
    fn scan_mcp(&self, plugins: &[PluginEntry]) -> ScanResult<Vec<ScopedMcpServer>> {
        let mut servers = Vec::new();

        // User MCP config is at ~/.claude.json (not in .claude/)
        let user_path = self.home.join(".claude.json");
        if user_path.exists() {
            let content = fs::read_to_string(&user_path)?;
            servers.extend(parse_mcp_servers(&content).into_iter().map(|server| {
                ScopedMcpServer {
                    server,
                    scope: Scope::User,
                }
            }));
        }

        for plugin in plugins {
            let Some(path) = &plugin.path else { continue };
            let mcp_path = path.join(".mcp.json");
            let Ok(content) = fs::read_to_string(&mcp_path) else {
                continue;
            };
            servers.extend(parse_mcp_servers(&content).into_iter().map(|server| {
                ScopedMcpServer {
                    server,
                    scope: Scope::Plugin(plugin.key.clone()),
                }
            }));
        }

        Ok(servers)
    }
}

/// Scan a directory for skill folders (each containing SKILL.md)
#[must_use]
pub fn scan_skills_directory(dir: &Path, scope: &Scope) -> Vec<SkillInfo> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut skills: Vec<SkillInfo> = entries
        .flatten()
        .map(|entry| entry.path().join("SKILL.md"))
        .filter(|skill_file| skill_file.is_file())
        .filter_map(|skill_file| read_skill(&skill_file, scope))
        .collect();
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    skills
}

/// Scan a directory for command files (.md files)
#[must_use]
pub fn scan_commands_directory(dir: &Path, scope: &Scope) -> Vec<CommandInfo> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut commands: Vec<CommandInfo> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "md"))
        .filter_map(|path| read_command(&path, scope))
        .collect();
    commands.sort_by(|a, b| a.name.cmp(&b.name));
    commands
}

pub(crate) fn read_skill(skill_file: &Path, scope: &Scope) -> Option<SkillInfo> {
    match fs::read_to_string(skill_file) {
        Ok(content) => match parse_skill(skill_file, &content, scope.clone()) {
            Ok(skill) => Some(skill),
            Err(e) => {
                tracing::warn!("Failed to parse skill at {}: {e}", skill_file.display());
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read skill file {}: {e}", skill_file.display());
            None
        }
    }
}

pub(crate) fn read_command(path: &Path, scope: &Scope) -> Option<CommandInfo> {
    match fs::read_to_string(path) {
        Ok(content) => match parse_command(path, &content, scope.clone()) {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                tracing::warn!("Failed to parse command at {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read command file {}: {e}", path.display());
            None
        }
    }
}
