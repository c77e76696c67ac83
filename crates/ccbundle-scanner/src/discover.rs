//! Discovery crawls
//!
//! Slow filesystem walks that find configuration living outside `~/.claude`:
//! project `CLAUDE.md` files, project `.mcp.json` servers, and project or
//! plugin provided commands and skills. Each crawl produces a flat list of
//! [`DiscoveredItem`]s; deciding which of them are new is the caller's job.

use crate::artifacts::{CommandInfo, SkillInfo};
use crate::error::{ScanError, ScanResult};
use crate::parser::parse_mcp_servers;
use crate::scan::{read_command, read_skill};
use crate::settings::McpServer;
use crate::types::{tilde_path, Scope};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names skipped by default
pub const DEFAULT_EXCLUDES: &[&str] = &["node_modules", ".git", "target", "vendor"];

/// Where a discovered item came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Group label shown above the item (usually a `~/...` directory)
    pub source: String,
    /// Plugin key (`name@marketplace`) when the item ships with a plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_plugin: Option<String>,
}

/// Payload of a discovered item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveredValue {
    /// A whole CLAUDE.md file
    ClaudeMd { path: PathBuf, content: String },
    /// An MCP server declared in a project `.mcp.json`
    McpServer(McpServer),
    /// A command file
    Command(CommandInfo),
    /// A skill directory
    Skill(SkillInfo),
}

/// One entity found by a crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredItem {
    /// Item key, unique within its section
    pub key: String,
    /// Payload
    pub value: DiscoveredValue,
    /// Where it was found
    pub provenance: Provenance,
}

/// Options shared by all crawls
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Home directory; `~/.claude` is never crawled and labels are `~`-relative
    pub home: PathBuf,
    /// Directories to walk
    pub roots: Vec<PathBuf>,
    /// How many directory levels below a root a project may sit
    pub max_depth: usize,
    /// Directory names to prune
    pub exclude: Vec<String>,
    /// Installed plugins to search for commands and skills, as `(key, install path)`
    pub plugin_dirs: Vec<(String, PathBuf)>,
}

impl CrawlOptions {
    /// Options crawling `roots` with default depth and excludes
    #[must_use]
    pub fn new(home: impl Into<PathBuf>, roots: Vec<PathBuf>) -> Self {
        Self {
            home: home.into(),
            roots,
            max_depth: 4,
            exclude: DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
            plugin_dirs: Vec::new(),
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if path == self.home.join(".claude") {
            return true;
        }
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.exclude.iter().any(|ex| ex == name))
    }

    fn label(&self, dir: &Path) -> String {
        tilde_path(dir, &self.home)
    }

    /// Walk every root, yielding files accepted by `keep`
    ///
    /// `extra_depth` is how far below a project directory the wanted files sit.
    fn walk(&self, extra_depth: usize, keep: impl Fn(&Path) -> bool) -> ScanResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                tracing::debug!("Skipping missing crawl root {}", root.display());
                continue;
            }
            let walker = WalkDir::new(root)
                .max_depth(self.max_depth + extra_depth)
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry.path()));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) if e.depth() == 0 => {
                        return Err(ScanError::Walk {
                            root: root.display().to_string(),
                            message: e.to_string(),
                        });
                    }
                    Err(e) => {
                        tracing::debug!("Skipping unreadable entry: {e}");
                        continue;
                    }
                };
                if entry.file_type().is_file() && keep(entry.path()) {
                    found.push(entry.into_path());
                }
            }
        }
        found.sort();
        found.dedup();
        Ok(found)
    }
}

/// Find every `CLAUDE.md` below the crawl roots
///
/// # Errors
/// Returns an error if a root exists but cannot be read
pub fn crawl_claude_md(options: &CrawlOptions) -> ScanResult<Vec<DiscoveredItem>> {
    let paths = options.walk(1, |path| path.file_name().is_some_and(|n| n == "CLAUDE.md"))?;

    let items = paths
        .par_iter()
        .filter_map(|path| {
            let content = fs::read_to_string(path).ok()?;
            let dir = path.parent().unwrap_or(path.as_path());
            Some(DiscoveredItem {
                key: options.label(path),
                value: DiscoveredValue::ClaudeMd {
                    path: path.clone(),
                    content,
                },
                provenance: Provenance {
                    source: options.label(dir),
                    owner_plugin: None,
                },
            })
        })
        .collect();
    Ok(items)
}

/// Find MCP servers declared in project `.mcp.json` files
///
/// # Errors
/// Returns an error if a root exists but cannot be read
pub fn crawl_mcp_configs(options: &CrawlOptions) -> ScanResult<Vec<DiscoveredItem>> {
    let paths = options.walk(1, |path| path.file_name().is_some_and(|n| n == ".mcp.json"))?;

    let items: Vec<Vec<DiscoveredItem>> = paths
        .par_iter()
        .filter_map(|path| {
            let content = fs::read_to_string(path).ok()?;
            let source = options.label(path.parent().unwrap_or(path.as_path()));
            Some(
                parse_mcp_servers(&content)
                    .into_iter()
                    .map(|server| DiscoveredItem {
                        key: server.name.clone(),
                        value: DiscoveredValue::McpServer(server),
                        provenance: Provenance {
                            source: source.clone(),
                            owner_plugin: None,
                        },
                    })
                    .collect(),
            )
        })
        .collect();
    Ok(items.into_iter().flatten().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArtifactKind {
    Command,
    Skill,
}

/// Classify `path` as a command or skill file inside `container`
///
/// `container` decides whether a directory holds `commands/` and `skills/`:
/// a project's `.claude` directory, or a plugin's install root.
fn artifact_kind(path: &Path, container: &dyn Fn(&Path) -> bool) -> Option<ArtifactKind> {
    let parent = path.parent()?;
    if path.file_name()? == "SKILL.md" {
        let skills = parent.parent()?;
        if skills.file_name()? == "skills" && container(skills.parent()?) {
            return Some(ArtifactKind::Skill);
        }
    } else if path.extension().is_some_and(|e| e == "md")
        && parent.file_name()? == "commands"
        && container(parent.parent()?)
    {
        return Some(ArtifactKind::Command);
    }
    None
}

fn read_artifact(
    path: &Path,
    kind: ArtifactKind,
    scope: &Scope,
    provenance: Provenance,
) -> Option<DiscoveredItem> {
    let (key, value) = match kind {
        ArtifactKind::Command => {
            let cmd = read_command(path, scope)?;
            (cmd.key(), DiscoveredValue::Command(cmd))
        }
        ArtifactKind::Skill => {
            let skill = read_skill(path, scope)?;
            (skill.key(), DiscoveredValue::Skill(skill))
        }
    };
    Some(DiscoveredItem {
        key,
        value,
        provenance,
    })
}

/// Find commands and skills in project `.claude` directories and installed plugins
///
/// # Errors
/// Returns an error if a root exists but cannot be read
pub fn crawl_commands_skills(options: &CrawlOptions) -> ScanResult<Vec<DiscoveredItem>> {
    let is_claude_dir = |dir: &Path| dir.file_name().is_some_and(|n| n == ".claude");
    let project_paths = options.walk(4, |path| artifact_kind(path, &is_claude_dir).is_some())?;

    let mut items: Vec<DiscoveredItem> = project_paths
        .par_iter()
        .filter_map(|path| {
            let kind = artifact_kind(path, &is_claude_dir)?;
            let project = path
                .ancestors()
                .find(|dir| is_claude_dir(dir))
                .and_then(Path::parent)?;
            let provenance = Provenance {
                source: options.label(project),
                owner_plugin: None,
            };
            read_artifact(path, kind, &Scope::Project, provenance)
        })
        .collect();

    for (plugin_key, root) in &options.plugin_dirs {
        let is_root = |dir: &Path| dir == root.as_path();
        let scope = Scope::Plugin(plugin_key.clone());
        let found: Vec<DiscoveredItem> = WalkDir::new(root)
            .max_depth(3)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let kind = artifact_kind(entry.path(), &is_root)?;
                let provenance = Provenance {
                    source: format!("plugin: {plugin_key}"),
                    owner_plugin: Some(plugin_key.clone()),
                };
                read_artifact(entry.path(), kind, &scope, provenance)
            })
            .collect();
        items.extend(found);
    }

    items.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(items)
}
