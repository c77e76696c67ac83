//! YAML frontmatter of skill and command files

use crate::artifacts::{CommandInfo, SkillInfo};
use crate::error::{ScanError, ScanResult};
use crate::types::Scope;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

use super::compute_sha256;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SkillHeader {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    user_invocable: bool,
    #[serde(default)]
    allowed_tools: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CommandHeader {
    description: Option<String>,
}

/// Deserialize the frontmatter block of `content`, `None` if there is none
fn header<T: DeserializeOwned>(content: &str) -> ScanResult<Option<T>> {
    let Some(data) = Matter::<YAML>::new().parse(content).data else {
        return Ok(None);
    };
    data.deserialize::<T>()
        .map(Some)
        .map_err(|e| ScanError::FrontmatterParse(e.to_string()))
}

/// Parse a `SKILL.md`
///
/// # Errors
/// Fails when the frontmatter is missing or has no `name`
pub fn parse_skill(path: &Path, content: &str, scope: Scope) -> ScanResult<SkillInfo> {
    let skill: SkillHeader = header(content)?.ok_or(ScanError::NoFrontmatter)?;
    Ok(SkillInfo {
        path: path.to_path_buf(),
        name: skill.name,
        description: skill.description,
        user_invocable: skill.user_invocable,
        allowed_tools: skill.allowed_tools,
        sha256: compute_sha256(content),
        scope,
    })
}

/// Parse a command file; the name is the file stem and frontmatter is optional
///
/// Unreadable frontmatter leaves the description empty.
///
/// # Errors
/// Never fails today; shares the parser signature
pub fn parse_command(path: &Path, content: &str, scope: Scope) -> ScanResult<CommandInfo> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();
    let description = header::<CommandHeader>(content)
        .ok()
        .flatten()
        .unwrap_or_default()
        .description;

    Ok(CommandInfo {
        path: path.to_path_buf(),
        name,
        description,
        sha256: compute_sha256(content),
        scope,
    })
}
