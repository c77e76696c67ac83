//! Parsers for Claude Code configuration files

pub mod claude_md;
pub mod frontmatter;
pub mod mcp;
pub mod settings;

pub use claude_md::split_fragments;
pub use frontmatter::{parse_command, parse_skill};
pub use mcp::parse_mcp_servers;
pub use settings::{parse_settings, ParsedSettings};

use sha2::{Digest, Sha256};

pub(crate) fn compute_sha256(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
