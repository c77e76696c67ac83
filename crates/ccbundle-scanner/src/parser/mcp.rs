//! MCP configuration parser

use crate::settings::{McpServer, McpTransport};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Raw .mcp.json / ~/.claude.json structure (with mcpServers wrapper)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMcpConfig {
    #[serde(default)]
    mcp_servers: HashMap<String, RawMcpServer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMcpServer {
    #[serde(rename = "type")]
    transport_type: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    url: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

/// Convert raw servers map to a name-sorted `McpServer` vec
fn convert_servers(servers: HashMap<String, RawMcpServer>) -> Vec<McpServer> {
    let mut converted: Vec<McpServer> = servers
        .into_iter()
        .map(|(name, server)| {
            let transport = match server.transport_type.as_deref() {
                Some("http") => McpTransport::Http,
                Some("sse") => McpTransport::Sse,
                _ if server.command.is_none() && server.url.is_some() => McpTransport::Http,
                _ => McpTransport::Stdio,
            };

            McpServer {
                name,
                transport,
                command: server.command,
                args: server.args,
                env: server.env,
                url: server.url,
                headers: server.headers,
            }
        })
        .collect();
    converted.sort_by(|a, b| a.name.cmp(&b.name));
    converted
}

/// Parse the servers out of an MCP configuration file
///
/// Supports two formats:
/// 1. Claude Code format: `{"mcpServers": {"name": {...}}}`
/// 2. Plugin format: `{"name": {...}}`
///
/// Content in neither format yields no servers.
#[must_use]
pub fn parse_mcp_servers(content: &str) -> Vec<McpServer> {
    if let Ok(raw) = serde_json::from_str::<RawMcpConfig>(content) {
        if !raw.mcp_servers.is_empty() {
            return convert_servers(raw.mcp_servers);
        }
    }

    if let Ok(servers) = serde_json::from_str::<HashMap<String, RawMcpServer>>(content) {
        return convert_servers(servers);
    }

    Vec::new()
}
