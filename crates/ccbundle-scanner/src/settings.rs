//! Settings, permission, hook and MCP configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Permission rule lists from settings.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Allowed patterns
    #[serde(default)]
    pub allow: Vec<String>,
    /// Denied patterns
    #[serde(default)]
    pub deny: Vec<String>,
}

impl Permissions {
    /// Whether neither list has any rule
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// A single hook command bound to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookEntry {
    /// Trigger event (`PreToolUse`, `Stop`, ...)
    pub event: String,
    /// Optional tool matcher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    /// Shell command, or the raw JSON of an entry that had no command
    pub command: String,
}

/// MCP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    /// Server name
    pub name: String,
    /// Transport type
    pub transport: McpTransport,
    /// Command to run (for stdio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// URL (for http/sse)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP headers (for http/sse)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl McpServer {
    /// The server entry as it appears under `mcpServers` in a config file
    #[must_use]
    pub fn to_config_json(&self) -> serde_json::Value {
        let mut entry = serde_json::Map::new();
        if self.transport != McpTransport::Stdio {
            entry.insert("type".into(), self.transport.as_str().into());
        }
        if let Some(command) = &self.command {
            entry.insert("command".into(), command.clone().into());
        }
        if !self.args.is_empty() {
            entry.insert("args".into(), self.args.clone().into());
        }
        if !self.env.is_empty() {
            entry.insert("env".into(), serde_json::json!(self.env));
        }
        if let Some(url) = &self.url {
            entry.insert("url".into(), url.clone().into());
        }
        if !self.headers.is_empty() {
            entry.insert("headers".into(), serde_json::json!(self.headers));
        }
        serde_json::Value::Object(entry)
    }
}

/// MCP transport types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    Stdio,
    Http,
    Sse,
}

impl McpTransport {
    /// Config-file spelling of the transport
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }
}
