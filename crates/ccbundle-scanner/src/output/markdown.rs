//! Markdown output formatter

use crate::inventory::Inventory;
use std::fmt::Write;

/// Convert inventory to a Markdown summary
#[must_use]
pub fn to_markdown(inventory: &Inventory) -> String {
    let mut output = String::new();

    output.push_str("# ccbundle Inventory\n\n");
    let _ = writeln!(
        output,
        "**Scanned at:** {}\n",
        inventory.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    output.push_str("## Host\n\n");
    let _ = writeln!(output, "- **OS:** {}", inventory.host.os);
    let _ = writeln!(output, "- **User:** {}", inventory.host.username);
    let _ = writeln!(output, "- **Home:** {}\n", inventory.host.home_dir.display());

    output.push_str("## Sections\n\n");
    output.push_str("| Section | Items |\n|---|---|\n");
    let enabled = inventory.plugins.iter().filter(|p| p.enabled).count();
    let _ = writeln!(
        output,
        "| Plugins | {} ({enabled} enabled) |",
        inventory.plugins.len()
    );
    let _ = writeln!(output, "| Settings | {} |", inventory.settings.len());
    let _ = writeln!(output, "| CLAUDE.md fragments | {} |", inventory.claude_md.len());
    let _ = writeln!(
        output,
        "| Permissions | {} allow, {} deny |",
        inventory.permissions.allow.len(),
        inventory.permissions.deny.len()
    );
    let _ = writeln!(output, "| MCP servers | {} |", inventory.mcp_servers.len());
    let _ = writeln!(
        output,
        "| Keybindings | {} |",
        if inventory.keybindings.is_some() { "present" } else { "none" }
    );
    let _ = writeln!(output, "| Hooks | {} |", inventory.hooks.len());
    let _ = writeln!(
        output,
        "| Commands & Skills | {} commands, {} skills |\n",
        inventory.commands.len(),
        inventory.skills.len()
    );

    if !inventory.plugins.is_empty() {
        output.push_str("## Plugins\n\n");
        for plugin in &inventory.plugins {
            let state = if plugin.enabled { "enabled" } else { "disabled" };
            let _ = writeln!(output, "- `{}` ({state})", plugin.key);
        }
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::PluginEntry;
    use std::path::PathBuf;

    #[test]
    fn test_markdown_lists_plugins() {
        let mut inventory = Inventory::empty(PathBuf::from("/home/me"));
        inventory.plugins.push(PluginEntry::from_key("lint@tools", true));
        let md = to_markdown(&inventory);
        assert!(md.contains("| Plugins | 1 (1 enabled) |"));
        assert!(md.contains("- `lint@tools` (enabled)"));
        assert!(md.contains("| Keybindings | none |"));
    }
}
