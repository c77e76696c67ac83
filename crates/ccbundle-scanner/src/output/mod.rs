//! Inventory renderers

pub mod markdown;

pub use markdown::to_markdown;

use crate::error::ScanResult;
use crate::inventory::Inventory;

/// How an inventory is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Pretty-printed JSON, the full inventory
    Json,
    /// Markdown summary table
    Markdown,
}

/// Render `inventory` in `format`
///
/// # Errors
/// Returns an error if JSON serialization fails
pub fn render(inventory: &Inventory, format: Format) -> ScanResult<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(inventory)? + "\n"),
        Format::Markdown => Ok(to_markdown(inventory)),
    }
}
