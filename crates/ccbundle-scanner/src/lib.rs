//! ccbundle Scanner - Claude Code inventory and discovery
//!
//! This crate provides the read-only inventory snapshot a bundle session is
//! built from, plus the slower discovery crawls that find configuration
//! living in project directories and installed plugins.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]

pub mod artifacts;
pub mod discover;
pub mod error;
pub mod inventory;
pub mod output;
pub mod parser;
pub mod plugins;
pub mod scan;
pub mod settings;
pub mod types;

pub use discover::{CrawlOptions, DiscoveredItem, DiscoveredValue, Provenance};
pub use error::{ScanError, ScanResult};
pub use inventory::{Inventory, PluginEntry, ScopedMcpServer};
pub use scan::Scanner;
