//! Error types for the bundle core

use ccbundle_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors from construction-time I/O; picker and diff operations never fail
#[derive(Debug, Error)]
pub enum CoreError {
    /// A file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The wizard config file is malformed
    #[error("Invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// TOML parse error without a file behind it
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Inventory scan failed
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// JSON parse or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
