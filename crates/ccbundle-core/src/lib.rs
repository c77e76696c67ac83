//! ccbundle Core - selection and profile diff engine
//!
//! This crate provides the pickers a bundle wizard is driven through, the
//! per-profile section diffs kept against one shared base selection, and
//! the coordinator that merges background discovery into live pickers.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc
)]

pub mod bundle;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod discovery;
pub mod error;
pub mod item;
pub mod picker;
pub mod secrets;
pub mod section;
pub mod session;
pub mod value;

pub use ccbundle_scanner;

pub use bundle::{BundleOptions, ExistingConfig};
pub use config::WizardConfig;
pub use diff::{compute_diff, effective_keys, ProfileDefinition, ProfileDiffStore, SectionDiff};
pub use discovery::{DiscoveryCoordinator, ScanKind};
pub use error::{CoreError, CoreResult};
pub use item::Item;
pub use picker::Picker;
pub use secrets::{EnvRefRedactor, SecretRedactor};
pub use section::Section;
pub use session::{Tab, WizardSession};
pub use value::SettingValue;
