//! Core types and helpers shared by every burrow crate.
//!
//! This crate holds the reporting shapes produced by the scanners
//! ([`ScanEntry`], [`PurgeCandidate`]), the result of an external command
//! ([`CommandOutcome`]), the size ranking used by every report, and the
//! scan tunables loaded from the user's configuration file.

mod config;
mod entry;
mod error;
mod format;
mod rank;

pub use config::{ScanSettings, ScanSettingsBuilder, default_config_path};
pub use entry::{CommandOutcome, PurgeCandidate, ScanEntry};
pub use error::ConfigError;
pub use format::format_size;
pub use rank::{HasSize, rank_by_size};
