//! Directory size estimation and scan modes for burrow.
//!
//! Every scan here is read-only and infallible by contract: paths that
//! cannot be opened or stat-ed contribute zero bytes instead of an error,
//! so a report is always produced, possibly undercounted.
//!
//! # Overview
//!
//! - [`SizeEstimator`] sums regular-file sizes under a depth bound while
//!   never entering a skip-list of expensive directories.
//! - [`TopLevelBreakdown`] sizes the immediate children of a directory.
//! - [`LargeItemFinder`] walks a tree looking for big files and
//!   "compact" folders (dependency caches, build output) with an item cap.
//! - [`PurgeScanner`] finds disposable build/dependency directories.
//! - [`storage_breakdown`] sizes well-known home folders and suggests
//!   cleanups; [`other_breakdown`] explains the used space outside them.
//! - [`VolumeAnalyzer`] breaks a mounted volume down by top-level entry.
//!
//! # Example
//!
//! ```rust,no_run
//! use burrow_core::ScanSettings;
//! use burrow_scan::LargeItemFinder;
//!
//! let settings = ScanSettings::default();
//! let finder = LargeItemFinder::new(&settings).with_min_size(1024 * 1024);
//! for item in finder.scan("/home/user".as_ref()) {
//!     println!("{} {}", item.size_human, item.path.display());
//! }
//! ```

mod breakdown;
mod estimator;
mod large;
mod purge;
mod storage;
mod volumes;

pub use breakdown::TopLevelBreakdown;
pub use estimator::{DEEP_DEPTH, DEFAULT_DEPTH, SizeEstimator};
pub use large::{LargeItemFinder, TRASH_DIR_NAME};
pub use purge::PurgeScanner;
pub use storage::{
    CleanupSuggestion, DiskUsage, OTHER_MIN_SIZE, OtherBreakdown, OtherCategory, OtherLocation,
    StorageBreakdown, StorageCategory, UNACCOUNTED_MIN_SIZE, UNACCOUNTED_NAME, measure_other,
    other_breakdown, other_locations, storage_breakdown,
};
pub use volumes::{
    VOLUME_MIN_SIZE, Volume, VolumeAnalysis, VolumeAnalyzer, category_style, is_listed_mount,
};

// Re-export core types for convenience
pub use burrow_core::{HasSize, PurgeCandidate, ScanEntry, ScanSettings, rank_by_size};
