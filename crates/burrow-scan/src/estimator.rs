//! Depth-bounded directory size estimation.

use std::path::Path;
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};

use burrow_core::ScanSettings;

/// Depth bound used by most callers.
pub const DEFAULT_DEPTH: usize = 3;

/// Depth bound for callers that want more precision at higher cost.
pub const DEEP_DEPTH: usize = 5;

/// Estimates the apparent size of a directory subtree.
///
/// Directories `max_depth` levels below the root are not opened, and
/// directories named in the skip-list are never entered below the root.
/// Entries that cannot be read contribute zero, so an inaccessible tree
/// and an empty one both estimate to `0`.
#[derive(Debug, Clone)]
pub struct SizeEstimator {
    skip_dirs: Arc<[String]>,
}

impl SizeEstimator {
    /// Create an estimator with the given skip-list.
    pub fn new(skip_dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            skip_dirs: skip_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an estimator using the configured skip-list.
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(settings.skip_dirs.iter().cloned())
    }

    /// Sum the sizes of regular files under `path`.
    ///
    /// The root is always opened, even when its own name is skip-listed.
    pub fn estimate(&self, path: &Path, max_depth: usize) -> u64 {
        let skip_dirs = Arc::clone(&self.skip_dirs);

        let walker = WalkDir::new(path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .max_depth(max_depth)
            .process_read_dir(move |depth, _path, _state, children| {
                // The root itself arrives with no depth.
                if depth.is_none() {
                    return;
                }
                for child in children.iter_mut().flatten() {
                    if !child.file_type().is_dir() {
                        continue;
                    }
                    let skipped = child
                        .file_name()
                        .to_str()
                        .is_some_and(|name| skip_dirs.iter().any(|s| s == name));
                    if skipped {
                        child.read_children_path = None;
                    }
                }
            });

        walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| entry.metadata().ok())
            .map(|metadata| metadata.len())
            .sum()
    }

    /// Size of a single path: a file's own length, or the estimate of a
    /// directory at `max_depth`. Missing paths are `0`.
    pub fn entry_size(&self, path: &Path, max_depth: usize) -> u64 {
        match std::fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => self.estimate(path, max_depth),
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => 0,
        }
    }
}

impl Default for SizeEstimator {
    fn default() -> Self {
        Self::from_settings(&ScanSettings::default())
    }
}
