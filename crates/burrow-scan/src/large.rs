//! Large file and compact folder discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;

use burrow_core::{ScanEntry, ScanSettings, rank_by_size};

use crate::estimator::SizeEstimator;

/// Hidden directory that is still scanned for large discardable content.
pub const TRASH_DIR_NAME: &str = ".Trash";

/// Directory skipped entirely to keep system files out of the report.
const SYSTEM_DIR_NAME: &str = "Library";

/// Finds large files and compact folders under a root.
///
/// A single walk visits the tree:
///
/// - direct child directories of the root are sized in parallel after the
///   walk (a compact top-level folder is not descended, others are);
/// - compact folders deeper down (dependency caches, build output, VCS
///   metadata) are sized immediately and never descended;
/// - plain files qualify when they reach the minimum size.
///
/// The walk stops as soon as `item_cap` items have been collected, so a
/// capped result is a prefix of the traversal rather than the globally
/// largest items.
#[derive(Debug, Clone)]
pub struct LargeItemFinder {
    estimator: SizeEstimator,
    compact_folders: Arc<[String]>,
    min_size: u64,
    item_cap: usize,
    depth: usize,
}

impl LargeItemFinder {
    /// Create a finder from the configured settings.
    pub fn new(settings: &ScanSettings) -> Self {
        Self {
            estimator: SizeEstimator::from_settings(settings),
            compact_folders: settings.compact_folders.iter().cloned().collect(),
            min_size: settings.large_min_size,
            item_cap: settings.large_item_cap.max(1),
            depth: settings.deep_depth,
        }
    }

    /// Override the minimum qualifying size.
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Override the item cap.
    pub fn with_item_cap(mut self, item_cap: usize) -> Self {
        self.item_cap = item_cap.max(1);
        self
    }

    fn is_compact(&self, name: &str) -> bool {
        self.compact_folders.iter().any(|c| c == name)
    }

    /// Scan `root` and return qualifying items, largest first.
    pub fn scan(&self, root: &Path) -> Vec<ScanEntry> {
        let compact = Arc::clone(&self.compact_folders);

        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |depth, _path, _state, children| {
                if depth.is_none() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(child) => {
                        let name = child.file_name().to_string_lossy();
                        if name.starts_with('.') && name != TRASH_DIR_NAME {
                            return false;
                        }
                        !(child.file_type().is_dir() && name == SYSTEM_DIR_NAME)
                    }
                    Err(_) => false,
                });

                for child in children.iter_mut().flatten() {
                    if !child.file_type().is_dir() {
                        continue;
                    }
                    let is_compact = child
                        .file_name()
                        .to_str()
                        .is_some_and(|name| compact.iter().any(|c| c == name));
                    if is_compact {
                        child.read_children_path = None;
                    }
                }
            });

        let mut items = Vec::new();
        let mut top_level: Vec<PathBuf> = Vec::new();

        for entry in walker.into_iter().filter_map(Result::ok) {
            if entry.depth == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                let path = entry.path();
                if entry.depth == 1 {
                    top_level.push(path);
                } else if self.is_compact(&entry.file_name().to_string_lossy()) {
                    let size = self.estimator.estimate(&path, self.depth);
                    if size >= self.min_size {
                        items.push(ScanEntry::from_path(path, size, true));
                    }
                }
            } else if file_type.is_file() {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                if size >= self.min_size {
                    items.push(ScanEntry::from_path(entry.path(), size, false));
                }
            }

            if items.len() >= self.item_cap {
                tracing::debug!(target: "scan", "item cap {} reached under {}", self.item_cap, root.display());
                break;
            }
        }

        let folders: Vec<ScanEntry> = top_level
            .into_par_iter()
            .filter_map(|path| {
                let size = self.estimator.estimate(&path, self.depth);
                (size >= self.min_size).then(|| ScanEntry::from_path(path, size, true))
            })
            .collect();
        items.extend(folders);

        let mut ranked = rank_by_size(items);
        ranked.truncate(self.item_cap);
        ranked
    }
}
