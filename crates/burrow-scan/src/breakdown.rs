//! One-level size breakdown of a directory.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use burrow_core::{ScanEntry, ScanSettings, rank_by_size};

use crate::estimator::SizeEstimator;

/// Sizes every immediate child of a directory.
///
/// Dot-prefixed children are skipped. Directory children are estimated
/// in parallel; files contribute their own size without traversal.
#[derive(Debug, Clone)]
pub struct TopLevelBreakdown {
    estimator: SizeEstimator,
    max_depth: usize,
}

impl TopLevelBreakdown {
    /// Create a breakdown using the configured skip-list and default depth.
    pub fn new(settings: &ScanSettings) -> Self {
        Self {
            estimator: SizeEstimator::from_settings(settings),
            max_depth: settings.default_depth,
        }
    }

    /// Override the depth bound used for child directories.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// List and rank the children of `root`, largest first.
    ///
    /// An unreadable `root` yields an empty list.
    pub fn scan(&self, root: &Path) -> Vec<ScanEntry> {
        let children = match list_children(root) {
            Ok(children) => children,
            Err(err) => {
                tracing::debug!(target: "scan", "cannot list {}: {err}", root.display());
                return Vec::new();
            }
        };

        let entries: Vec<ScanEntry> = children
            .into_par_iter()
            .map(|child| {
                let size = if child.is_dir {
                    self.estimator.estimate(&child.path, self.max_depth)
                } else {
                    fs::symlink_metadata(&child.path).map(|m| m.len()).unwrap_or(0)
                };
                ScanEntry::new(child.path, child.name, size, child.is_dir)
            })
            .collect();

        rank_by_size(entries)
    }
}

struct Child {
    path: PathBuf,
    name: String,
    is_dir: bool,
}

fn list_children(root: &Path) -> std::io::Result<Vec<Child>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        children.push(Child {
            path: entry.path(),
            name,
            is_dir,
        });
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unreadable_root_is_empty() {
        let temp = TempDir::new().unwrap();
        let breakdown = TopLevelBreakdown::new(&ScanSettings::default());
        assert!(breakdown.scan(&temp.path().join("missing")).is_empty());
    }

    #[test]
    fn test_file_children_use_stat_size() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("one"), [0u8; 5]).unwrap();

        let breakdown = TopLevelBreakdown::new(&ScanSettings::default());
        let entries = breakdown.scan(temp.path());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 5);
        assert!(!entries[0].is_dir);
    }
}
