//! Build artifact and dependency directory discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;

use burrow_core::{PurgeCandidate, ScanSettings, rank_by_size};

use crate::estimator::SizeEstimator;

/// Finds directories whose names mark them as disposable.
///
/// A matched directory is a leaf: the walk never descends into it, so
/// matches nested inside another match are not reported.
#[derive(Debug, Clone)]
pub struct PurgeScanner {
    estimator: SizeEstimator,
    targets: Arc<[String]>,
    depth: usize,
}

impl PurgeScanner {
    /// Create a scanner using the configured purge targets.
    pub fn new(settings: &ScanSettings) -> Self {
        Self::with_targets(settings, settings.purge_targets.iter().cloned())
    }

    /// Create a scanner matching a custom set of directory names.
    pub fn with_targets(
        settings: &ScanSettings,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            estimator: SizeEstimator::from_settings(settings),
            targets: targets.into_iter().map(Into::into).collect(),
            depth: settings.default_depth,
        }
    }

    fn matched_target(&self, name: &str) -> Option<&str> {
        self.targets.iter().find(|t| *t == name).map(String::as_str)
    }

    /// Scan `root` and return every matched directory, largest first.
    pub fn scan(&self, root: &Path) -> Vec<PurgeCandidate> {
        let matches = self.collect_matches(root);

        let candidates: Vec<PurgeCandidate> = matches
            .into_par_iter()
            .map(|(path, pattern)| {
                let size = self.estimator.estimate(&path, self.depth);
                PurgeCandidate::new(path, size, pattern)
            })
            .collect();

        rank_by_size(candidates)
    }

    fn collect_matches(&self, root: &Path) -> Vec<(PathBuf, String)> {
        let root_name = root.file_name().map(|n| n.to_string_lossy().to_string());
        if let Some(pattern) = root_name.as_deref().and_then(|n| self.matched_target(n)) {
            if root.is_dir() {
                return vec![(root.to_path_buf(), pattern.to_string())];
            }
        }

        let targets = Arc::clone(&self.targets);
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .process_read_dir(move |depth, _path, _state, children| {
                if depth.is_none() {
                    return;
                }
                for child in children.iter_mut().flatten() {
                    if !child.file_type().is_dir() {
                        continue;
                    }
                    let matched = child
                        .file_name()
                        .to_str()
                        .is_some_and(|name| targets.iter().any(|t| t == name));
                    if matched {
                        child.read_children_path = None;
                    }
                }
            });

        walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.depth > 0 && entry.file_type().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy();
                self.matched_target(&name)
                    .map(|pattern| (entry.path(), pattern.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_root_itself_matching() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("node_modules");
        fs::create_dir_all(root.join("dep")).unwrap();
        fs::write(root.join("dep/index.js"), [0u8; 64]).unwrap();

        let scanner = PurgeScanner::new(&ScanSettings::default());
        let found = scanner.scan(&root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size, 64);
    }

    #[test]
    fn test_custom_targets() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("proj/.tox")).unwrap();
        fs::create_dir_all(temp.path().join("proj/target")).unwrap();

        let scanner = PurgeScanner::with_targets(&ScanSettings::default(), [".tox"]);
        let found = scanner.scan(temp.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].matched_pattern.as_str(), ".tox");
    }
}
