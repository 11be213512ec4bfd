//! Mounted volumes and per-volume size breakdowns.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use burrow_core::{ScanSettings, format_size, rank_by_size};

use crate::estimator::SizeEstimator;
use crate::storage::StorageCategory;

/// Top-level entries smaller than this are left out of a volume breakdown.
pub const VOLUME_MIN_SIZE: u64 = 100 * 1024 * 1024;

/// Mount point fragments of helper volumes that are never listed.
const HIDDEN_MOUNT_FRAGMENTS: &[&str] = &[
    "/Update",
    "/xarts",
    "/iSCPreboot",
    "/Hardware",
    "/Preboot",
    "/VM",
];

/// Mount points of the main system volume.
const MAIN_MOUNTS: &[&str] = &["/", "/System/Volumes/Data"];

/// A mounted volume with its capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub device: String,
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub used_percent: f64,
    pub total_human: String,
    pub used_human: String,
    pub free_human: String,
    pub is_main: bool,
}

impl Volume {
    /// Describe a volume from its total and free byte counts.
    pub fn new(
        device: impl Into<String>,
        mount_point: impl Into<PathBuf>,
        total_bytes: u64,
        free_bytes: u64,
    ) -> Self {
        let mount_point = mount_point.into();
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        let used_percent = if total_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / total_bytes as f64 * 100.0
        };
        let is_main = MAIN_MOUNTS.iter().any(|m| mount_point == Path::new(m));

        Self {
            device: device.into(),
            total_human: format_size(total_bytes),
            used_human: format_size(used_bytes),
            free_human: format_size(free_bytes),
            mount_point,
            total_bytes,
            used_bytes,
            free_bytes,
            used_percent,
            is_main,
        }
    }
}

/// Whether a mount point is a user-facing volume worth listing.
pub fn is_listed_mount(mount_point: &Path) -> bool {
    let text = mount_point.to_string_lossy();
    !HIDDEN_MOUNT_FRAGMENTS.iter().any(|f| text.contains(f))
}

/// Size breakdown of one volume by top-level entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub path: PathBuf,
    pub total_size: u64,
    pub categories: Vec<StorageCategory>,
}

/// Sizes the top-level entries of a volume.
///
/// Dot-prefixed entries are skipped and entries at or below the minimum
/// size are dropped. Percentages are relative to the sum of the kept
/// entries, not to the volume capacity.
#[derive(Debug, Clone)]
pub struct VolumeAnalyzer {
    estimator: SizeEstimator,
    depth: usize,
    min_size: u64,
}

impl VolumeAnalyzer {
    /// Create an analyzer using the configured skip-list and default depth.
    pub fn new(settings: &ScanSettings) -> Self {
        Self {
            estimator: SizeEstimator::from_settings(settings),
            depth: settings.default_depth,
            min_size: VOLUME_MIN_SIZE,
        }
    }

    /// Override the minimum entry size.
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Break `path` down by top-level entry, largest first.
    ///
    /// An unreadable `path` yields an empty analysis.
    pub fn analyze(&self, path: &Path) -> VolumeAnalysis {
        let entries: Vec<PathBuf> = match fs::read_dir(path) {
            Ok(dir) => dir
                .flatten()
                .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
                .map(|entry| entry.path())
                .collect(),
            Err(err) => {
                tracing::debug!(target: "scan", "cannot list {}: {err}", path.display());
                Vec::new()
            }
        };

        let mut categories: Vec<StorageCategory> = entries
            .into_par_iter()
            .filter_map(|entry| {
                let size = self.estimator.entry_size(&entry, self.depth);
                if size <= self.min_size {
                    return None;
                }
                let name = entry.file_name()?.to_string_lossy().to_string();
                let (color, icon) = category_style(&name);
                Some(StorageCategory {
                    size_human: format_size(size),
                    percent: 0.0,
                    color: color.to_string(),
                    icon: icon.to_string(),
                    path: entry,
                    name,
                    size,
                })
            })
            .collect();

        let total_size: u64 = categories.iter().map(|c| c.size).sum();
        if total_size > 0 {
            for category in &mut categories {
                category.percent = category.size as f64 / total_size as f64 * 100.0;
            }
        }

        VolumeAnalysis {
            path: path.to_path_buf(),
            total_size,
            categories: rank_by_size(categories),
        }
    }
}

/// Color and icon for an entry, guessed from its name.
pub fn category_style(name: &str) -> (&'static str, &'static str) {
    let name = name.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    if has(&["docker"]) {
        ("#2563eb", "docker")
    } else if has(&["media", "movies", "videos"]) {
        ("#dc2626", "video")
    } else if has(&["photo", "pictures"]) {
        ("#ec4899", "camera")
    } else if has(&["music", "audio"]) {
        ("#06b6d4", "music")
    } else if has(&["code", "dev", "projects"]) {
        ("#22c55e", "code")
    } else if has(&["document"]) {
        ("#10b981", "document")
    } else if has(&["download"]) {
        ("#f59e0b", "download")
    } else if has(&["library"]) {
        ("#6366f1", "library")
    } else if has(&["application"]) {
        ("#3b82f6", "apps")
    } else if has(&["backup", "time machine"]) {
        ("#8b5cf6", "backup")
    } else {
        ("#71717a", "folder")
    }
}
