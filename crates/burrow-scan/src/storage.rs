//! Home folder storage breakdown and cleanup suggestions.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use burrow_core::{HasSize, ScanSettings, format_size, rank_by_size};

use crate::estimator::SizeEstimator;

const MIB: u64 = 1024 * 1024;

/// Disk totals supplied by the metrics collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// A well-known folder and its share of used disk space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageCategory {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub size_human: String,
    pub percent: f64,
    pub color: String,
    pub icon: String,
}

impl HasSize for StorageCategory {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Reclaimable space worth pointing out to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSuggestion {
    pub title: String,
    pub description: String,
    pub size: u64,
    pub size_human: String,
    pub action: String,
    pub category: String,
}

impl HasSize for CleanupSuggestion {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Ranked categories and suggestions for a home directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageBreakdown {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub total_human: String,
    pub used_human: String,
    pub free_human: String,
    pub categories: Vec<StorageCategory>,
    pub suggestions: Vec<CleanupSuggestion>,
}

struct CategoryDef {
    name: &'static str,
    path: PathBuf,
    color: &'static str,
    icon: &'static str,
}

enum Measure {
    /// Depth-bounded estimate of the whole folder.
    Estimate,
    /// Files last modified longer ago than the given age.
    OlderThan(Duration),
}

struct SuggestionProbe {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    path: PathBuf,
    threshold: u64,
    measure: Measure,
}

fn category_defs(home: &Path) -> Vec<CategoryDef> {
    let def = |name, path: PathBuf, color, icon| CategoryDef {
        name,
        path,
        color,
        icon,
    };
    vec![
        def("Applications", PathBuf::from("/Applications"), "#3b82f6", "apps"),
        def("Documents", home.join("Documents"), "#10b981", "document"),
        def("Downloads", home.join("Downloads"), "#f59e0b", "download"),
        def("Desktop", home.join("Desktop"), "#8b5cf6", "desktop"),
        def("Pictures", home.join("Pictures"), "#ec4899", "image"),
        def("Movies", home.join("Movies"), "#ef4444", "video"),
        def("Music", home.join("Music"), "#06b6d4", "music"),
        def("Code Projects", home.join("code"), "#22c55e", "code"),
        def("System Library", home.join("Library"), "#6366f1", "library"),
    ]
}

fn suggestion_probes(home: &Path) -> Vec<SuggestionProbe> {
    vec![
        SuggestionProbe {
            title: "Clear System Cache",
            description: "Temporary files that can be safely removed",
            category: "cache",
            path: home.join("Library/Caches"),
            threshold: 100 * MIB,
            measure: Measure::Estimate,
        },
        SuggestionProbe {
            title: "Clear Old Logs",
            description: "Log files from apps and system",
            category: "logs",
            path: home.join("Library/Logs"),
            threshold: 50 * MIB,
            measure: Measure::Estimate,
        },
        SuggestionProbe {
            title: "Old Downloads",
            description: "Files in Downloads older than 30 days",
            category: "downloads",
            path: home.join("Downloads"),
            threshold: 100 * MIB,
            measure: Measure::OlderThan(Duration::from_secs(30 * 24 * 60 * 60)),
        },
        SuggestionProbe {
            title: "Empty Trash",
            description: "Files waiting to be permanently deleted",
            category: "trash",
            path: home.join(".Trash"),
            threshold: 10 * MIB,
            measure: Measure::Estimate,
        },
        SuggestionProbe {
            title: "Xcode Build Files",
            description: "Developer build cache (safe to delete)",
            category: "xcode",
            path: home.join("Library/Developer/Xcode/DerivedData"),
            threshold: 500 * MIB,
            measure: Measure::Estimate,
        },
    ]
}

/// Total size of regular files under `path` not modified within `age`.
fn old_files_size(path: &Path, age: Duration) -> u64 {
    let cutoff = SystemTime::now().checked_sub(age).unwrap_or(SystemTime::UNIX_EPOCH);

    WalkDir::new(path)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|metadata| metadata.modified().map(|t| t < cutoff).unwrap_or(false))
        .map(|metadata| metadata.len())
        .sum()
}

fn percent_of(size: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        size as f64 / whole as f64 * 100.0
    }
}

/// Size the well-known folders under `home` and collect cleanup suggestions.
///
/// Categories and suggestions are computed in parallel; empty categories
/// and suggestions under their threshold are dropped. Both lists are
/// ranked largest first.
pub fn storage_breakdown(home: &Path, disk: DiskUsage, settings: &ScanSettings) -> StorageBreakdown {
    let estimator = SizeEstimator::from_settings(settings);
    let depth = settings.default_depth;

    let (categories, suggestions) = rayon::join(
        || {
            category_defs(home)
                .into_par_iter()
                .filter_map(|category| {
                    let size = estimator.estimate(&category.path, depth);
                    (size > 0).then(|| StorageCategory {
                        name: category.name.to_string(),
                        path: category.path,
                        size,
                        size_human: format_size(size),
                        percent: percent_of(size, disk.used),
                        color: category.color.to_string(),
                        icon: category.icon.to_string(),
                    })
                })
                .collect::<Vec<_>>()
        },
        || {
            suggestion_probes(home)
                .into_par_iter()
                .filter_map(|probe| {
                    let size = match probe.measure {
                        Measure::Estimate => estimator.estimate(&probe.path, depth),
                        Measure::OlderThan(age) => old_files_size(&probe.path, age),
                    };
                    (size > probe.threshold).then(|| CleanupSuggestion {
                        title: probe.title.to_string(),
                        description: probe.description.to_string(),
                        size,
                        size_human: format_size(size),
                        action: "clean".to_string(),
                        category: probe.category.to_string(),
                    })
                })
                .collect::<Vec<_>>()
        },
    );

    StorageBreakdown {
        total: disk.total,
        used: disk.used,
        free: disk.free,
        total_human: format_size(disk.total),
        used_human: format_size(disk.used),
        free_human: format_size(disk.free),
        categories: rank_by_size(categories),
        suggestions: rank_by_size(suggestions),
    }
}

/// Locations smaller than this are left out of the "other" breakdown.
pub const OTHER_MIN_SIZE: u64 = 10 * MIB;

/// Remainders smaller than this are not reported as unaccounted space.
pub const UNACCOUNTED_MIN_SIZE: u64 = 100 * MIB;

/// Name of the remainder row of the "other" breakdown.
pub const UNACCOUNTED_NAME: &str = "Unaccounted (System/Protected)";

/// A system or developer location contributing to uncategorized usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherCategory {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub size_human: String,
    pub percent: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: String,
}

impl HasSize for OtherCategory {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Where the used space outside the home categories goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherBreakdown {
    pub total_other: u64,
    pub total_other_human: String,
    pub categories: Vec<OtherCategory>,
}

/// A location measured by the "other" breakdown.
#[derive(Debug, Clone)]
pub struct OtherLocation {
    pub path: PathBuf,
    pub name: &'static str,
    pub kind: &'static str,
    pub icon: &'static str,
}

/// System directories and hidden developer folders under `home`.
pub fn other_locations(home: &Path) -> Vec<OtherLocation> {
    let system = |path: &str, name, icon| OtherLocation {
        path: PathBuf::from(path),
        name,
        kind: "system",
        icon,
    };
    let user = |dir: &str, name, kind, icon| OtherLocation {
        path: home.join(dir),
        name,
        kind,
        icon,
    };

    vec![
        system("/private/var", "System Data (var)", "settings"),
        system("/System", "macOS System", "apple"),
        system("/usr", "Unix Programs", "terminal"),
        system("/opt", "Optional Software", "package"),
        user(".local", "Local Data", "user", "folder"),
        user(".cache", "User Cache", "cache", "trash"),
        user(".docker", "Docker Config", "developer", "docker"),
        user(".npm", "NPM Cache", "developer", "package"),
        user(".cargo", "Rust/Cargo", "developer", "code"),
        user(".rustup", "Rustup", "developer", "code"),
        user(".gradle", "Gradle Cache", "developer", "code"),
        user(".m2", "Maven Cache", "developer", "code"),
        user(".vscode", "VS Code", "developer", "code"),
        user(".cursor", "Cursor IDE", "developer", "code"),
        user(".orbstack", "OrbStack", "developer", "docker"),
        user(".lima", "Lima VMs", "developer", "docker"),
        user(".vagrant.d", "Vagrant", "developer", "docker"),
        OtherLocation {
            path: PathBuf::from("/Volumes"),
            name: "External Volumes",
            kind: "volumes",
            icon: "harddrive",
        },
    ]
}

/// Break down the used space not covered by the home categories.
///
/// The "other" total is used disk space minus the size of every home
/// category. Locations already counted as a category are not measured
/// again.
pub fn other_breakdown(home: &Path, disk: DiskUsage, settings: &ScanSettings) -> OtherBreakdown {
    let estimator = SizeEstimator::from_settings(settings);
    let depth = settings.default_depth;

    let categories = category_defs(home);
    let categorized: u64 = categories
        .par_iter()
        .map(|category| estimator.estimate(&category.path, depth))
        .sum();

    let locations = other_locations(home)
        .into_iter()
        .filter(|location| !categories.iter().any(|c| c.path == location.path))
        .collect();

    measure_other(locations, disk.used.saturating_sub(categorized), settings)
}

/// Size `locations` in parallel against an "other" total of `total_other`.
///
/// Locations at or below [`OTHER_MIN_SIZE`] are dropped and the rest are
/// ranked. A remainder above [`UNACCOUNTED_MIN_SIZE`] is appended last.
pub fn measure_other(
    locations: Vec<OtherLocation>,
    total_other: u64,
    settings: &ScanSettings,
) -> OtherBreakdown {
    let estimator = SizeEstimator::from_settings(settings);
    let depth = settings.default_depth;

    let measured: Vec<OtherCategory> = locations
        .into_par_iter()
        .filter_map(|location| {
            let size = estimator.estimate(&location.path, depth);
            (size > OTHER_MIN_SIZE).then(|| OtherCategory {
                path: location.path,
                name: location.name.to_string(),
                size,
                size_human: format_size(size),
                percent: percent_of(size, total_other),
                kind: location.kind.to_string(),
                icon: location.icon.to_string(),
            })
        })
        .collect();

    let mut categories = rank_by_size(measured);
    let accounted: u64 = categories.iter().map(|c| c.size).sum();
    let unaccounted = total_other.saturating_sub(accounted);
    if unaccounted > UNACCOUNTED_MIN_SIZE {
        categories.push(OtherCategory {
            path: PathBuf::new(),
            name: UNACCOUNTED_NAME.to_string(),
            size: unaccounted,
            size_human: format_size(unaccounted),
            percent: percent_of(unaccounted, total_other),
            kind: "system".to_string(),
            icon: "lock".to_string(),
        });
    }

    OtherBreakdown {
        total_other,
        total_other_human: format_size(total_other),
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_percent_of_zero_used() {
        assert_eq!(percent_of(10, 0), 0.0);
        assert_eq!(percent_of(50, 200), 25.0);
    }

    #[test]
    fn test_breakdown_ranks_home_categories() {
        let temp = TempDir::new().unwrap();
        let home = temp.path();
        fs::create_dir_all(home.join("Documents")).unwrap();
        fs::create_dir_all(home.join("Music")).unwrap();
        fs::create_dir_all(home.join("Movies")).unwrap();
        fs::write(home.join("Documents/a.txt"), vec![0u8; 100]).unwrap();
        fs::write(home.join("Music/b.mp3"), vec![0u8; 300]).unwrap();

        let disk = DiskUsage {
            total: 2000,
            used: 1000,
            free: 1000,
        };
        let report = storage_breakdown(home, disk, &ScanSettings::default());

        let names: Vec<_> = report
            .categories
            .iter()
            .filter(|c| c.path.starts_with(home))
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["Music", "Documents"]);

        let music = &report.categories.iter().find(|c| c.name == "Music").unwrap();
        assert_eq!(music.percent, 30.0);
        assert!(report.suggestions.is_empty());
    }

    fn location(path: PathBuf, name: &'static str) -> OtherLocation {
        OtherLocation {
            path,
            name,
            kind: "developer",
            icon: "code",
        }
    }

    #[test]
    fn test_other_ranks_locations_and_adds_remainder() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for (dir, len) in [("cargo", 20 * MIB), ("npm", 40 * MIB), ("tiny", 5 * MIB)] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::File::create(root.join(dir).join("blob")).unwrap().set_len(len).unwrap();
        }
        let locations = vec![
            location(root.join("cargo"), "Rust/Cargo"),
            location(root.join("npm"), "NPM Cache"),
            location(root.join("tiny"), "Tiny"),
            location(root.join("missing"), "Missing"),
        ];

        let report = measure_other(locations, 200 * MIB, &ScanSettings::default());

        assert_eq!(report.total_other, 200 * MIB);
        let rows: Vec<_> = report
            .categories
            .iter()
            .map(|c| (c.name.as_str(), c.size))
            .collect();
        assert_eq!(
            rows,
            [
                ("NPM Cache", 40 * MIB),
                ("Rust/Cargo", 20 * MIB),
                (UNACCOUNTED_NAME, 140 * MIB),
            ]
        );
        assert_eq!(report.categories[0].percent, 20.0);
        assert_eq!(report.categories[2].kind, "system");
    }

    #[test]
    fn test_other_small_remainder_is_not_reported() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("cache");
        fs::create_dir_all(&dir).unwrap();
        fs::File::create(dir.join("blob")).unwrap().set_len(20 * MIB).unwrap();

        let report = measure_other(vec![location(dir, "User Cache")], 50 * MIB, &ScanSettings::default());
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].name, "User Cache");
    }

    #[test]
    fn test_other_total_excludes_home_categories() {
        let temp = TempDir::new().unwrap();
        let home = temp.path();
        fs::create_dir_all(home.join("Documents")).unwrap();
        fs::File::create(home.join("Documents/a.pdf")).unwrap().set_len(MIB).unwrap();

        let disk = DiskUsage {
            total: 10 * MIB,
            used: 4 * MIB,
            free: 6 * MIB,
        };
        let report = other_breakdown(home, disk, &ScanSettings::default());
        assert!(report.total_other <= 3 * MIB);
    }

    #[test]
    fn test_old_files_size_respects_age() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("fresh"), vec![0u8; 10]).unwrap();

        assert_eq!(old_files_size(temp.path(), Duration::from_secs(3600)), 0);
        assert_eq!(old_files_size(temp.path(), Duration::ZERO), 10);
    }
}
