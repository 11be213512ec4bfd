//! Scan configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for the scanners.
///
/// Every field has a default, so a partial `config.toml` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanSettings {
    /// Depth bound used by most size estimates.
    #[builder(default = "default_depth()")]
    #[serde(default = "default_depth")]
    pub default_depth: usize,

    /// Depth bound used where more precision is worth the cost.
    #[builder(default = "default_deep_depth()")]
    #[serde(default = "default_deep_depth")]
    pub deep_depth: usize,

    /// Minimum size for the large-item report.
    #[builder(default = "default_large_min_size()")]
    #[serde(default = "default_large_min_size")]
    pub large_min_size: u64,

    /// Maximum number of items the large-item report returns.
    #[builder(default = "default_large_item_cap()")]
    #[serde(default = "default_large_item_cap")]
    pub large_item_cap: usize,

    /// Directory names never entered when estimating sizes.
    #[builder(default = "default_skip_dirs()")]
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,

    /// Directory names reported as one item by the large-item report.
    #[builder(default = "default_compact_folders()")]
    #[serde(default = "default_compact_folders")]
    pub compact_folders: Vec<String>,

    /// Directory names reported by the purge scan.
    #[builder(default = "default_purge_targets()")]
    #[serde(default = "default_purge_targets")]
    pub purge_targets: Vec<String>,
}

fn default_depth() -> usize {
    3
}

fn default_deep_depth() -> usize {
    5
}

fn default_large_min_size() -> u64 {
    100 * 1024 * 1024
}

fn default_large_item_cap() -> usize {
    200
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_skip_dirs() -> Vec<String> {
    to_strings(&["node_modules", ".git", "Library", "Caches"])
}

fn default_compact_folders() -> Vec<String> {
    to_strings(&[
        "node_modules",
        ".git",
        "vendor",
        "Pods",
        "DerivedData",
        "Build",
        "build",
        "dist",
        "target",
        "__pycache__",
        ".venv",
        "venv",
        "env",
        ".cache",
        "cache",
        "Cache",
        "Caches",
        ".npm",
        ".yarn",
        ".pnpm-store",
        "go",
        ".cargo",
        ".rustup",
        ".gradle",
        ".m2",
        ".cocoapods",
    ])
}

fn default_purge_targets() -> Vec<String> {
    to_strings(&[
        "node_modules",
        "target",
        "build",
        "dist",
        ".next",
        "__pycache__",
        "venv",
        ".venv",
    ])
}

impl ScanSettingsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.large_item_cap == Some(0) {
            return Err("large_item_cap must be at least 1".to_string());
        }
        let default = self.default_depth.unwrap_or_else(default_depth);
        let deep = self.deep_depth.unwrap_or_else(default_deep_depth);
        if deep < default {
            return Err("deep_depth cannot be smaller than default_depth".to_string());
        }
        Ok(())
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            deep_depth: default_deep_depth(),
            large_min_size: default_large_min_size(),
            large_item_cap: default_large_item_cap(),
            skip_dirs: default_skip_dirs(),
            compact_folders: default_compact_folders(),
            purge_targets: default_purge_targets(),
        }
    }
}

impl ScanSettings {
    /// Create a new settings builder.
    pub fn builder() -> ScanSettingsBuilder {
        ScanSettingsBuilder::default()
    }

    /// Load settings from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(ConfigError::io(path, err)),
        };

        let settings: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from [`default_config_path`], falling back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.large_item_cap == 0 {
            return Err(ConfigError::Invalid {
                message: "large_item_cap must be at least 1".to_string(),
            });
        }
        if self.deep_depth < self.default_depth {
            return Err(ConfigError::Invalid {
                message: "deep_depth cannot be smaller than default_depth".to_string(),
            });
        }
        Ok(())
    }

    /// Check if a directory name is in the estimator skip-list.
    pub fn is_skipped(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|s| s == name)
    }

    /// Check if a directory name is a compact folder.
    pub fn is_compact_folder(&self, name: &str) -> bool {
        self.compact_folders.iter().any(|s| s == name)
    }
}

/// Location of the user configuration file (`<config_dir>/burrow/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("burrow").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_builder() {
        let settings = ScanSettings::builder()
            .default_depth(2usize)
            .large_item_cap(10usize)
            .build()
            .unwrap();

        assert_eq!(settings.default_depth, 2);
        assert_eq!(settings.deep_depth, 5);
        assert_eq!(settings.large_item_cap, 10);
        assert!(settings.is_skipped("node_modules"));
    }

    #[test]
    fn test_builder_rejects_zero_cap() {
        let result = ScanSettings::builder().large_item_cap(0usize).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_checks_depths_against_defaults() {
        assert!(ScanSettings::builder().deep_depth(2usize).build().is_err());
        assert!(ScanSettings::builder().default_depth(6usize).build().is_err());
        assert!(ScanSettings::builder().deep_depth(3usize).build().is_ok());
    }

    #[test]
    fn test_compact_folder_lookup() {
        let settings = ScanSettings::default();
        assert!(settings.is_compact_folder("DerivedData"));
        assert!(settings.is_compact_folder(".git"));
        assert!(!settings.is_compact_folder("Documents"));
    }
}
