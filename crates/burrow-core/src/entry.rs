//! Reporting shapes returned by scans and commands.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::format::format_size;

/// A file or directory together with its estimated size.
///
/// Built fresh for every request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// File name (last path component).
    pub name: CompactString,
    /// Apparent size in bytes (aggregate for directories).
    pub size: u64,
    /// `size` formatted for display.
    pub size_human: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

impl ScanEntry {
    /// Create an entry, deriving the display size.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<CompactString>, size: u64, is_dir: bool) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size,
            size_human: format_size(size),
            is_dir,
        }
    }

    /// Create an entry named after the last component of `path`.
    pub fn from_path(path: impl Into<PathBuf>, size: u64, is_dir: bool) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self::new(path, name, size, is_dir)
    }
}

/// A disposable build or dependency directory found by the purge scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeCandidate {
    /// Path of the matched directory.
    pub path: PathBuf,
    /// Estimated size in bytes.
    pub size: u64,
    /// `size` formatted for display.
    pub size_human: String,
    /// The target name that matched.
    #[serde(rename = "type")]
    pub matched_pattern: CompactString,
}

impl PurgeCandidate {
    /// Create a candidate, deriving the display size.
    pub fn new(path: impl Into<PathBuf>, size: u64, matched_pattern: impl Into<CompactString>) -> Self {
        Self {
            path: path.into(),
            size,
            size_human: format_size(size),
            matched_pattern: matched_pattern.into(),
        }
    }
}

/// Result of running an external command or a cleanup action.
///
/// Failures are reported here rather than as transport errors so the
/// combined output always reaches the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    /// Whether the action succeeded (exit status only, for commands).
    pub success: bool,
    /// Fixed success text or the error text.
    pub message: String,
    /// Bytes freed by the action, when known.
    #[serde(rename = "cleaned_bytes", default)]
    pub cleaned_bytes: u64,
    /// Combined stdout/stderr with terminal control sequences removed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

impl CommandOutcome {
    /// A successful outcome with the given message.
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Default::default()
        }
    }

    /// A failed outcome with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Attach combined output.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Attach the number of bytes freed.
    pub fn with_cleaned_bytes(mut self, bytes: u64) -> Self {
        self.cleaned_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_entry_from_path() {
        let entry = ScanEntry::from_path("/home/user/big.bin", 2048, false);
        assert_eq!(entry.name.as_str(), "big.bin");
        assert_eq!(entry.size_human, format_size(2048));
        assert!(!entry.is_dir);
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = CommandOutcome::succeeded("done")
            .with_output("line\n")
            .with_cleaned_bytes(10);
        assert!(outcome.success);
        assert_eq!(outcome.cleaned_bytes, 10);

        let failed = CommandOutcome::failed("boom");
        assert!(!failed.success);
        assert!(failed.output.is_empty());
    }
}
