//! Cleanup actions backed by the maintenance CLI and the filesystem.

use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use burrow_core::{CommandOutcome, ScanSettings, format_size};
use burrow_scan::SizeEstimator;

use crate::ExecError;
use crate::hub::BroadcastHub;
use crate::locator::ToolLocator;
use crate::runner::{BroadcastStyle, CommandRunner, RunOptions};

/// Path prefixes that are never removed.
pub const PROTECTED_PREFIXES: &[&str] = &[
    "/System", "/Library", "/usr", "/bin", "/sbin", "/private", "/var", "/etc",
];

/// Check whether `path` must never be removed.
///
/// Refused are the filesystem root, paths under a protected prefix, and
/// paths with `..` components. Relative paths are resolved against the
/// current directory, and symlinked parent directories are resolved
/// before the prefix check. A path that cannot be made absolute is
/// refused.
pub fn is_protected_path(path: &Path) -> bool {
    let Ok(absolute) = std::path::absolute(path) else {
        return true;
    };
    if is_refused(&absolute) {
        return true;
    }

    // The entry itself is removed rather than followed.
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .is_ok_and(|real| is_refused(&real.join(name))),
        _ => true,
    }
}

fn is_refused(path: &Path) -> bool {
    path.parent().is_none()
        || path.components().any(|c| c == Component::ParentDir)
        || PROTECTED_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
}

/// Result of a delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub success: bool,
    pub deleted_count: usize,
    pub deleted_size: u64,
    pub size_human: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Update targets understood by [`Maintenance::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTarget {
    /// The maintenance CLI itself.
    Mole,
    /// Homebrew packages.
    Homebrew,
}

impl UpdateTarget {
    /// Parse the target name sent by the dashboard.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Mole" => Some(Self::Mole),
            "Homebrew" => Some(Self::Homebrew),
            _ => None,
        }
    }
}

/// Cleanup actions: maintenance CLI invocations and direct removals.
#[derive(Debug, Clone)]
pub struct Maintenance {
    runner: CommandRunner,
    locator: ToolLocator,
    estimator: SizeEstimator,
    depth: usize,
}

impl Maintenance {
    /// Create the action set.
    pub fn new(runner: CommandRunner, locator: ToolLocator, settings: &ScanSettings) -> Self {
        Self {
            runner,
            locator,
            estimator: SizeEstimator::from_settings(settings),
            depth: settings.default_depth,
        }
    }

    fn hub(&self) -> &BroadcastHub {
        self.runner.hub()
    }

    /// Run the CLI from its own directory with raw line broadcasting.
    async fn run_tool(&self, args: &[&str]) -> CommandOutcome {
        let Some(tool) = self.locator.locate() else {
            return CommandOutcome::failed(ExecError::ToolNotFound.to_string());
        };

        let mut options = RunOptions::new();
        if let Some(dir) = tool.parent() {
            options = options.current_dir(dir);
        }
        self.runner.run(&tool, args, &options).await
    }

    /// Report what a full clean would remove, without removing anything.
    pub async fn clean_preview(&self) -> CommandOutcome {
        self.run_tool(&["clean", "--dry-run"]).await
    }

    /// Clean one category, or everything when `category` is empty or `all`.
    pub async fn clean(&self, category: Option<&str>) -> CommandOutcome {
        let flag = category
            .filter(|c| !c.is_empty() && *c != "all")
            .map(|c| format!("--{c}"));

        let mut args = vec!["clean"];
        if let Some(flag) = &flag {
            args.push(flag);
        }
        args.push("--yes");

        self.run_tool(&args).await
    }

    /// Update the named target.
    pub async fn update(&self, name: &str) -> CommandOutcome {
        self.hub().log(format!("Performing update: {name}"));

        match UpdateTarget::from_name(name) {
            Some(UpdateTarget::Mole) => self.run_tool(&["update", "--debug"]).await,
            Some(UpdateTarget::Homebrew) => {
                let Ok(brew) = which::which("brew") else {
                    return CommandOutcome::failed("Homebrew not found");
                };
                self.hub().log("Executing: brew upgrade");
                let outcome = self.runner.run(&brew, ["upgrade"], &RunOptions::new()).await;
                if outcome.success {
                    CommandOutcome::succeeded("Homebrew upgraded successfully")
                        .with_output(outcome.output)
                } else {
                    outcome
                }
            }
            None => CommandOutcome::failed(format!("Unknown update target: {name}")),
        }
    }

    /// Uninstall each app bundle in turn through the CLI.
    ///
    /// The run is unsuccessful only when every app failed; partial failures
    /// are listed in the message.
    pub async fn uninstall(&self, apps: &[PathBuf]) -> CommandOutcome {
        if apps.is_empty() {
            return CommandOutcome::failed("No apps specified");
        }
        let Some(tool) = self.locator.locate() else {
            return CommandOutcome::failed(
                "Mole CLI not found. Please ensure Mole is installed correctly.",
            );
        };

        let options = RunOptions::new()
            .env("MOLE_NO_CONFIRM", "1")
            .env("MOLE_GUI_MODE", "1")
            .style(BroadcastStyle::Stripped);

        let mut removed = Vec::new();
        let mut failed = Vec::new();

        for app in apps {
            let name = display_name(app);
            self.hub().log(format!("Attempting to uninstall: {}", app.display()));

            if !app.exists() {
                self.hub().log(format!("ERROR: Path does not exist: {}", app.display()));
                failed.push(format!("{name} (not found)"));
                continue;
            }

            self.hub().log(format!(
                "Executing: {} uninstall --path {} --debug",
                tool.display(),
                app.display()
            ));
            let args = [
                OsStr::new("uninstall"),
                OsStr::new("--path"),
                app.as_os_str(),
                OsStr::new("--debug"),
            ];
            let outcome = self.runner.run(&tool, args, &options).await;

            if outcome.success {
                self.hub().log(format!("SUCCESS: Uninstalled {}", app.display()));
                removed.push(name);
            } else {
                self.hub().log(format!(
                    "ERROR: Uninstallation failed for {}: {}",
                    app.display(),
                    outcome.message
                ));
                failed.push(format!("{name} ({})", outcome.message));
            }
        }

        summarize_uninstall(&removed, &failed)
    }

    /// Delete files or directories, refusing protected paths.
    pub fn remove_paths(&self, paths: &[PathBuf]) -> Result<DeleteReport, ExecError> {
        if paths.is_empty() {
            return Err(ExecError::NoPaths);
        }

        let mut report = DeleteReport::default();
        for path in paths {
            match self.remove_one(path) {
                Ok(size) => {
                    report.deleted_count += 1;
                    report.deleted_size += size;
                    self.hub()
                        .log(format!("Deleted: {} ({})", path.display(), format_size(size)));
                }
                Err(err) => {
                    tracing::warn!(target: "exec", "cannot delete {}: {err}", path.display());
                    report.failed.push(path.clone());
                    report.errors.push(err.to_string());
                }
            }
        }

        report.success = report.failed.is_empty();
        report.size_human = format_size(report.deleted_size);
        Ok(report)
    }

    /// Remove purge candidates and report the bytes freed.
    pub fn purge(&self, paths: &[PathBuf]) -> CommandOutcome {
        let mut removed = 0usize;
        let mut freed = 0u64;

        for path in paths {
            match self.remove_one(path) {
                Ok(size) => {
                    removed += 1;
                    freed += size;
                    self.hub()
                        .log(format!("Purged: {} ({})", path.display(), format_size(size)));
                }
                Err(err) => {
                    tracing::warn!(target: "exec", "cannot purge {}: {err}", path.display());
                }
            }
        }

        CommandOutcome::succeeded(format!("Removed {removed} items")).with_cleaned_bytes(freed)
    }

    /// Remove a single path and return its size before removal.
    fn remove_one(&self, path: &Path) -> Result<u64, ExecError> {
        if is_protected_path(path) {
            return Err(ExecError::Protected {
                path: path.to_path_buf(),
            });
        }

        let metadata = fs::symlink_metadata(path).map_err(|e| ExecError::io(path, e))?;
        if metadata.is_dir() {
            let size = self.estimator.estimate(path, self.depth);
            fs::remove_dir_all(path).map_err(|e| ExecError::io(path, e))?;
            Ok(size)
        } else {
            fs::remove_file(path).map_err(|e| ExecError::io(path, e))?;
            Ok(metadata.len())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn summarize_uninstall(removed: &[String], failed: &[String]) -> CommandOutcome {
    if removed.is_empty() && !failed.is_empty() {
        return CommandOutcome::failed(format!("Failed to remove: {}", failed.join(", ")));
    }

    let mut message = format!("Uninstalled {} app(s)", removed.len());
    if !failed.is_empty() {
        message.push_str(&format!(" (Failed {}: {})", failed.len(), failed.join(", ")));
    }

    CommandOutcome::succeeded(message).with_output(format!(
        "Used Mole CLI for comprehensive cleanup of: {}",
        removed.join(", ")
    ))
}
