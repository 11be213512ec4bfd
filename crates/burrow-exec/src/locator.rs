//! Discovery of the maintenance CLI.

use std::path::{Path, PathBuf};

use crate::ExecError;
use crate::hub::BroadcastHub;

/// File name of the maintenance CLI.
pub const TOOL_NAME: &str = "mole";

const STANDARD_INSTALL: &str = "/usr/local/bin/mole";

#[derive(Debug, Clone)]
enum Probe {
    File(PathBuf),
    SearchPath,
}

/// Finds the maintenance CLI by probing an ordered list of locations.
///
/// The default order is: the configured tool directory, `./mole`,
/// `../../mole`, the app-bundle `Resources` folder next to the running
/// executable, `../Resources/mole`, `PATH`, and finally
/// `/usr/local/bin/mole`. Every probe outcome is logged through the hub.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    hub: BroadcastHub,
    probes: Vec<Probe>,
}

impl ToolLocator {
    /// Create a locator with the default probe order.
    pub fn new(hub: BroadcastHub, tool_dir: Option<&Path>) -> Self {
        let mut probes = Vec::new();
        if let Some(dir) = tool_dir {
            probes.push(Probe::File(dir.join(TOOL_NAME)));
        }
        probes.push(Probe::File(PathBuf::from("./mole")));
        probes.push(Probe::File(PathBuf::from("../../mole")));
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        if let Some(exe_dir) = exe_dir {
            probes.push(Probe::File(exe_dir.join("..").join("Resources").join(TOOL_NAME)));
        }
        probes.push(Probe::File(PathBuf::from("../Resources/mole")));
        probes.push(Probe::SearchPath);
        probes.push(Probe::File(PathBuf::from(STANDARD_INSTALL)));

        Self { hub, probes }
    }

    /// Create a locator that only checks `paths`, in order.
    pub fn with_paths(hub: BroadcastHub, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            hub,
            probes: paths.into_iter().map(Probe::File).collect(),
        }
    }

    /// Return the first existing candidate, as an absolute path.
    pub fn locate(&self) -> Option<PathBuf> {
        self.hub.log("Finding Mole CLI script...");

        for probe in &self.probes {
            let found = match probe {
                Probe::File(path) => path
                    .is_file()
                    .then(|| std::path::absolute(path).unwrap_or_else(|_| path.clone())),
                Probe::SearchPath => which::which(TOOL_NAME).ok(),
            };
            if let Some(path) = found {
                self.hub.log(format!("Found Mole CLI at: {}", path.display()));
                return Some(path);
            }
        }

        self.hub.log("ERROR: Mole CLI not found in any expected location");
        None
    }

    /// Like [`locate`](Self::locate), but a missing tool is an error.
    pub fn require(&self) -> Result<PathBuf, ExecError> {
        self.locate().ok_or(ExecError::ToolNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_first_existing_candidate_wins() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a/mole");
        let second = temp.path().join("b/mole");
        fs::create_dir_all(second.parent().unwrap()).unwrap();
        fs::write(&second, "#!/bin/sh\n").unwrap();

        let locator = ToolLocator::with_paths(BroadcastHub::new(), [first, second.clone()]);
        assert_eq!(locator.locate(), Some(second));
    }

    #[test]
    fn test_missing_tool_is_error() {
        let temp = TempDir::new().unwrap();
        let hub = BroadcastHub::new();
        let mut sub = hub.subscribe();

        let locator = ToolLocator::with_paths(hub, [temp.path().join("mole")]);
        assert!(matches!(locator.require(), Err(ExecError::ToolNotFound)));

        let mut lines = Vec::new();
        while let Some(line) = sub.try_recv() {
            lines.push(line);
        }
        assert_eq!(
            lines.last().map(String::as_str),
            Some("ERROR: Mole CLI not found in any expected location")
        );
    }

    #[test]
    fn test_tool_dir_probed_first() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(TOOL_NAME), "#!/bin/sh\n").unwrap();

        let locator = ToolLocator::new(BroadcastHub::new(), Some(temp.path()));
        assert_eq!(locator.locate(), Some(temp.path().join(TOOL_NAME)));
    }
}
