//! Error types for command execution and file removal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running tools or removing files.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The maintenance CLI could not be found in any candidate location.
    #[error("Mole CLI not found")]
    ToolNotFound,

    /// The child process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A removal request named no paths.
    #[error("No paths specified")]
    NoPaths,

    /// The path is under a protected system prefix.
    #[error("Protected system path")]
    Protected { path: PathBuf },

    /// The path does not exist.
    #[error("Path does not exist")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a spawn error for `program`.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = ExecError::io(
            "/tmp/gone",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, ExecError::NotFound { .. }));
        assert_eq!(err.to_string(), "Path does not exist");
    }
}
