//! Error types for filesystem and subprocess operations.

use std::path::PathBuf;

/// Errors from filesystem primitives and subprocess invocation.
///
/// Directory creation tolerates already-existing directories and deletion
/// tolerates missing files; those cases never surface here. Everything else
/// is considered fatal by callers.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A move was requested for a source file that does not exist.
    #[error("cannot move missing file {path}")]
    MissingSource {
        /// The missing source path.
        path: PathBuf,
    },

    /// The lock-free move protocol did not converge on a final file.
    #[error("lock-free move of {dst} did not converge")]
    MoveDiverged {
        /// The intended destination path.
        dst: PathBuf,
    },

    /// A subprocess could not be spawned.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// The program name that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An empty argument vector was passed to the subprocess runner.
    #[error("empty command line")]
    EmptyCommand,
}

impl SystemError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
