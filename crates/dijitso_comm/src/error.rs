//! Error types for peer coordination.

use std::path::PathBuf;

use dijitso_system::SystemError;

/// Errors from communicator operations and role assignment.
#[derive(Debug, thiserror::Error)]
pub enum CommError {
    /// The underlying transport failed.
    #[error("communicator failure: {0}")]
    Transport(String),

    /// A filesystem primitive failed during directory discovery.
    #[error(transparent)]
    System(#[from] SystemError),

    /// Several would-be builders share one physical cache directory under
    /// the `process` strategy, which would race on the same files.
    #[error("cache directory {dir} is shared by ranks {ranks:?}; use the 'node' or 'root' build strategy")]
    SharedCacheCollision {
        /// The shared directory.
        dir: PathBuf,
        /// Ranks observed to access the directory.
        ranks: Vec<usize>,
    },

    /// An unrecognized build strategy name.
    #[error("unknown build strategy '{0}', expected 'process', 'node', or 'root'")]
    UnknownStrategy(String),
}
