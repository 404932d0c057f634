//! Error types for cache operations.

use std::path::PathBuf;

use dijitso_system::SystemError;

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A filesystem primitive failed.
    #[error(transparent)]
    System(#[from] SystemError),

    /// A library file exists on disk but the dynamic linker rejected it.
    ///
    /// This is fatal: a present-but-unloadable library means the cache is
    /// corrupt or was produced for an incompatible platform, and silently
    /// rebuilding would mask that.
    #[error("failed to load library {path}: {reason}")]
    LoadFailed {
        /// The library file path.
        path: PathBuf,
        /// The dynamic linker's failure description.
        reason: String,
    },

    /// A requested symbol was not found in a loaded library.
    #[error("symbol '{name}' not found in {path}: {reason}")]
    MissingSymbol {
        /// The symbol name.
        name: String,
        /// The library file path.
        path: PathBuf,
        /// The dynamic linker's failure description.
        reason: String,
    },
}
