//! Error types for the build driver.

use std::path::PathBuf;

use dijitso_cache::CacheError;
use dijitso_system::SystemError;

/// Errors from compile-command synthesis and library builds.
///
/// A failing compiler is *not* represented here; it is reported through
/// [`CompileOutcome`](crate::CompileOutcome) so the orchestrator decides
/// how to surface it. These variants cover filesystem and spawn problems,
/// which are always fatal.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A filesystem primitive failed.
    #[error(transparent)]
    System(#[from] SystemError),

    /// A cache store or install failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The temporary build directory could not be created.
    #[error("failed to create temporary build directory: {0}")]
    TempDir(std::io::Error),

    /// A directory could not be resolved to an absolute path.
    #[error("failed to resolve {path} to an absolute path: {source}")]
    Resolve {
        /// The directory being resolved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler reported success but produced no library file.
    #[error("compiler exited successfully but produced no library at {path}")]
    MissingArtifact {
        /// The expected library path in the temporary build directory.
        path: PathBuf,
    },
}
