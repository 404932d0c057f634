//! Error types for the JIT pipeline.

use dijitso_build::BuildError;
use dijitso_cache::CacheError;
use dijitso_params::ParamsError;

/// Error type produced by caller-supplied callbacks (generator, transport).
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong in a `jit` call.
#[derive(Debug, thiserror::Error)]
pub enum JitError {
    /// Parameter validation failed before any side effect.
    #[error(transparent)]
    Params(#[from] ParamsError),

    /// A cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The build driver hit a filesystem or spawn problem.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Both `generate` and `receive` were supplied; a peer is either a
    /// builder or a receiver, never both.
    #[error("please provide only one of generate or receive")]
    ConflictingRoles,

    /// Neither `generate`, `receive`, nor `wait` was supplied, so the call
    /// could never observe a built library.
    #[error("please provide wait when neither generate nor receive is given")]
    MissingRole,

    /// The caller's generator failed.
    #[error("code generation failed: {0}")]
    Generate(CallbackError),

    /// The caller's send callback failed.
    #[error("sending the compiled library failed: {0}")]
    Send(CallbackError),

    /// The caller's receive callback failed.
    #[error("receiving the compiled library failed: {0}")]
    Receive(CallbackError),

    /// The caller's wait callback failed.
    #[error("waiting for the builder failed: {0}")]
    Wait(CallbackError),

    /// The compiler exited non-zero. The working artifacts are preserved
    /// under `jitfailure-<signature>/` in the working directory.
    #[error("compilation of {signature} failed with status {status}:\n{output}")]
    Compile {
        /// The module signature being built.
        signature: String,
        /// Compiler exit status.
        status: i32,
        /// Captured compiler output.
        output: String,
    },

    /// After coordination completed, no library was present on disk.
    #[error("no library found in cache for {signature} after coordination")]
    NotBuilt {
        /// The module signature that was expected.
        signature: String,
    },
}
