//! Compile driver for JIT-generated shared libraries.
//!
//! Builds run in a fresh temporary directory: the generated header and
//! source are staged there, the compiler is invoked, and on success all
//! artifacts are installed into the cache with the lock-free move. On
//! failure nothing enters the cache; instead a reproducible failure
//! directory is written next to the working directory so the user can cd
//! in and rerun the exact compile command.

#![warn(missing_docs)]

pub mod build;
pub mod command;
pub mod error;

pub use build::{build_shared_library, CompileOutcome};
pub use command::make_compile_command;
pub use error::BuildError;
