//! Filesystem and subprocess primitives for the dijitso JIT cache.
//!
//! Everything in the cache that touches the filesystem goes through this
//! crate: idempotent directory creation, tolerant deletion, gzip handling,
//! the lock-free NFS-safe move used for atomic installs, and compiler
//! subprocess invocation with captured output.

#![warn(missing_docs)]

pub mod error;
pub mod fs;
pub mod lockfree;
pub mod process;

pub use error::SystemError;
pub use fs::{
    files_equal, gzip_file, make_dirs, move_file, read_bytes, read_text_or_gz, try_delete_file,
    write_text,
};
pub use lockfree::lockfree_move_file;
pub use process::{get_status_output, CommandOutput};
