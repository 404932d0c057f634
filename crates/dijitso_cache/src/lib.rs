//! Two-tier artifact cache for JIT-compiled shared libraries.
//!
//! The disk tier lives under a configurable cache root with one
//! subdirectory per artifact category (headers, sources, libraries, logs,
//! coordination scratch). The memory tier maps module signatures to loaded
//! library handles for the lifetime of the process. All writes into the
//! cache tree are staged and installed with the lock-free move, so a
//! half-written artifact is never visible under its final name.

#![warn(missing_docs)]

pub mod error;
pub mod library;
pub mod paths;
pub mod store;

pub use error::CacheError;
pub use library::{LibraryCache, LoadedLibrary};
pub use paths::{
    inc_filename, lib_basename, lib_filename, log_filename, make_comm_dir, make_inc_dir,
    make_lib_dir, make_log_dir, make_src_dir, src_filename,
};
pub use store::{
    compress_source_code, read_inc, read_library_binary, read_log, read_src, store_inc, store_log,
    store_src, store_textfile, write_library_binary,
};
