//! Path construction for cached artifacts.
//!
//! All functions here are pure over the signature and cache parameters, so
//! every component (and external tooling) derives identical paths.

use std::path::PathBuf;

use dijitso_params::CacheParams;
use dijitso_system::make_dirs;

use crate::error::CacheError;

/// Path of the cached header for a module signature.
pub fn inc_filename(signature: &str, cache: &CacheParams) -> PathBuf {
    cache
        .cache_dir
        .join(&cache.inc_dir)
        .join(format!("{signature}{}", cache.inc_postfix))
}

/// Path of the cached source file for a module signature.
pub fn src_filename(signature: &str, cache: &CacheParams) -> PathBuf {
    cache
        .cache_dir
        .join(&cache.src_dir)
        .join(format!("{signature}{}", cache.src_postfix))
}

/// Path of the cached build log for a module signature.
pub fn log_filename(signature: &str, cache: &CacheParams) -> PathBuf {
    cache
        .cache_dir
        .join(&cache.log_dir)
        .join(format!("{signature}{}", cache.log_postfix))
}

/// Bare library filename (no directory) for a module signature.
///
/// Exposed separately from [`lib_filename`] because the build driver stages
/// the library under this name in a temporary directory before install.
pub fn lib_basename(signature: &str, cache: &CacheParams) -> String {
    format!("{}{signature}{}", cache.lib_prefix, cache.lib_postfix)
}

/// Path of the cached shared library for a module signature.
pub fn lib_filename(signature: &str, cache: &CacheParams) -> PathBuf {
    cache
        .cache_dir
        .join(&cache.lib_dir)
        .join(lib_basename(signature, cache))
}

/// Creates the header directory if needed and returns its path.
pub fn make_inc_dir(cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_category_dir(cache, &cache.inc_dir)
}

/// Creates the source directory if needed and returns its path.
pub fn make_src_dir(cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_category_dir(cache, &cache.src_dir)
}

/// Creates the library directory if needed and returns its path.
pub fn make_lib_dir(cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_category_dir(cache, &cache.lib_dir)
}

/// Creates the log directory if needed and returns its path.
pub fn make_log_dir(cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_category_dir(cache, &cache.log_dir)
}

/// Creates the coordination scratch directory if needed and returns its path.
pub fn make_comm_dir(cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_category_dir(cache, &cache.comm_dir)
}

fn make_category_dir(cache: &CacheParams, subdir: &str) -> Result<PathBuf, CacheError> {
    let dir = cache.cache_dir.join(subdir);
    make_dirs(&dir)?;
    Ok(dir)
}
