//! Crash-safe stores and readers for cached artifacts.

use std::path::{Path, PathBuf};

use dijitso_params::{CacheParams, SrcStorage};
use dijitso_system::{
    gzip_file, lockfree_move_file, read_bytes, read_text_or_gz, try_delete_file, write_text,
};
use uuid::Uuid;

use crate::error::CacheError;
use crate::paths::{
    inc_filename, lib_filename, log_filename, make_inc_dir, make_lib_dir, make_log_dir,
    make_src_dir, src_filename,
};

/// Writes text to `path` atomically: the content is staged under a unique
/// temporary name in the same directory and installed with the lock-free
/// move, so concurrent writers and crashes never leave a torn file.
pub fn store_textfile(path: &Path, content: &str) -> Result<(), CacheError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(format!(".{}", Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp_name);

    write_text(&tmp, content)?;
    lockfree_move_file(&tmp, path)?;
    Ok(())
}

/// Stores source code for a module signature, returning the file path.
pub fn store_src(signature: &str, content: &str, cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_src_dir(cache)?;
    let path = src_filename(signature, cache);
    store_textfile(&path, content)?;
    Ok(path)
}

/// Stores a header for a module signature, returning the file path.
pub fn store_inc(signature: &str, content: &str, cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_inc_dir(cache)?;
    let path = inc_filename(signature, cache);
    store_textfile(&path, content)?;
    Ok(path)
}

/// Stores a build log for a module signature, returning the file path.
pub fn store_log(signature: &str, content: &str, cache: &CacheParams) -> Result<PathBuf, CacheError> {
    make_log_dir(cache)?;
    let path = log_filename(signature, cache);
    store_textfile(&path, content)?;
    Ok(path)
}

/// Reads cached source code, transparently decompressing a `.gz` variant.
pub fn read_src(signature: &str, cache: &CacheParams) -> Result<Option<String>, CacheError> {
    Ok(read_text_or_gz(&src_filename(signature, cache))?)
}

/// Reads a cached header, transparently decompressing a `.gz` variant.
pub fn read_inc(signature: &str, cache: &CacheParams) -> Result<Option<String>, CacheError> {
    Ok(read_text_or_gz(&inc_filename(signature, cache))?)
}

/// Reads a cached build log, transparently decompressing a `.gz` variant.
pub fn read_log(signature: &str, cache: &CacheParams) -> Result<Option<String>, CacheError> {
    Ok(read_text_or_gz(&log_filename(signature, cache))?)
}

/// Reads a compiled shared library as a raw byte blob, for shipping to
/// peer processes over a caller-provided transport.
pub fn read_library_binary(lib_path: &Path) -> Result<Vec<u8>, CacheError> {
    Ok(read_bytes(lib_path)?)
}

/// Installs a pre-compiled library blob received from a peer into the
/// cache, returning the installed path.
pub fn write_library_binary(
    data: &[u8],
    signature: &str,
    cache: &CacheParams,
) -> Result<PathBuf, CacheError> {
    let lib_dir = make_lib_dir(cache)?;
    let path = lib_filename(signature, cache);

    let staged = lib_dir.join(format!(".incoming.{}", Uuid::new_v4().simple()));
    std::fs::write(&staged, data)
        .map_err(|e| dijitso_system::SystemError::io(&staged, e))?;
    lockfree_move_file(&staged, &path)?;
    Ok(path)
}

/// Applies the source retention policy to a stored source file.
///
/// `Keep` leaves the file, `Delete` removes it, `Compress` produces the
/// `.gz` variant and removes the original.
pub fn compress_source_code(src_path: &Path, cache: &CacheParams) -> Result<(), CacheError> {
    match cache.src_storage {
        SrcStorage::Keep => Ok(()),
        SrcStorage::Delete => Ok(try_delete_file(src_path)?),
        SrcStorage::Compress => {
            // The source may already have been compressed by a peer or an
            // earlier pipeline stage; only the original needs gzipping.
            if src_path.exists() {
                gzip_file(src_path)?;
            }
            Ok(try_delete_file(src_path)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_at(root: &Path) -> CacheParams {
        CacheParams {
            cache_dir: root.to_path_buf(),
            ..CacheParams::default()
        }
    }

    #[test]
    fn store_and_read_src() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());

        let path = store_src("sig", "int f();\n", &cache).unwrap();
        assert!(path.exists());
        assert_eq!(read_src("sig", &cache).unwrap().unwrap(), "int f();\n");
    }

    #[test]
    fn store_and_read_inc_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());

        store_inc("sig", "#pragma once\n", &cache).unwrap();
        store_log("sig", "compiler said ok\n", &cache).unwrap();
        assert_eq!(read_inc("sig", &cache).unwrap().unwrap(), "#pragma once\n");
        assert_eq!(
            read_log("sig", &cache).unwrap().unwrap(),
            "compiler said ok\n"
        );
    }

    #[test]
    fn read_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());
        assert!(read_src("absent", &cache).unwrap().is_none());
        assert!(read_inc("absent", &cache).unwrap().is_none());
        assert!(read_log("absent", &cache).unwrap().is_none());
    }

    #[test]
    fn store_textfile_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());
        store_src("sig", "content", &cache).unwrap();

        let src_dir = dir.path().join(&cache.src_dir);
        let names: Vec<String> = std::fs::read_dir(&src_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sig.cpp".to_string()]);
    }

    #[test]
    fn store_same_content_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());
        store_src("sig", "same", &cache).unwrap();
        store_src("sig", "same", &cache).unwrap();
        assert_eq!(read_src("sig", &cache).unwrap().unwrap(), "same");
    }

    #[test]
    fn write_and_read_library_binary() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());

        let blob = vec![0x7f, b'E', b'L', b'F', 1, 2, 3];
        let path = write_library_binary(&blob, "sig", &cache).unwrap();
        assert!(path.ends_with("lib/libdijitso-sig.so"));
        assert_eq!(read_library_binary(&path).unwrap(), blob);
    }

    #[test]
    fn retention_keep_leaves_source() {
        let dir = tempfile::tempdir().unwrap();
        let cache = params_at(dir.path());
        let path = store_src("sig", "code", &cache).unwrap();

        compress_source_code(&path, &cache).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn retention_delete_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = params_at(dir.path());
        cache.src_storage = SrcStorage::Delete;
        let path = store_src("sig", "code", &cache).unwrap();

        compress_source_code(&path, &cache).unwrap();
        assert!(!path.exists());
        assert!(read_src("sig", &cache).unwrap().is_none());
    }

    #[test]
    fn retention_compress_leaves_only_gz() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = params_at(dir.path());
        cache.src_storage = SrcStorage::Compress;
        let path = store_src("sig", "code to squeeze", &cache).unwrap();

        compress_source_code(&path, &cache).unwrap();
        assert!(!path.exists());

        let gz: PathBuf = {
            let mut name = path.as_os_str().to_os_string();
            name.push(".gz");
            PathBuf::from(name)
        };
        assert!(gz.exists());
        // The reader transparently falls back to the compressed variant.
        assert_eq!(read_src("sig", &cache).unwrap().unwrap(), "code to squeeze");
    }
}
