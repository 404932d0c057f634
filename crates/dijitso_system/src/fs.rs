//! Basic filesystem helpers shared by the cache and build layers.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::SystemError;

/// Creates a directory tree. Succeeds if the directory already exists,
/// including when a concurrent process creates it first.
pub fn make_dirs(path: &Path) -> Result<(), SystemError> {
    fs::create_dir_all(path).map_err(|e| SystemError::io(path, e))
}

/// Removes a file, doing nothing if it is not there.
pub fn try_delete_file(path: &Path) -> Result<(), SystemError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SystemError::io(path, e)),
    }
}

/// Moves a file, falling back to copy-and-delete when a plain rename fails
/// (for example across filesystem boundaries).
pub fn move_file(src: &Path, dst: &Path) -> Result<(), SystemError> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dst).map_err(|e| SystemError::io(dst, e))?;
            try_delete_file(src)
        }
    }
}

/// Gzips `path`, producing `<path>.gz`. The original file is left in place;
/// callers decide whether to remove it. If the `.gz` file already exists the
/// call does nothing and returns its path.
pub fn gzip_file(path: &Path) -> Result<PathBuf, SystemError> {
    let gz_path = gz_variant(path);
    if gz_path.exists() {
        return Ok(gz_path);
    }

    let mut input = fs::File::open(path).map_err(|e| SystemError::io(path, e))?;
    let output = fs::File::create(&gz_path).map_err(|e| SystemError::io(&gz_path, e))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    std::io::copy(&mut input, &mut encoder).map_err(|e| SystemError::io(&gz_path, e))?;
    encoder
        .finish()
        .map_err(|e| SystemError::io(&gz_path, e))?
        .sync_all()
        .map_err(|e| SystemError::io(&gz_path, e))?;
    Ok(gz_path)
}

/// Reads `path` as text, falling back to decompressing `<path>.gz`.
/// Returns `None` when neither variant exists.
pub fn read_text_or_gz(path: &Path) -> Result<Option<String>, SystemError> {
    if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| SystemError::io(path, e))?;
        return Ok(Some(content));
    }

    let gz_path = gz_variant(path);
    if gz_path.exists() {
        let file = fs::File::open(&gz_path).map_err(|e| SystemError::io(&gz_path, e))?;
        let mut decoder = GzDecoder::new(file);
        let mut content = String::new();
        decoder
            .read_to_string(&mut content)
            .map_err(|e| SystemError::io(&gz_path, e))?;
        return Ok(Some(content));
    }

    Ok(None)
}

/// Writes text content to a file, creating or truncating it.
pub fn write_text(path: &Path, content: &str) -> Result<(), SystemError> {
    let mut file = fs::File::create(path).map_err(|e| SystemError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| SystemError::io(path, e))
}

/// Reads a file as raw bytes.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, SystemError> {
    fs::read(path).map_err(|e| SystemError::io(path, e))
}

/// Compares two files byte-for-byte.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool, SystemError> {
    let da = read_bytes(a)?;
    let db = read_bytes(b)?;
    Ok(da == db)
}

/// Returns the `.gz` sibling path of `path`.
pub fn gz_variant(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}
