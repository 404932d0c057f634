//! Dynamic-linker interop and the in-memory library cache.
//!
//! `LoadedLibrary` is the single place the OS dynamic linker is touched;
//! nothing linker-specific leaks through the rest of the API. Handles are
//! reference-counted and, once loaded, retained by the `LibraryCache` for
//! the lifetime of the process.

use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dijitso_params::CacheParams;

use crate::error::CacheError;
use crate::paths::{lib_filename, make_inc_dir, make_lib_dir, make_log_dir, make_src_dir};

/// An opaque handle to a loaded shared library.
///
/// The underlying library stays mapped for as long as any handle clone is
/// alive; the in-memory cache keeps one clone per signature, so symbols
/// extracted from a handle remain valid for the process lifetime.
pub struct LoadedLibrary {
    inner: libloading::Library,
    path: PathBuf,
}

impl LoadedLibrary {
    /// Loads the shared library at `path` via the platform dynamic linker.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        // SAFETY: loading a shared object runs its initializers. The cache
        // only ever loads libraries it installed itself (or that a peer
        // built from the same pipeline), which is the whole point of jit.
        let inner = unsafe { libloading::Library::new(path) }.map_err(|e| {
            CacheError::LoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// The file this library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a symbol to its raw address.
    ///
    /// # Safety
    ///
    /// The caller must cast the returned address to the symbol's true type;
    /// using it with a mismatched signature is undefined behavior.
    pub unsafe fn symbol_ptr(&self, name: &str) -> Result<*mut c_void, CacheError> {
        let symbol = self
            .inner
            .get::<*mut c_void>(name.as_bytes())
            .map_err(|e| CacheError::MissingSymbol {
                name: name.to_string(),
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(*symbol)
    }
}

impl std::fmt::Debug for LoadedLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("path", &self.path)
            .finish()
    }
}

/// Process-wide two-tier library lookup.
///
/// The memory tier maps module signatures to loaded handles; entries are
/// inserted on first successful load and never evicted. The disk tier is
/// probed on memory misses. State lives in this explicit value (threaded
/// through the JIT context) rather than in globals.
#[derive(Debug, Default)]
pub struct LibraryCache {
    libs: HashMap<String, Arc<LoadedLibrary>>,
    dirs_made: bool,
}

impl LibraryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a library in memory, then on disk.
    ///
    /// A disk hit is loaded, inserted into the memory tier, and returned.
    /// A missing library is `Ok(None)`; a present-but-unloadable library is
    /// an error.
    pub fn lookup_lib(
        &mut self,
        signature: &str,
        cache: &CacheParams,
    ) -> Result<Option<Arc<LoadedLibrary>>, CacheError> {
        if let Some(lib) = self.libs.get(signature) {
            return Ok(Some(Arc::clone(lib)));
        }
        self.load_library(signature, cache)
    }

    /// Loads a library from the disk cache, bypassing the memory tier, and
    /// registers the handle for later lookups.
    pub fn load_library(
        &mut self,
        signature: &str,
        cache: &CacheParams,
    ) -> Result<Option<Arc<LoadedLibrary>>, CacheError> {
        let path = lib_filename(signature, cache);
        if !path.exists() {
            return Ok(None);
        }

        let lib = Arc::new(LoadedLibrary::open(&path)?);
        log::debug!("loaded {} for signature {signature}", path.display());
        self.libs.insert(signature.to_string(), Arc::clone(&lib));
        Ok(Some(lib))
    }

    /// Creates all artifact directories, once per cache value. Repeated
    /// calls are free after the first success.
    pub fn ensure_dirs(&mut self, cache: &CacheParams) -> Result<(), CacheError> {
        if self.dirs_made {
            return Ok(());
        }
        make_inc_dir(cache)?;
        make_src_dir(cache)?;
        make_lib_dir(cache)?;
        make_log_dir(cache)?;
        self.dirs_made = true;
        Ok(())
    }

    /// Number of libraries resident in the memory tier.
    pub fn len(&self) -> usize {
        self.libs.len()
    }

    /// Whether the memory tier is empty.
    pub fn is_empty(&self) -> bool {
        self.libs.is_empty()
    }
}
