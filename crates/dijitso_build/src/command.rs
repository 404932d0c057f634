//! Compile-command synthesis.

use std::path::{Path, PathBuf};

use dijitso_cache::{lib_basename, make_inc_dir, make_lib_dir};
use dijitso_params::{BuildParams, CacheParams};

use crate::error::BuildError;

/// Pieces together the compiler argument vector for one build.
///
/// The cache's own include and library directories are appended to the
/// caller-configured lists, the combined lists are deduplicated preserving
/// first occurrence, and every directory is resolved to an absolute path.
/// rpath entries are embedded so that dependencies between cached libraries
/// resolve at load time without environment variables. Dependencies are
/// linked by exact filename (`-l:<basename>`) so the configured library
/// prefix never has to follow the `lib*` convention.
pub fn make_compile_command(
    src_filename: &Path,
    lib_filename: &Path,
    dependencies: &[String],
    build: &BuildParams,
    cache: &CacheParams,
) -> Result<Vec<String>, BuildError> {
    let mut args = vec![build.cxx.clone()];

    args.push(format!("-o{}", lib_filename.display()));

    args.extend(build.cxxflags.iter().cloned());
    if build.debug {
        args.extend(build.cxxflags_debug.iter().cloned());
    } else {
        args.extend(build.cxxflags_opt.iter().cloned());
    }

    let inc_dir = make_inc_dir(cache)?;
    let lib_dir = make_lib_dir(cache)?;

    let mut include_dirs = build.include_dirs.clone();
    include_dirs.push(inc_dir);
    let mut lib_dirs = build.lib_dirs.clone();
    lib_dirs.push(lib_dir.clone());
    let mut rpath_dirs = build.rpath_dirs.clone();
    rpath_dirs.push(lib_dir);

    for dir in make_unique(include_dirs) {
        args.push(format!("-I{}", absolute(&dir)?.display()));
    }
    for dir in make_unique(lib_dirs) {
        args.push(format!("-L{}", absolute(&dir)?.display()));
    }
    for dir in make_unique(rpath_dirs) {
        args.push(format!("-Wl,-rpath,{}", absolute(&dir)?.display()));
    }

    args.push(src_filename.display().to_string());

    for dep in dependencies {
        args.push(format!("-l:{}", lib_basename(dep, cache)));
    }
    for lib in &build.libs {
        args.push(format!("-l{lib}"));
    }

    Ok(args)
}

/// Order-preserving deduplication. Quadratic, fine for the handful of
/// directories a build sees.
fn make_unique(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !unique.contains(&dir) {
            unique.push(dir);
        }
    }
    unique
}

fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
    std::path::absolute(path).map_err(|e| BuildError::Resolve {
        path: path.to_path_buf(),
        source: e,
    })
}
