//! Building shared libraries and installing them into the cache.

use std::path::{Path, PathBuf};

use dijitso_cache::{
    compress_source_code, inc_filename, lib_basename, lib_filename, make_inc_dir, make_lib_dir,
    make_src_dir, src_filename, store_log, store_textfile,
};
use dijitso_params::Params;
use dijitso_system::{get_status_output, lockfree_move_file, make_dirs, move_file, write_text};

use crate::command::make_compile_command;
use crate::error::BuildError;

/// Result of one compiler invocation.
///
/// A non-zero `status` is not an error at this layer; the orchestrator
/// decides whether it is fatal. `lib_path` is the installed cache path on
/// success and `None` on compile failure.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Compiler exit status.
    pub status: i32,
    /// Captured compiler output (stdout and stderr).
    pub output: String,
    /// Installed library path, present only when `status == 0`.
    pub lib_path: Option<PathBuf>,
}

impl CompileOutcome {
    /// Returns `true` when the compiler exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Compiles a generated translation unit into a shared library.
///
/// The header (if any) and source are staged into a fresh temporary
/// directory and compiled there. On success all artifacts move into the
/// cache through the lock-free install, the build log is persisted, and the
/// source retention policy is applied. On failure nothing enters the cache;
/// a `jitfailure-<signature>/` directory is written in the current working
/// directory with the staged files, the compiler output (`error.log`), and
/// a rerunnable `command` file referencing the local basenames.
pub fn build_shared_library(
    signature: &str,
    header: Option<&str>,
    source: &str,
    dependencies: &[String],
    params: &Params,
) -> Result<CompileOutcome, BuildError> {
    let cache = &params.cache;
    let build = &params.build;

    let inc_base = format!("{signature}{}", cache.inc_postfix);
    let src_base = format!("{signature}{}", cache.src_postfix);
    let lib_base = lib_basename(signature, cache);

    let tmp = tempfile::tempdir().map_err(BuildError::TempDir)?;
    let temp_inc = tmp.path().join(&inc_base);
    let temp_src = tmp.path().join(&src_base);
    let temp_lib = tmp.path().join(&lib_base);

    if let Some(header) = header {
        store_textfile(&temp_inc, header)?;
    }
    store_textfile(&temp_src, source)?;

    let args = make_compile_command(&temp_src, &temp_lib, dependencies, build, cache)?;
    log::debug!("compiling {signature}: {}", args.join(" "));
    let result = get_status_output(&args)?;

    if !result.success() {
        let fail_dir = persist_failure(
            signature, &inc_base, &src_base, &lib_base, &temp_inc, &temp_src, dependencies,
            params, &result.output,
        )?;
        log::info!(
            "compilation of {signature} failed with status {}; see {}",
            result.status,
            fail_dir.display()
        );
        return Ok(CompileOutcome {
            status: result.status,
            output: result.output,
            lib_path: None,
        });
    }

    if !temp_lib.exists() {
        return Err(BuildError::MissingArtifact { path: temp_lib });
    }

    if header.is_some() {
        make_inc_dir(cache)?;
        lockfree_move_file(&temp_inc, &inc_filename(signature, cache))?;
    }
    make_src_dir(cache)?;
    let cache_src = src_filename(signature, cache);
    lockfree_move_file(&temp_src, &cache_src)?;
    make_lib_dir(cache)?;
    let cache_lib = lib_filename(signature, cache);
    lockfree_move_file(&temp_lib, &cache_lib)?;

    if !result.output.is_empty() {
        store_log(signature, &result.output, cache)?;
    }
    compress_source_code(&cache_src, cache)?;

    log::debug!("installed {} into cache", lib_base);
    Ok(CompileOutcome {
        status: 0,
        output: result.output,
        lib_path: Some(cache_lib),
    })
}

/// Writes the reproducible failure directory and returns its path.
#[allow(clippy::too_many_arguments)]
fn persist_failure(
    signature: &str,
    inc_base: &str,
    src_base: &str,
    lib_base: &str,
    temp_inc: &Path,
    temp_src: &Path,
    dependencies: &[String],
    params: &Params,
    output: &str,
) -> Result<PathBuf, BuildError> {
    let fail_dir = PathBuf::from(format!("jitfailure-{signature}"));
    make_dirs(&fail_dir)?;

    if temp_inc.exists() {
        move_file(temp_inc, &fail_dir.join(inc_base))?;
    }
    if temp_src.exists() {
        move_file(temp_src, &fail_dir.join(src_base))?;
    }

    // Rebuild the command against the local basenames so that rerunning it
    // inside the failure directory reproduces the error.
    let local_args = make_compile_command(
        Path::new(src_base),
        Path::new(lib_base),
        dependencies,
        &params.build,
        &params.cache,
    )?;
    write_text(
        &fail_dir.join("command"),
        &format!("{}\n", local_args.join(" ")),
    )?;
    write_text(&fail_dir.join("error.log"), output)?;

    Ok(fail_dir)
}
