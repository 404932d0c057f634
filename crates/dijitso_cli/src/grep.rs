//! `dijitso-cache grep` — search cached text artifacts.

use std::path::{Path, PathBuf};

use dijitso_params::Params;
use dijitso_system::read_text_or_gz;

use crate::{Category, GrepArgs};

/// Runs the `grep` command. Exit code 0 when at least one line matched,
/// 1 otherwise, following grep convention.
pub fn run(args: &GrepArgs, params: &Params) -> Result<i32, Box<dyn std::error::Error>> {
    let matches = search(args, params)?;
    for (path, line_no, line) in &matches {
        println!("{}:{line_no}: {line}", path.display());
    }
    Ok(if matches.is_empty() { 1 } else { 0 })
}

/// Searches the selected text categories for lines containing the pattern.
fn search(
    args: &GrepArgs,
    params: &Params,
) -> Result<Vec<(PathBuf, usize, String)>, Box<dyn std::error::Error>> {
    let mut matches = Vec::new();
    for category in args.categories.selected() {
        // Shared libraries are binary; never grep them.
        if category == Category::Lib {
            continue;
        }
        let dir = category.dir(params);
        if !dir.is_dir() {
            continue;
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        for path in paths {
            let Some(base) = logical_path(&path) else { continue };
            if base != path && base.exists() {
                // A .gz sibling of an existing plain file; the plain file
                // already covers it.
                continue;
            }
            if let Some(content) = read_text_or_gz(&base)? {
                for (idx, line) in content.lines().enumerate() {
                    if line.contains(&args.pattern) {
                        matches.push((path.clone(), idx + 1, line.to_string()));
                    }
                }
            }
        }
    }
    Ok(matches)
}

/// Strips a trailing `.gz` so compressed artifacts read through the
/// transparent decompression helper.
fn logical_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    match name.strip_suffix(".gz") {
        Some(stem) => Some(path.with_file_name(stem)),
        None => Some(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CategoryArgs;
    use dijitso_cache::{compress_source_code, store_src};
    use dijitso_params::SrcStorage;

    fn params_at(root: &std::path::Path) -> Params {
        let mut params = Params::default();
        params.cache.cache_dir = root.to_path_buf();
        params
    }

    fn grep_args(pattern: &str) -> GrepArgs {
        GrepArgs {
            pattern: pattern.to_string(),
            categories: CategoryArgs::default(),
        }
    }

    #[test]
    fn finds_pattern_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_at(dir.path());
        store_src("sig", "int a();\nint needle();\n", &params.cache).unwrap();

        let matches = search(&grep_args("needle"), &params).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1, 2);
        assert!(matches[0].2.contains("needle"));
    }

    #[test]
    fn no_match_returns_exit_one() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_at(dir.path());
        store_src("sig", "nothing here\n", &params.cache).unwrap();
        assert_eq!(run(&grep_args("needle"), &params).unwrap(), 1);
    }

    #[test]
    fn searches_inside_compressed_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = params_at(dir.path());
        params.cache.src_storage = SrcStorage::Compress;
        let src = store_src("sig", "double needle_in_gz();\n", &params.cache).unwrap();
        compress_source_code(&src, &params.cache).unwrap();

        let matches = search(&grep_args("needle_in_gz"), &params).unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].0.to_string_lossy().ends_with(".cpp.gz"));
    }
}
