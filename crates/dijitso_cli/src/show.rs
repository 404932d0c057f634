//! `dijitso-cache show` — list cached artifacts.

use dijitso_params::Params;

use crate::{Category, ShowArgs};

/// Runs the `show` command.
pub fn run(args: &ShowArgs, params: &Params) -> Result<i32, Box<dyn std::error::Error>> {
    let mut total = 0usize;
    for category in args.categories.selected() {
        let entries = list_category(category, args.signature.as_deref(), params)?;
        if entries.is_empty() {
            continue;
        }
        println!("{} ({}):", category.name(), category.dir(params).display());
        for (name, size) in &entries {
            println!("    {name}  {size} bytes");
            total += 1;
        }
    }
    if total == 0 {
        println!("cache is empty");
    }
    Ok(0)
}

/// Lists `(filename, size)` pairs of one category, sorted by name.
fn list_category(
    category: Category,
    signature: Option<&str>,
    params: &Params,
) -> Result<Vec<(String, u64)>, Box<dyn std::error::Error>> {
    let dir = category.dir(params);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(fragment) = signature {
            if !name.contains(fragment) {
                continue;
            }
        }
        entries.push((name, entry.metadata()?.len()));
    }
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dijitso_cache::{store_src, write_library_binary};

    fn params_at(root: &std::path::Path) -> Params {
        let mut params = Params::default();
        params.cache.cache_dir = root.to_path_buf();
        params
    }

    #[test]
    fn empty_cache_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_at(dir.path());
        assert!(list_category(Category::Src, None, &params)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn lists_stored_artifacts_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_at(dir.path());
        store_src("zz", "late", &params.cache).unwrap();
        store_src("aa", "early", &params.cache).unwrap();

        let entries = list_category(Category::Src, None, &params).unwrap();
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["aa.cpp", "zz.cpp"]);
    }

    #[test]
    fn signature_fragment_filters() {
        let dir = tempfile::tempdir().unwrap();
        let params = params_at(dir.path());
        write_library_binary(b"blob", "match-me", &params.cache).unwrap();
        write_library_binary(b"blob", "other", &params.cache).unwrap();

        let entries = list_category(Category::Lib, Some("match"), &params).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].0.contains("match-me"));
    }
}
