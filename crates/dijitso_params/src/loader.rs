//! Discovery and parsing of `.dijitso.conf` configuration files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use configparser::ini::Ini;

use crate::error::ParamsError;

/// Basename of the configuration file searched for in each location.
pub const CONFIG_BASENAME: &str = ".dijitso.conf";

/// Parsed configuration file contents: section name to key/value entries.
pub type ConfigContents = BTreeMap<String, BTreeMap<String, String>>;

/// Searches for a configuration file, first hit wins.
///
/// Order: current working directory, the directory named by the
/// `DIJITSO_CONF` environment variable, the user's home directory, and
/// finally `/etc/dijitso`.
pub fn discover_config_filename() -> Option<PathBuf> {
    let mut search = vec![PathBuf::from(".")];
    if let Ok(dir) = std::env::var("DIJITSO_CONF") {
        if !dir.is_empty() {
            search.push(PathBuf::from(dir));
        }
    }
    if let Some(home) = dirs::home_dir() {
        search.push(home);
    }
    search.push(PathBuf::from("/etc/dijitso"));

    search
        .into_iter()
        .map(|dir| dir.join(CONFIG_BASENAME))
        .find(|candidate| candidate.is_file())
}

/// Parses an INI configuration file into section/key/value maps.
///
/// Keys present without a value parse as empty strings. Section and key
/// names are case-insensitive and normalized to lowercase.
pub fn parse_config_file(path: &Path) -> Result<ConfigContents, ParamsError> {
    let mut ini = Ini::new();
    let sections = ini.load(path).map_err(|reason| ParamsError::ConfigRead {
        path: path.to_path_buf(),
        reason,
    })?;

    let mut contents = ConfigContents::new();
    for (section, entries) in sections {
        let out = contents.entry(section).or_default();
        for (name, value) in entries {
            out.insert(name, value.unwrap_or_default());
        }
    }
    Ok(contents)
}

static CONFIG_FILE: OnceLock<Result<ConfigContents, ParamsError>> = OnceLock::new();

/// Reads the discovered configuration file, caching the parse for the rest
/// of the process. Returns empty contents when no file is found.
pub fn read_config_file() -> Result<&'static ConfigContents, &'static ParamsError> {
    CONFIG_FILE
        .get_or_init(|| match discover_config_filename() {
            Some(path) => {
                log::info!("using configuration file {}", path.display());
                parse_config_file(&path)
            }
            None => Ok(ConfigContents::new()),
        })
        .as_ref()
}
