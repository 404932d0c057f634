//! Layered parameter resolution: defaults ← config file ← caller overrides.

use std::path::{Path, PathBuf};

use crate::error::ParamsError;
use crate::loader::{read_config_file, ConfigContents};
use crate::types::{BuildParams, CacheParams, ParamValue, Params, ParamsOverrides};

/// Validates caller overrides and produces the fully resolved parameter set.
///
/// Built-in defaults are overlaid with the discovered configuration file
/// (if any) and then the caller's overrides. Unknown categories or keys are
/// fatal, except inside `generator`, which is free-form. Finally, if the
/// `INSTANT_CACHE_DIR` environment variable is set, the cache root is
/// redirected to `<INSTANT_CACHE_DIR>/dijitso`.
pub fn validate_params(overrides: &ParamsOverrides) -> Result<Params, ParamsError> {
    let config = read_config_file().map_err(Clone::clone)?;
    let instant = std::env::var("INSTANT_CACHE_DIR").ok();
    resolve_params(config, overrides, instant.as_deref())
}

/// Pure resolution over explicit inputs; `validate_params` wires in the
/// real config file and environment.
pub fn resolve_params(
    config: &ConfigContents,
    overrides: &ParamsOverrides,
    instant_cache_dir: Option<&str>,
) -> Result<Params, ParamsError> {
    let mut params = Params::default();

    let config_overrides: ParamsOverrides = config
        .iter()
        .map(|(category, entries)| {
            let entries = entries
                .iter()
                .map(|(name, value)| (name.clone(), ParamValue::Str(value.clone())))
                .collect();
            (category.clone(), entries)
        })
        .collect();
    apply_overrides(&mut params, &config_overrides)?;
    apply_overrides(&mut params, overrides)?;

    if let Some(dir) = instant_cache_dir {
        if !dir.is_empty() {
            params.cache.cache_dir = Path::new(dir).join("dijitso");
        }
    }

    Ok(params)
}

fn apply_overrides(params: &mut Params, overrides: &ParamsOverrides) -> Result<(), ParamsError> {
    for (category, entries) in overrides {
        match category.as_str() {
            "cache" => {
                for (name, value) in entries {
                    apply_cache(&mut params.cache, name, value)?;
                }
            }
            "build" => {
                for (name, value) in entries {
                    apply_build(&mut params.build, name, value)?;
                }
            }
            "generator" => {
                for (name, value) in entries {
                    params.generator.insert(name.clone(), value.as_repr());
                }
            }
            other => return Err(ParamsError::UnknownCategory(other.to_string())),
        }
    }
    Ok(())
}

fn apply_cache(cache: &mut CacheParams, name: &str, value: &ParamValue) -> Result<(), ParamsError> {
    match name {
        "cache_dir" => cache.cache_dir = PathBuf::from(expand_user(&as_string("cache", name, value)?)),
        "inc_dir" => cache.inc_dir = expand_user(&as_string("cache", name, value)?),
        "src_dir" => cache.src_dir = expand_user(&as_string("cache", name, value)?),
        "lib_dir" => cache.lib_dir = expand_user(&as_string("cache", name, value)?),
        "log_dir" => cache.log_dir = expand_user(&as_string("cache", name, value)?),
        "comm_dir" => cache.comm_dir = expand_user(&as_string("cache", name, value)?),
        "inc_postfix" => cache.inc_postfix = as_string("cache", name, value)?,
        "src_postfix" => cache.src_postfix = as_string("cache", name, value)?,
        "log_postfix" => cache.log_postfix = as_string("cache", name, value)?,
        "lib_postfix" => cache.lib_postfix = as_string("cache", name, value)?,
        "lib_prefix" => cache.lib_prefix = as_string("cache", name, value)?,
        "src_storage" => {
            let raw = as_string("cache", name, value)?;
            cache.src_storage = raw.parse().map_err(|reason| ParamsError::InvalidValue {
                category: "cache".to_string(),
                name: name.to_string(),
                reason,
            })?;
        }
        _ => {
            return Err(ParamsError::UnknownKey {
                category: "cache".to_string(),
                name: name.to_string(),
            })
        }
    }
    Ok(())
}

fn apply_build(build: &mut BuildParams, name: &str, value: &ParamValue) -> Result<(), ParamsError> {
    match name {
        "cxx" => build.cxx = as_string("build", name, value)?,
        "cxxflags" => build.cxxflags = as_str_list(value),
        "cxxflags_debug" => build.cxxflags_debug = as_str_list(value),
        "cxxflags_opt" => build.cxxflags_opt = as_str_list(value),
        "include_dirs" => build.include_dirs = as_dir_list(value),
        "lib_dirs" => build.lib_dirs = as_dir_list(value),
        "rpath_dirs" => build.rpath_dirs = as_dir_list(value),
        "libs" => build.libs = as_str_list(value),
        "debug" => build.debug = as_bool("build", name, value)?,
        _ => {
            return Err(ParamsError::UnknownKey {
                category: "build".to_string(),
                name: name.to_string(),
            })
        }
    }
    Ok(())
}

fn as_string(category: &str, name: &str, value: &ParamValue) -> Result<String, ParamsError> {
    match value {
        ParamValue::Str(s) => Ok(s.clone()),
        ParamValue::List(_) => Err(ParamsError::InvalidValue {
            category: category.to_string(),
            name: name.to_string(),
            reason: "expected a string, got a list".to_string(),
        }),
    }
}

/// A single string is accepted as a one-element list.
fn as_str_list(value: &ParamValue) -> Vec<String> {
    match value {
        ParamValue::Str(s) => vec![s.clone()],
        ParamValue::List(items) => items.clone(),
    }
}

fn as_dir_list(value: &ParamValue) -> Vec<PathBuf> {
    as_str_list(value)
        .iter()
        .map(|s| PathBuf::from(expand_user(s)))
        .collect()
}

fn as_bool(category: &str, name: &str, value: &ParamValue) -> Result<bool, ParamsError> {
    let raw = as_string(category, name, value)?;
    match raw.as_str() {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" => Ok(false),
        other => Err(ParamsError::InvalidValue {
            category: category.to_string(),
            name: name.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Expands a leading `~` to the user's home directory.
fn expand_user(value: &str) -> String {
    if value == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().into_owned();
        }
    } else if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    value.to_string()
}
