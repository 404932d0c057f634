//! `dijitso-cache checkout` — copy one signature's artifacts out of the
//! cache for inspection or manual rebuilding.

use std::path::PathBuf;

use dijitso_cache::{lib_filename, read_inc, read_log, read_src};
use dijitso_params::Params;
use dijitso_system::{make_dirs, write_text};

use crate::CheckoutArgs;

/// Runs the `checkout` command. The header, source, and log are written
/// (decompressed) into `jitcheckout-<signature>/` in the working directory,
/// alongside a copy of the shared library when present.
pub fn run(args: &CheckoutArgs, params: &Params) -> Result<i32, Box<dyn std::error::Error>> {
    let out_dir = checkout(&args.signature, params, PathBuf::from("."))?;
    match out_dir {
        Some(dir) => {
            println!("checked out {} into {}", args.signature, dir.display());
            Ok(0)
        }
        None => {
            eprintln!("no cached artifacts found for '{}'", args.signature);
            Ok(1)
        }
    }
}

/// Copies artifacts into `<parent>/jitcheckout-<signature>/`. Returns
/// `None` when the signature has no artifacts at all.
fn checkout(
    signature: &str,
    params: &Params,
    parent: PathBuf,
) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let cache = &params.cache;
    let src = read_src(signature, cache)?;
    let inc = read_inc(signature, cache)?;
    let log = read_log(signature, cache)?;
    let lib = lib_filename(signature, cache);

    if src.is_none() && inc.is_none() && log.is_none() && !lib.exists() {
        return Ok(None);
    }

    let out_dir = parent.join(format!("jitcheckout-{signature}"));
    make_dirs(&out_dir)?;

    if let Some(content) = inc {
        write_text(&out_dir.join(format!("{signature}{}", cache.inc_postfix)), &content)?;
    }
    if let Some(content) = src {
        write_text(&out_dir.join(format!("{signature}{}", cache.src_postfix)), &content)?;
    }
    if let Some(content) = log {
        write_text(&out_dir.join(format!("{signature}{}", cache.log_postfix)), &content)?;
    }
    if lib.exists() {
        let name = lib.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        std::fs::copy(&lib, out_dir.join(name))?;
    }

    Ok(Some(out_dir))
}
