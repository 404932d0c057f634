//! `dijitso-cache config` — show the resolved configuration.

use clap::Args;
use dijitso_params::Params;

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Emit the configuration as JSON instead of key/value lines.
    #[arg(long)]
    pub json: bool,
}

/// Runs the `config` command.
pub fn run(args: &ConfigArgs, params: &Params) -> Result<i32, Box<dyn std::error::Error>> {
    print!("{}", render(args, params)?);
    Ok(0)
}

/// Renders the configuration to a string, separated out for testing.
fn render(args: &ConfigArgs, params: &Params) -> Result<String, Box<dyn std::error::Error>> {
    if args.json {
        let mut out = serde_json::to_string_pretty(params)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    out.push_str("cache:\n");
    out.push_str(&format!("    cache_dir: {}\n", params.cache.cache_dir.display()));
    out.push_str(&format!("    comm_dir: {}\n", params.cache.comm_dir));
    out.push_str(&format!("    inc_dir: {}\n", params.cache.inc_dir));
    out.push_str(&format!("    inc_postfix: {}\n", params.cache.inc_postfix));
    out.push_str(&format!("    lib_dir: {}\n", params.cache.lib_dir));
    out.push_str(&format!("    lib_postfix: {}\n", params.cache.lib_postfix));
    out.push_str(&format!("    lib_prefix: {}\n", params.cache.lib_prefix));
    out.push_str(&format!("    log_dir: {}\n", params.cache.log_dir));
    out.push_str(&format!("    log_postfix: {}\n", params.cache.log_postfix));
    out.push_str(&format!("    src_dir: {}\n", params.cache.src_dir));
    out.push_str(&format!("    src_postfix: {}\n", params.cache.src_postfix));
    out.push_str(&format!("    src_storage: {:?}\n", params.cache.src_storage));

    out.push_str("build:\n");
    out.push_str(&format!("    cxx: {}\n", params.build.cxx));
    out.push_str(&format!("    cxxflags: {:?}\n", params.build.cxxflags));
    out.push_str(&format!(
        "    cxxflags_debug: {:?}\n",
        params.build.cxxflags_debug
    ));
    out.push_str(&format!(
        "    cxxflags_opt: {:?}\n",
        params.build.cxxflags_opt
    ));
    out.push_str(&format!("    debug: {}\n", params.build.debug));
    out.push_str(&format!(
        "    include_dirs: {:?}\n",
        params.build.include_dirs
    ));
    out.push_str(&format!("    lib_dirs: {:?}\n", params.build.lib_dirs));
    out.push_str(&format!("    libs: {:?}\n", params.build.libs));
    out.push_str(&format!("    rpath_dirs: {:?}\n", params.build.rpath_dirs));

    out.push_str("generator:\n");
    for (name, value) in &params.generator {
        out.push_str(&format!("    {name}: {value}\n"));
    }
    Ok(out)
}
