//! dijitso-cache — the command-line interface to the dijitso JIT cache.
//!
//! Provides `config` for showing the resolved configuration, `show` for
//! listing cached artifacts, `clean` for pruning them, `grep` for searching
//! cached sources, and `checkout` for copying one signature's artifacts
//! into the working directory for inspection.

#![warn(missing_docs)]

mod checkout;
mod clean;
mod config;
mod grep;
mod show;

use std::collections::BTreeMap;
use std::process;

use clap::{Args, Parser, Subcommand};
use dijitso_params::{validate_params, ParamValue, Params, ParamsOverrides};

/// dijitso-cache — browse and manage the JIT compilation cache.
#[derive(Parser, Debug)]
#[command(name = "dijitso-cache", version, about = "dijitso JIT cache tool")]
pub struct Cli {
    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use a non-default cache root directory.
    #[arg(long, global = true)]
    pub cache_dir: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the fully resolved configuration.
    Config(config::ConfigArgs),
    /// List cached artifacts.
    Show(ShowArgs),
    /// Remove cached artifacts.
    Clean(CleanArgs),
    /// Search cached sources and headers for a pattern.
    Grep(GrepArgs),
    /// Copy one signature's artifacts into the working directory.
    Checkout(CheckoutArgs),
}

/// Artifact category selection shared by several subcommands. Selecting
/// none means all categories.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct CategoryArgs {
    /// Include header files.
    #[arg(long)]
    pub inc: bool,

    /// Include source files.
    #[arg(long)]
    pub src: bool,

    /// Include shared libraries.
    #[arg(long)]
    pub lib: bool,

    /// Include build logs.
    #[arg(long)]
    pub log: bool,
}

/// One artifact category of the cache tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Header files.
    Inc,
    /// Source files.
    Src,
    /// Shared libraries.
    Lib,
    /// Build logs.
    Log,
}

impl CategoryArgs {
    /// The selected categories, defaulting to all when none are flagged.
    pub fn selected(&self) -> Vec<Category> {
        let mut categories = Vec::new();
        if self.inc {
            categories.push(Category::Inc);
        }
        if self.src {
            categories.push(Category::Src);
        }
        if self.lib {
            categories.push(Category::Lib);
        }
        if self.log {
            categories.push(Category::Log);
        }
        if categories.is_empty() {
            categories = vec![Category::Inc, Category::Src, Category::Lib, Category::Log];
        }
        categories
    }
}

impl Category {
    /// The cache subdirectory holding this category.
    pub fn dir(self, params: &Params) -> std::path::PathBuf {
        let sub = match self {
            Category::Inc => &params.cache.inc_dir,
            Category::Src => &params.cache.src_dir,
            Category::Lib => &params.cache.lib_dir,
            Category::Log => &params.cache.log_dir,
        };
        params.cache.cache_dir.join(sub)
    }

    /// Display name used in listings.
    pub fn name(self) -> &'static str {
        match self {
            Category::Inc => "inc",
            Category::Src => "src",
            Category::Lib => "lib",
            Category::Log => "log",
        }
    }
}

/// Arguments for `dijitso-cache show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only list artifacts whose name contains this signature fragment.
    pub signature: Option<String>,

    /// Category selection.
    #[command(flatten)]
    pub categories: CategoryArgs,
}

/// Arguments for `dijitso-cache clean`.
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Only report what would be removed.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Category selection.
    #[command(flatten)]
    pub categories: CategoryArgs,
}

/// Arguments for `dijitso-cache grep`.
#[derive(Args, Debug)]
pub struct GrepArgs {
    /// Substring to search for.
    pub pattern: String,

    /// Category selection; libraries are skipped even when selected.
    #[command(flatten)]
    pub categories: CategoryArgs,
}

/// Arguments for `dijitso-cache checkout`.
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// The module signature to check out.
    pub signature: String,
}

/// Builds parameter overrides from global CLI flags.
fn cli_overrides(cli: &Cli) -> ParamsOverrides {
    let mut overrides = ParamsOverrides::new();
    if let Some(dir) = &cli.cache_dir {
        let mut cache = BTreeMap::new();
        cache.insert("cache_dir".to_string(), ParamValue::from(dir.clone()));
        overrides.insert("cache".to_string(), cache);
    }
    overrides
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let result: Result<i32, Box<dyn std::error::Error>> = validate_params(&cli_overrides(&cli))
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|params| match &cli.command {
            Command::Config(args) => config::run(args, &params),
            Command::Show(args) => show::run(args, &params),
            Command::Clean(args) => clean::run(args, &params),
            Command::Grep(args) => grep::run(args, &params),
            Command::Checkout(args) => checkout::run(args, &params),
        });

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
