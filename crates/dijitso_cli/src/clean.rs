//! `dijitso-cache clean` — prune cached artifacts.

use std::path::PathBuf;

use dijitso_params::Params;

use crate::CleanArgs;

/// Runs the `clean` command.
pub fn run(args: &CleanArgs, params: &Params) -> Result<i32, Box<dyn std::error::Error>> {
    let victims = collect(args, params)?;
    for path in &victims {
        if args.dry_run {
            println!("would remove {}", path.display());
        } else {
            dijitso_system::try_delete_file(path)?;
            log::debug!("removed {}", path.display());
        }
    }
    let verb = if args.dry_run { "would remove" } else { "removed" };
    println!("{verb} {} file(s)", victims.len());
    Ok(0)
}

/// Collects the files that `clean` would remove.
fn collect(args: &CleanArgs, params: &Params) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut victims = Vec::new();
    for category in args.categories.selected() {
        let dir = category.dir(params);
        if !dir.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                victims.push(entry.path());
            }
        }
    }
    victims.sort();
    Ok(victims)
}
