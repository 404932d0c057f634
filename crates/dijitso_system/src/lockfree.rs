//! Lock-free, NFS-safe file installation.
//!
//! The cache may be shared between processes on different hosts over NFS,
//! where advisory locks are unreliable. Installs instead go through a
//! rename-based protocol: stage the bytes under a private name on the
//! destination filesystem, publish them under a UUID-suffixed public name,
//! then let concurrent publishers cooperatively converge on a single final
//! file by yielding to the lowest UUID. Interrupted callers leave at worst
//! harmless `.priv.*`/`.pub.*` clutter, never a torn destination file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

use crate::error::SystemError;
use crate::fs::{files_equal, move_file, try_delete_file};

/// Upper bound on convergence rounds before giving up. Each round performs
/// one competitor sweep; real contention resolves in one or two.
const MAX_ROUNDS: usize = 16;

/// Moves `src` to `dst` without locks, safely under concurrent movers.
///
/// If `dst` already exists with identical contents, `src` is simply removed.
/// If the contents differ, the existing file wins, a warning is logged, and
/// `src` is removed. Otherwise the staged-publish protocol runs; on return
/// `dst` exists and no staging file owned by this call remains.
pub fn lockfree_move_file(src: &Path, dst: &Path) -> Result<(), SystemError> {
    if !src.exists() {
        return Err(SystemError::MissingSource {
            path: src.to_path_buf(),
        });
    }
    if dst.exists() {
        if !files_equal(src, dst)? {
            log::warn!(
                "not overwriting {} with different contents from {}",
                dst.display(),
                src.display()
            );
        }
        return try_delete_file(src);
    }

    // Stage on the destination filesystem under a private name, then make
    // the bytes visible to peers with an atomic same-directory rename.
    let own = Uuid::new_v4();
    let private = staged_path(dst, "priv", own);
    move_file(src, &private)?;
    let published = staged_path(dst, "pub", own);
    fs::rename(&private, &published).map_err(|e| SystemError::io(&published, e))?;

    let mut identity = own;
    for _ in 0..MAX_ROUNDS {
        let competitors = list_published(dst)?;

        // Competitors above us yield to us; we yield to the lowest seen.
        for other in &competitors {
            if other.as_u128() > identity.as_u128() {
                try_delete_file(&staged_path(dst, "pub", *other))?;
            }
        }
        if let Some(lowest) = competitors.iter().copied().min_by_key(Uuid::as_u128) {
            if lowest.as_u128() < identity.as_u128() {
                try_delete_file(&staged_path(dst, "pub", identity))?;
                identity = lowest;
            }
        }

        if dst.exists() {
            // A peer landed the final rename; clean up the surviving stage.
            try_delete_file(&staged_path(dst, "pub", identity))?;
            return Ok(());
        }

        match fs::rename(&staged_path(dst, "pub", identity), dst) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The owner of the adopted identity completed the install,
                // or a lower peer swept our file. Re-examine after a beat.
                if dst.exists() {
                    return Ok(());
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(_) if dst.exists() => return Ok(()),
            Err(e) => return Err(SystemError::io(dst, e)),
        }
    }

    Err(SystemError::MoveDiverged {
        dst: dst.to_path_buf(),
    })
}

/// Builds `<dst>.<stage>.<uuid>` next to the destination.
fn staged_path(dst: &Path, stage: &str, id: Uuid) -> PathBuf {
    let mut name = dst.as_os_str().to_os_string();
    name.push(format!(".{stage}.{}", id.simple()));
    PathBuf::from(name)
}

/// Enumerates the UUIDs of all `<dst>.pub.*` siblings.
fn list_published(dst: &Path) -> Result<Vec<Uuid>, SystemError> {
    let parent = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dst_name = match dst.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return Ok(Vec::new()),
    };
    let prefix = format!("{dst_name}.pub.");

    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SystemError::io(parent, e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SystemError::io(parent, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(suffix) = name.strip_prefix(&prefix) {
            if let Ok(id) = Uuid::try_parse(suffix) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}
