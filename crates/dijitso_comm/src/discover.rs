//! Discovery of peers sharing a physical cache directory.
//!
//! Path strings cannot be compared across hosts: symlinks, bind mounts, and
//! NFS exports disguise equality. Instead every peer drops a marker file
//! into the directory and then observes which other markers it can see.

use std::path::Path;

use uuid::Uuid;

use dijitso_system::{make_dirs, try_delete_file, write_text};

use crate::communicator::Communicator;
use crate::error::CommError;

/// Determines which ranks of `comm` can access `dir`.
///
/// All peers agree on a session identifier broadcast from rank 0, write an
/// empty `rank.<session>.<rank>` marker, rendezvous, and then enumerate the
/// markers visible in the directory. Two peers share the directory iff they
/// see each other's markers. Markers are removed before returning. The
/// result always contains the calling rank and is sorted ascending.
pub fn discover_path_access_ranks(
    comm: &dyn Communicator,
    dir: &Path,
) -> Result<Vec<usize>, CommError> {
    let seed = if comm.rank() == 0 {
        Uuid::new_v4().simple().to_string().into_bytes()
    } else {
        Vec::new()
    };
    let session = String::from_utf8_lossy(&comm.broadcast(&seed, 0)?).into_owned();

    make_dirs(dir)?;
    let marker = dir.join(format!("rank.{session}.{}", comm.rank()));
    write_text(&marker, "")?;

    comm.barrier()?;

    let prefix = format!("rank.{session}.");
    let mut ranks = Vec::new();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| dijitso_system::SystemError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| dijitso_system::SystemError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(suffix) = name.strip_prefix(&prefix) {
            if let Ok(rank) = suffix.parse::<usize>() {
                ranks.push(rank);
            }
        }
    }
    ranks.sort_unstable();

    // Hold the markers in place until every peer has enumerated.
    comm.barrier()?;
    try_delete_file(&marker)?;

    log::debug!(
        "rank {} shares {} with ranks {:?}",
        comm.rank(),
        dir.display(),
        ranks
    );
    Ok(ranks)
}
