//! Role assignment for distributed builds.

use std::path::Path;
use std::str::FromStr;

use crate::communicator::Communicator;
use crate::discover::discover_path_access_ranks;
use crate::error::CommError;

/// What a peer does during one distributed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Generates, compiles, and installs the library.
    Builder,
    /// Receives the compiled binary from the builder and installs it.
    Receiver,
    /// Waits for its directory's builder or receiver to finish.
    Waiter,
}

/// Which peers build when a cache directory is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Every peer builds independently. Peers must not share a directory.
    Process,
    /// The lowest rank per physical directory builds; the rest wait.
    Node,
    /// Global rank 0 builds and ships the binary to one receiver per
    /// physical directory; the rest wait.
    Root,
}

impl FromStr for BuildStrategy {
    type Err = CommError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "process" => Ok(Self::Process),
            "node" => Ok(Self::Node),
            "root" => Ok(Self::Root),
            other => Err(CommError::UnknownStrategy(other.to_string())),
        }
    }
}

/// The outcome of role assignment for one peer.
pub struct RoleAssignment {
    /// Spans the builder and all receivers; used to ship compiled
    /// binaries. `None` when the strategy needs no copying.
    pub copy_comm: Option<Box<dyn Communicator>>,
    /// Spans the peers of one physical directory; used as the post-build
    /// barrier. `None` when every peer builds for itself.
    pub wait_comm: Option<Box<dyn Communicator>>,
    /// This peer's role.
    pub role: Role,
}

/// Partitions the peers of `comm` into roles for the chosen strategy.
///
/// `scratch_dir` is a directory on the same filesystem as the cache (the
/// cache's `comm/` subdirectory); marker files written there determine
/// which peers physically share the cache.
pub fn create_comms_and_role(
    comm: &dyn Communicator,
    scratch_dir: &Path,
    strategy: BuildStrategy,
) -> Result<RoleAssignment, CommError> {
    let peers = discover_path_access_ranks(comm, scratch_dir)?;
    let leader = *peers.first().unwrap_or(&comm.rank());

    match strategy {
        BuildStrategy::Process => {
            if peers.len() > 1 {
                return Err(CommError::SharedCacheCollision {
                    dir: scratch_dir.to_path_buf(),
                    ranks: peers,
                });
            }
            Ok(RoleAssignment {
                copy_comm: None,
                wait_comm: None,
                role: Role::Builder,
            })
        }
        BuildStrategy::Node => {
            let role = if comm.rank() == leader {
                Role::Builder
            } else {
                Role::Waiter
            };
            let wait_comm = comm.split(leader)?;
            log::debug!("rank {} assigned {role:?} (node strategy)", comm.rank());
            Ok(RoleAssignment {
                copy_comm: None,
                wait_comm: Some(wait_comm),
                role,
            })
        }
        BuildStrategy::Root => {
            let role = if comm.rank() == 0 {
                Role::Builder
            } else if comm.rank() == leader {
                Role::Receiver
            } else {
                Role::Waiter
            };
            let wait_comm = comm.split(leader)?;
            let copy_color = usize::from(role == Role::Waiter);
            let copy_comm = comm.split(copy_color)?;
            log::debug!("rank {} assigned {role:?} (root strategy)", comm.rank());
            Ok(RoleAssignment {
                copy_comm: Some(copy_comm),
                wait_comm: Some(wait_comm),
                role,
            })
        }
    }
}

/// Ships a compiled library to the receivers on the copy communicator.
/// The builder (rank 0 of the copy group) calls this with the bytes.
pub fn broadcast_send(copy_comm: &dyn Communicator, data: &[u8]) -> Result<(), CommError> {
    copy_comm.broadcast(data, 0).map(|_| ())
}

/// Receives a compiled library from the builder on the copy communicator.
pub fn broadcast_receive(copy_comm: &dyn Communicator) -> Result<Vec<u8>, CommError> {
    copy_comm.broadcast(&[], 0)
}
