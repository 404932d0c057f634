//! The collective-communication contract injected by callers.

use crate::error::CommError;

/// A group of cooperating peers with collective operations.
///
/// Implementations wrap whatever transport the hosting program uses: an MPI
/// communicator, a socket mesh, or in-process threads
/// ([`LocalComm`](crate::LocalComm)). All collective methods must be called
/// by every member of the group in the same order; that is the caller's
/// responsibility, exactly as with MPI collectives.
pub trait Communicator: Send {
    /// This peer's rank within the group, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of peers in the group.
    fn size(&self) -> usize;

    /// Blocks until every member of the group has entered the barrier.
    fn barrier(&self) -> Result<(), CommError>;

    /// Splits the group by color. Peers passing the same color form a new
    /// group; ranks in the new group follow the rank order of the old one.
    fn split(&self, color: usize) -> Result<Box<dyn Communicator>, CommError>;

    /// Gathers every member's byte buffer, indexed by rank.
    fn allgather(&self, data: &[u8]) -> Result<Vec<Vec<u8>>, CommError>;

    /// Distributes `root`'s buffer to the whole group; every member
    /// returns the root's bytes. Non-root members' `data` is ignored.
    fn broadcast(&self, data: &[u8], root: usize) -> Result<Vec<u8>, CommError>;
}
