//! Multi-process role coordination for shared JIT caches.
//!
//! Peer processes that share a cache directory (typically over NFS) must
//! agree on who compiles. The core never talks to a messaging library;
//! callers inject an implementation of the [`Communicator`] trait (an MPI
//! binding, a socket layer, or the in-process [`LocalComm`]) and this crate
//! partitions the peers into builder, receiver, and waiter roles.

#![warn(missing_docs)]

pub mod communicator;
pub mod discover;
pub mod error;
pub mod local;
pub mod roles;

pub use communicator::Communicator;
pub use discover::discover_path_access_ranks;
pub use error::CommError;
pub use local::LocalComm;
pub use roles::{
    broadcast_receive, broadcast_send, create_comms_and_role, BuildStrategy, Role, RoleAssignment,
};
