//! Shared foundational pieces of the dijitso JIT build-and-cache system.
//!
//! This crate provides signature derivation: the deterministic mapping from a
//! caller-provided base signature plus parameter sets to the short identifier
//! that keys every cached artifact on disk and in memory.

#![warn(missing_docs)]

pub mod signature;

pub use signature::{extend_signature, hash_pairs};
