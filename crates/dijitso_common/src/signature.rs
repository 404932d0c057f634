//! Module-signature derivation.
//!
//! A caller identifies a jitable by an opaque base signature. The actual
//! cache key (the *module signature*) extends that base with a hash over the
//! generator and build parameters, so that the same jitable compiled under
//! different parameters lands in different cache slots.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// Maximum number of characters of the base signature retained in the
/// derived module signature. Keeps cache filenames friendly to shells and
/// network filesystems even for long caller signatures.
pub const BASE_PREFIX_LEN: usize = 48;

/// Number of hex characters of the parameter hash appended to the base.
pub const HASH_PREFIX_LEN: usize = 16;

/// Hashes a flattened set of parameter key/value pairs into a hex string.
///
/// The result is insensitive to the order of `pairs`: they are sorted before
/// being fed to the hasher. Keys and values are length-prefixed so that
/// adjacent components cannot alias each other.
pub fn hash_pairs(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for (key, value) in sorted {
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Derives the module signature for a base signature and parameter pairs.
///
/// The result is `<base prefix>-<hash prefix>`, deterministic for a given
/// input and independent of pair ordering. Two calls differing in any key or
/// value produce different module signatures (up to hash collisions).
pub fn extend_signature(base: &str, pairs: &[(String, String)]) -> String {
    let digest = hash_pairs(pairs);
    let base_prefix: String = base.chars().take(BASE_PREFIX_LEN).collect();
    format!("{}-{}", base_prefix, &digest[..HASH_PREFIX_LEN])
}
