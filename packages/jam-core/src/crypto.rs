//! BLAKE2b-256 hashing for the codec, state keys, and content addressing.

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;

use crate::types::Hash;

/// Blake2b-256 hash (32-byte output).
#[must_use]
pub fn blake2b256(data: &[u8]) -> Hash {
    let mut hasher = Blake2bVar::new(32).expect("BLAKE2b-256 output size 32 is valid");
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher
        .finalize_variable(&mut out)
        .expect("32-byte output");
    out
}

/// Blake2b-256 of the concatenation of two hashes (Merkle node hashing).
#[must_use]
pub fn blake2b256_pair(left: &Hash, right: &Hash) -> Hash {
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(left);
    combined[32..].copy_from_slice(right);
    blake2b256(&combined)
}
