//! # SHA-256 Leaf and Node Hashing
//!
//! - Leaf: `SHA256(utf8(value))`.
//! - Node: `SHA256(left || right)`.
//!
//! No domain-separation prefix is applied. Stored commitments were produced
//! with this exact convention, so changing it would invalidate every
//! credential already on the ledger.

use sha2::{Digest, Sha256};

pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Hash one attribute value as a Merkle leaf.
pub fn leaf_hash(value: &str) -> [u8; 32] {
    sha256(value.as_bytes())
}

/// Hash two children into their parent.
pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
