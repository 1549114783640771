//! # Merkle Commitments and Multiproofs
//!
//! A credential commits to its attribute values through a binary Merkle
//! tree whose leaves follow the schema's attribute order.
//!
//! ## Algorithm
//!
//! - Leaf: `SHA256(utf8(value))`.
//! - Node: `SHA256(left || right)`.
//! - The leaf layer is padded to the next power of two with the all-zero
//!   32-byte hash. A single-leaf tree has depth 0 and its root is the leaf.
//!
//! A multiproof reveals any subset of leaves at once. Proof generation and
//! verification walk the tree bottom-up with the same visiting order: at
//! each layer the known positions are taken in ascending order, a known
//! left child whose right sibling is also known is combined directly, and
//! otherwise the sibling hash is read from (or written to) the proof.
//!
//! ## Security Invariant
//!
//! [`verify_multi_proof`] consumes the whole proof before deciding, rejects
//! unused proof hashes, and compares the recomputed root in constant time.

use educert_core::CommitmentHash;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::CryptoError;
use crate::sha256::{leaf_hash, node_hash};

/// Hash used to pad the leaf layer to a power of two.
pub const PADDING_LEAF: [u8; 32] = [0u8; 32];

/// Upper bound on tree depth accepted by the verifier.
const MAX_DEPTH: u32 = 32;

// ─── Tree ─────────────────────────────────────────────────────────────

/// A fully materialized Merkle tree. `layers[0]` is the padded leaf layer,
/// the last layer holds only the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<[u8; 32]>>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree over attribute values in schema order.
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Result<Self, CryptoError> {
        Self::from_leaf_hashes(values.iter().map(|v| leaf_hash(v.as_ref())).collect())
    }

    /// Build a tree over precomputed leaf hashes.
    pub fn from_leaf_hashes(leaves: Vec<[u8; 32]>) -> Result<Self, CryptoError> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyTree);
        }
        let leaf_count = leaves.len();
        let mut level = leaves;
        level.resize(leaf_count.next_power_of_two(), PADDING_LEAF);

        let mut layers = vec![level];
        while let Some(current) = layers.last() {
            if current.len() == 1 {
                break;
            }
            let next: Vec<[u8; 32]> = current
                .chunks_exact(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
            layers.push(next);
        }
        Ok(Self { layers, leaf_count })
    }

    pub fn root(&self) -> [u8; 32] {
        // The constructor guarantees at least one layer holding one node.
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or(PADDING_LEAF)
    }

    pub fn commitment(&self) -> CommitmentHash {
        CommitmentHash::from_bytes(self.root())
    }

    /// Number of real (unpadded) leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// `log2` of the padded leaf layer width.
    pub fn depth(&self) -> u32 {
        (self.layers.len() - 1) as u32
    }

    pub fn leaf(&self, index: usize) -> Option<[u8; 32]> {
        if index < self.leaf_count {
            self.layers[0].get(index).copied()
        } else {
            None
        }
    }

    /// Produce a multiproof for the given leaf indices.
    ///
    /// # Errors
    ///
    /// `EmptyIndexSet`, `IndexOutOfRange` and `DuplicateIndex` for
    /// malformed disclosure sets.
    pub fn multi_proof(&self, indices: &[usize]) -> Result<MultiProof, CryptoError> {
        let known = normalize_indices(indices, self.leaf_count)?;

        let mut hashes = Vec::new();
        let mut positions = known.clone();
        for layer in &self.layers[..self.layers.len() - 1] {
            let mut next = Vec::with_capacity(positions.len());
            let mut i = 0;
            while i < positions.len() {
                let idx = positions[i];
                if idx % 2 == 0 && positions.get(i + 1) == Some(&(idx + 1)) {
                    i += 2;
                } else {
                    hashes.push(layer[idx ^ 1]);
                    i += 1;
                }
                next.push(idx / 2);
            }
            positions = next;
        }

        Ok(MultiProof {
            leaf_count: self.leaf_count,
            depth: self.depth(),
            indices: known,
            hashes,
        })
    }
}

/// Depth of a tree over `leaf_count` leaves.
pub fn depth_for(leaf_count: usize) -> u32 {
    leaf_count.max(1).next_power_of_two().trailing_zeros()
}

fn normalize_indices(indices: &[usize], leaf_count: usize) -> Result<Vec<usize>, CryptoError> {
    if indices.is_empty() {
        return Err(CryptoError::EmptyIndexSet);
    }
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    for (pos, &index) in sorted.iter().enumerate() {
        if index >= leaf_count {
            return Err(CryptoError::IndexOutOfRange { index, leaf_count });
        }
        if pos > 0 && sorted[pos - 1] == index {
            return Err(CryptoError::DuplicateIndex { index });
        }
    }
    Ok(sorted)
}

// ─── Proof ────────────────────────────────────────────────────────────

/// A multiproof for a set of leaves of one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MultiProof {
    /// Real leaf count of the tree the proof was cut from.
    pub leaf_count: usize,
    pub depth: u32,
    /// Disclosed leaf indices, ascending.
    pub indices: Vec<usize>,
    /// Sibling hashes in replay order.
    #[serde(with = "hex_hashes")]
    pub hashes: Vec<[u8; 32]>,
}

impl MultiProof {
    /// Check the proof's shape against its own leaf count, then replay it.
    ///
    /// `leaf_hashes` must be given in the same order as `self.indices`.
    pub fn verify(&self, root: &[u8; 32], leaf_hashes: &[[u8; 32]]) -> bool {
        if self.leaf_count == 0 || self.depth != depth_for(self.leaf_count) {
            return false;
        }
        if self.indices.iter().any(|&i| i >= self.leaf_count) {
            return false;
        }
        verify_multi_proof(root, &self.indices, leaf_hashes, self.depth, &self.hashes)
    }
}

/// Replay a multiproof and compare the result with `root`.
///
/// `indices[k]` is the leaf position of `leaf_hashes[k]`. Indices need not
/// be sorted but must be distinct. Any malformed input yields `false`.
pub fn verify_multi_proof(
    root: &[u8; 32],
    indices: &[usize],
    leaf_hashes: &[[u8; 32]],
    depth: u32,
    proof: &[[u8; 32]],
) -> bool {
    if indices.is_empty() || indices.len() != leaf_hashes.len() || depth > MAX_DEPTH {
        return false;
    }
    let Some(width) = 1usize.checked_shl(depth) else {
        return false;
    };

    let mut known: Vec<(usize, [u8; 32])> = indices
        .iter()
        .copied()
        .zip(leaf_hashes.iter().copied())
        .collect();
    known.sort_unstable_by_key(|(idx, _)| *idx);
    if known.iter().any(|(idx, _)| *idx >= width) || known.windows(2).any(|w| w[0].0 == w[1].0) {
        return false;
    }

    let mut ok = true;
    let mut p = 0;
    for _ in 0..depth {
        let mut next = Vec::with_capacity(known.len());
        let mut i = 0;
        while i < known.len() {
            let (idx, hash) = known[i];
            let parent = match known.get(i + 1) {
                Some(&(sib_idx, sib_hash)) if idx % 2 == 0 && sib_idx == idx + 1 => {
                    i += 2;
                    node_hash(&hash, &sib_hash)
                }
                _ => {
                    let sibling = match proof.get(p) {
                        Some(h) => *h,
                        None => {
                            ok = false;
                            PADDING_LEAF
                        }
                    };
                    p += 1;
                    i += 1;
                    if idx % 2 == 0 {
                        node_hash(&hash, &sibling)
                    } else {
                        node_hash(&sibling, &hash)
                    }
                }
            };
            next.push((idx / 2, parent));
        }
        known = next;
    }

    let root_matches = match known.as_slice() {
        [(0, computed)] => bool::from(computed.as_slice().ct_eq(root.as_slice())),
        _ => false,
    };
    ok & (p == proof.len()) & root_matches
}

mod hex_hashes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hashes: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(hashes.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<[u8; 32]>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| {
                let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
                <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
                    serde::de::Error::custom(format!("proof hash must be 32 bytes, got {}", bytes.len()))
                })
            })
            .collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn tree_and_subset() -> impl Strategy<Value = (Vec<String>, Vec<usize>)> {
        prop::collection::vec("[ -~]{0,24}", 1..20).prop_flat_map(|vals| {
            let n = vals.len();
            (
                Just(vals),
                prop::sample::subsequence((0..n).collect::<Vec<_>>(), 1..=n),
            )
        })
    }

    proptest! {
        #[test]
        fn disclosed_subset_verifies((vals, indices) in tree_and_subset()) {
            let tree = MerkleTree::from_values(&vals).unwrap();
            let proof = tree.multi_proof(&indices).unwrap();
            let leaves: Vec<[u8; 32]> = indices.iter().map(|&i| leaf_hash(&vals[i])).collect();
            prop_assert!(proof.verify(&tree.root(), &leaves));
        }

        #[test]
        fn tampered_value_fails(
            (vals, indices) in tree_and_subset(),
            pick in any::<prop::sample::Index>(),
            suffix in "[a-z]{1,4}",
        ) {
            let tree = MerkleTree::from_values(&vals).unwrap();
            let proof = tree.multi_proof(&indices).unwrap();
            let victim = pick.index(indices.len());
            let leaves: Vec<[u8; 32]> = indices
                .iter()
                .enumerate()
                .map(|(k, &i)| {
                    if k == victim {
                        leaf_hash(&format!("{}{}", vals[i], suffix))
                    } else {
                        leaf_hash(&vals[i])
                    }
                })
                .collect();
            prop_assert!(!proof.verify(&tree.root(), &leaves));
        }

        #[test]
        fn tampered_proof_hash_fails(
            (vals, indices) in tree_and_subset(),
            pick in any::<prop::sample::Index>(),
        ) {
            let tree = MerkleTree::from_values(&vals).unwrap();
            let mut proof = tree.multi_proof(&indices).unwrap();
            prop_assume!(!proof.hashes.is_empty());
            let k = pick.index(proof.hashes.len());
            proof.hashes[k][0] ^= 0x01;
            let leaves: Vec<[u8; 32]> = indices.iter().map(|&i| leaf_hash(&vals[i])).collect();
            prop_assert!(!proof.verify(&tree.root(), &leaves));
        }
    }
}
