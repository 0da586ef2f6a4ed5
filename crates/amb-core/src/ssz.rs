//! SSZ container-field helpers built on top of the generic [`crate::merkle`]
//! engine (component D).
//!
//! These mirror the reference oracle's per-field-type hashing helpers.
//! Composite-element lists (`eth1_data_votes`, `validators`, ...) take the
//! caller's precomputed per-element hash-tree-roots rather than a generic
//! "hashable" trait — the container types live in [`crate::types`] and know
//! how to compute their own roots; this module only assembles the outer
//! vector/list tree around them.

use crate::hash::bytes_to_chunks;
use crate::merkle::{Hash, MerkleTree};

/// Hash a fixed-length vector of 32-byte roots (e.g. `block_roots`).
pub fn hash_roots_vector(roots: &[Hash]) -> Hash {
    MerkleTree::new_vector(roots.to_vec()).hash()
}

/// Hash a variable-length list of 32-byte roots with capacity `limit`
/// (e.g. `historical_roots`).
pub fn hash_roots_list(roots: &[Hash], limit: usize) -> Hash {
    MerkleTree::new_list(roots.to_vec(), limit).hash()
}

/// Hash a variable-length list of precomputed container roots (e.g. each
/// `eth1_data_votes[i].hash_tree_root()` or `validators[i].hash_tree_root()`).
pub fn hash_container_list(roots: &[Hash], limit: usize) -> Hash {
    hash_roots_list(roots, limit)
}

/// Hash a variable-length `uint64` list, packed 4 values per 32-byte chunk.
pub fn hash_uint64_list(values: &[u64], limit: usize) -> Hash {
    let mut data = vec![0u8; 8 * values.len()];
    for (i, v) in values.iter().enumerate() {
        data[i * 8..i * 8 + 8].copy_from_slice(&v.to_le_bytes());
    }
    MerkleTree::new_packed_list(&data, values.len(), limit / 4).hash()
}

/// Hash a fixed-length `uint64` vector, packed 4 values per 32-byte chunk.
pub fn hash_uint64_vector(values: &[u64]) -> Hash {
    let mut data = vec![0u8; 8 * values.len()];
    for (i, v) in values.iter().enumerate() {
        data[i * 8..i * 8 + 8].copy_from_slice(&v.to_le_bytes());
    }
    MerkleTree::new_packed_vector(&data).hash()
}

/// Hash a variable-length byte list (e.g. `historical_summaries` padding,
/// an SSZ `List[uint8, N]`), packed 32 bytes per chunk.
pub fn hash_uint8_list(bytes: &[u8], limit: usize) -> Hash {
    MerkleTree::new_packed_list(bytes, bytes.len(), limit / 32).hash()
}

/// Hash a fixed-length byte vector (e.g. a `Bytes32`/`Bytes20` field),
/// packed 32 bytes per chunk.
pub fn hash_bytes_vector(bytes: &[u8]) -> Hash {
    MerkleTree::new_vector(bytes_to_chunks(bytes)).hash()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::zero_hash;

    #[test]
    fn empty_uint64_list_hashes_to_zero_length_mix() {
        let h = hash_uint64_list(&[], 8192);
        let body = zero_hash(0);
        let expected = crate::hash::sha256_pair(&body, &crate::hash::uint_to_hash(0));
        assert_eq!(h, expected);
    }

    #[test]
    fn uint64_vector_packs_four_per_chunk() {
        let values: Vec<u64> = (1..=4).collect();
        let h = hash_uint64_vector(&values);
        let mut data = [0u8; 32];
        for (i, v) in values.iter().enumerate() {
            data[i * 8..i * 8 + 8].copy_from_slice(&v.to_le_bytes());
        }
        assert_eq!(h, data);
    }

    #[test]
    fn roots_vector_of_one_is_identity() {
        let root = [9u8; 32];
        assert_eq!(hash_roots_vector(&[root]), root);
    }
}
