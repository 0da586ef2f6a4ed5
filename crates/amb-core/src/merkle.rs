//! Generalized-index Merkle trees over 32-byte chunks (component B).
//!
//! This is the non-materialized SSZ Merkleization engine: a [`MerkleTree`]
//! never stores internal nodes, only leaves plus `limit`/`length`. Every
//! root, single proof, and multi-proof is derived on demand by walking
//! `limit`-sized subtrees with [`merkle`]. Ported in spirit from the
//! reference oracle's `MerkleTree`/`MerkleProof`/`MerkleMultiProof`.

use crate::hash::{ceil_pow2, sha256_pair, uint_to_hash, zero_hash};
use std::collections::HashMap;

pub type Hash = [u8; 32];

/// A vector- or list-backed Merkle tree of 32-byte leaves.
///
/// Vectors hash straight to `merkle(leaves, limit)`. Lists additionally mix
/// in a length chunk: `sha256(merkle(leaves, limit) || length_chunk)`, and
/// their generalized indices live one level deeper (below the length mixin)
/// than a vector tree's.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    is_list: bool,
    length: usize,
    limit: usize,
    leaves: Vec<Hash>,
}

/// A single-leaf inclusion proof anchored at a generalized index.
#[derive(Debug, Clone)]
pub struct MerkleProof {
    pub gen_index: usize,
    pub path: Vec<Hash>,
}

/// A multi-leaf inclusion proof: the known leaves plus the decommitments
/// needed to reconstruct the root around them.
#[derive(Debug, Clone)]
pub struct MerkleMultiProof {
    pub gen_indices: Vec<usize>,
    pub leaves_hashes: Vec<Hash>,
    pub decommitments: Vec<Hash>,
}

impl MerkleTree {
    /// Build a fixed-size (SSZ vector) tree; `limit` is the next power of
    /// two at or above `leaves.len()`.
    pub fn new_vector(leaves: Vec<Hash>) -> Self {
        let limit = ceil_pow2(leaves.len());
        MerkleTree { is_list: false, length: 0, limit, leaves }
    }

    /// Build a variable-size (SSZ list) tree with an explicit capacity.
    ///
    /// # Panics
    /// Panics if `limit < leaves.len()` or `limit` is not a power of two —
    /// both are caller bugs, never a runtime condition to recover from.
    pub fn new_list(leaves: Vec<Hash>, limit: usize) -> Self {
        assert!(limit >= leaves.len(), "invalid length, max {limit}, got {}", leaves.len());
        assert!(limit & (limit.wrapping_sub(1)) == 0, "limit is not a power of 2, {limit}");
        let length = leaves.len();
        MerkleTree { is_list: true, length, limit, leaves }
    }

    /// Build a vector tree over packed basic-type leaves (e.g. a `uint64`
    /// vector packed 4-per-chunk).
    pub fn new_packed_vector(data: &[u8]) -> Self {
        Self::new_vector(crate::hash::bytes_to_chunks(data))
    }

    /// Build a list tree over packed basic-type leaves, with an explicit
    /// element `length` distinct from the chunk count.
    pub fn new_packed_list(data: &[u8], length: usize, limit: usize) -> Self {
        let leaves = crate::hash::bytes_to_chunks(data);
        MerkleTree { is_list: true, length, limit, leaves }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// The tree's root, mixing in the length chunk for lists.
    pub fn hash(&self) -> Hash {
        let x = merkle(&self.leaves, self.limit);
        if self.is_list {
            sha256_pair(&x, &uint_to_hash(self.length as u64))
        } else {
            x
        }
    }

    /// Build an inclusion proof for leaf `idx`, walking its generalized
    /// index up to the root one bit at a time and computing the sibling
    /// subtree root at each level.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds.
    pub fn make_proof(&self, idx: usize) -> MerkleProof {
        assert!(idx < self.leaves.len(), "index out of bounds");
        let mut gen_idx = idx + self.limit;
        let mut path = Vec::with_capacity(10);

        let mut l = idx as isize;
        let mut r = l + 1;
        let mut k: isize = 1;
        while gen_idx > 1 {
            if gen_idx % 2 == 1 {
                l -= k;
                let e = (r - k).min(self.leaves.len() as isize).max(0) as usize;
                let lu = l.max(0) as usize;
                path.push(merkle(&self.leaves[lu..e], k as usize));
            } else {
                r += k;
                let e = r.min(self.leaves.len() as isize) as usize;
                let lk = (l + k).max(0) as usize;
                if lk <= e {
                    path.push(merkle(&self.leaves[lk..e], k as usize));
                } else {
                    path.push(merkle(&[], k as usize));
                }
            }
            gen_idx /= 2;
            k *= 2;
        }

        if self.is_list {
            path.push(uint_to_hash(self.length as u64));
            MerkleProof { gen_index: idx + self.limit * 2, path }
        } else {
            MerkleProof { gen_index: idx + self.limit, path }
        }
    }

    /// Build a multi-leaf proof for a set of leaf indices, sorted or not.
    ///
    /// With an empty index set the "proof" degenerates to the root itself,
    /// carried as the sole decommitment — this matches callers that want to
    /// prove "none of these are included" by just checking against the root.
    pub fn make_multi_proof(&self, indices: &[usize]) -> MerkleMultiProof {
        if indices.is_empty() {
            return MerkleMultiProof {
                gen_indices: Vec::new(),
                leaves_hashes: Vec::new(),
                decommitments: vec![self.hash()],
            };
        }

        let mut gen_indices = Vec::with_capacity(indices.len());
        let mut leaves_hashes = Vec::with_capacity(indices.len());
        let mut decommitments = Vec::new();
        let mut known: HashMap<usize, bool> = HashMap::with_capacity(indices.len() * 2);
        let mut hashes: HashMap<usize, Hash> = HashMap::with_capacity(self.limit);

        for i in 0..self.limit {
            let h = if i < self.leaves.len() { self.leaves[i] } else { zero_hash(0) };
            hashes.insert(i + self.limit, h);
        }

        for &idx in indices.iter().rev() {
            assert!(idx < self.leaves.len(), "index out of bounds");
            gen_indices.push(idx + self.limit);
            leaves_hashes.push(self.leaves[idx]);
            known.insert(idx + self.limit, true);
        }

        let mut i = self.limit * 2 - 1;
        while i > 1 {
            let left = known.get(&(i - 1)).copied().unwrap_or(false);
            let right = known.get(&i).copied().unwrap_or(false);
            if left && !right {
                decommitments.push(hashes[&i]);
            }
            if !left && right {
                decommitments.push(hashes[&(i - 1)]);
            }
            known.insert(i / 2, left || right);
            let paired = sha256_pair(&hashes[&(i - 1)], &hashes[&i]);
            hashes.insert(i / 2, paired);
            i -= 2;
        }

        MerkleMultiProof { gen_indices, leaves_hashes, decommitments }
    }
}

impl MerkleMultiProof {
    /// Reconstruct the root this proof commits to, draining a FIFO work
    /// queue of `(generalized_index, hash)` pairs seeded with the known
    /// leaves and growing by one parent per step.
    ///
    /// # Panics
    /// Panics if the proof is malformed (empty `gen_indices` with no
    /// decommitment to fall back to).
    pub fn reconstruct_root(&self) -> Hash {
        if self.gen_indices.is_empty() {
            return self.decommitments[0];
        }

        let mut indices = self.gen_indices.clone();
        let mut hashes = self.leaves_hashes.clone();
        let mut head = 0usize;
        let mut di = 0usize;

        loop {
            let index = indices[head];
            let mut hash = hashes[head];
            head += 1;

            if index == 1 {
                return hash;
            } else if index & 1 == 0 {
                hash = sha256_pair(&hash, &self.decommitments[di]);
                di += 1;
            } else if head != indices.len() && indices[head] == index - 1 {
                hash = sha256_pair(&hashes[head], &hash);
                head += 1;
            } else {
                hash = sha256_pair(&self.decommitments[di], &hash);
                di += 1;
            }
            indices.push(index / 2);
            hashes.push(hash);
        }
    }
}

impl MerkleProof {
    /// Reconstruct the root committed to by this proof, starting from a
    /// known leaf value and walking the generalized index's bits from
    /// least to most significant.
    ///
    /// # Panics
    /// Panics if `path.len()` doesn't match `gen_index`'s bit length.
    pub fn reconstruct_root(&self, data: Hash) -> Hash {
        assert_eq!(
            self.gen_index >> self.path.len(),
            1,
            "invalid proof length"
        );
        let mut leaf = data;
        let mut gen_index = self.gen_index;
        let mut i = 0;
        while gen_index > 1 {
            leaf = if gen_index % 2 == 1 {
                sha256_pair(&self.path[i], &leaf)
            } else {
                sha256_pair(&leaf, &self.path[i])
            };
            gen_index /= 2;
            i += 1;
        }
        leaf
    }
}

/// Hash an arbitrary byte string as an SSZ `Bytes32`-packed vector tree.
pub fn bytes_to_merkle_hash(bs: &[u8]) -> Hash {
    MerkleTree::new_vector(crate::hash::bytes_to_chunks(bs)).hash()
}

/// The root of a perfect `n`-leaf subtree, recursing down the midpoint and
/// falling back to [`zero_hash`] for the unpopulated right half.
pub fn merkle(chunks: &[Hash], n: usize) -> Hash {
    if chunks.is_empty() {
        return zero_hash(n);
    }
    if n == 1 {
        return chunks[0];
    }
    let m = n / 2;
    if chunks.len() <= m {
        sha256_pair(&merkle(chunks, m), &zero_hash(m))
    } else {
        sha256_pair(&merkle(&chunks[..m], m), &merkle(&chunks[m..], m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(b: u8) -> Hash {
        let mut h = [0u8; 32];
        h[0] = b;
        h
    }

    #[test]
    fn single_leaf_vector_root_is_the_leaf() {
        let tree = MerkleTree::new_vector(vec![leaf(7)]);
        assert_eq!(tree.hash(), leaf(7));
    }

    #[test]
    fn five_leaf_vector_root_matches_manual_construction() {
        let leaves: Vec<Hash> = (1..=5).map(leaf).collect();
        let tree = MerkleTree::new_vector(leaves.clone());
        // limit = 8
        let l01 = sha256_pair(&leaves[0], &leaves[1]);
        let l23 = sha256_pair(&leaves[2], &leaves[3]);
        let l45 = sha256_pair(&leaves[4], &zero_hash(1));
        let l67 = zero_hash(2);
        let l0123 = sha256_pair(&l01, &l23);
        let l4567 = sha256_pair(&l45, &l67);
        let root = sha256_pair(&l0123, &l4567);
        assert_eq!(tree.hash(), root);
    }

    #[test]
    fn single_leaf_proof_round_trips() {
        let leaves: Vec<Hash> = (1..=5).map(leaf).collect();
        let tree = MerkleTree::new_vector(leaves.clone());
        for idx in 0..leaves.len() {
            let proof = tree.make_proof(idx);
            assert_eq!(proof.reconstruct_root(leaves[idx]), tree.hash());
        }
    }

    #[test]
    fn list_root_mixes_in_length() {
        let leaves: Vec<Hash> = (1..=3).map(leaf).collect();
        let tree = MerkleTree::new_list(leaves.clone(), 8);
        let body = merkle(&leaves, 8);
        let expected = sha256_pair(&body, &uint_to_hash(3));
        assert_eq!(tree.hash(), expected);
    }

    #[test]
    #[should_panic(expected = "invalid length")]
    fn list_with_limit_below_length_panics() {
        MerkleTree::new_list(vec![leaf(1), leaf(2), leaf(3)], 2);
    }

    #[test]
    #[should_panic(expected = "not a power of 2")]
    fn list_with_non_pow2_limit_panics() {
        MerkleTree::new_list(vec![leaf(1)], 3);
    }

    #[test]
    fn multi_proof_over_512_leaves_reconstructs_root() {
        let leaves: Vec<Hash> = (0..512u32)
            .map(|i| {
                let mut h = [0u8; 32];
                h[..4].copy_from_slice(&i.to_le_bytes());
                h
            })
            .collect();
        let tree = MerkleTree::new_vector(leaves);
        let indices = [3, 7, 15, 16, 17, 35, 87, 123, 124, 156, 199, 417, 483, 511];
        let proof = tree.make_multi_proof(&indices);
        assert_eq!(proof.reconstruct_root(), tree.hash());
    }

    #[test]
    fn multi_proof_singleton_matches_single_proof() {
        let leaves: Vec<Hash> = (0..512u32)
            .map(|i| {
                let mut h = [0u8; 32];
                h[..4].copy_from_slice(&i.to_le_bytes());
                h
            })
            .collect();
        let tree = MerkleTree::new_vector(leaves);
        let multi = tree.make_multi_proof(&[17]);
        assert_eq!(multi.reconstruct_root(), tree.hash());
        let single = tree.make_proof(17);
        assert_eq!(single.reconstruct_root(multi.leaves_hashes[0]), tree.hash());
    }

    #[test]
    fn multi_proof_over_empty_index_set_carries_the_root() {
        let leaves: Vec<Hash> = (1..=5).map(leaf).collect();
        let tree = MerkleTree::new_vector(leaves);
        let proof = tree.make_multi_proof(&[]);
        assert!(proof.gen_indices.is_empty());
        assert_eq!(proof.reconstruct_root(), tree.hash());
    }

    #[test]
    fn bytes_to_merkle_hash_matches_packed_vector() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let via_chunks = bytes_to_merkle_hash(data);
        let via_packed = MerkleTree::new_packed_vector(data).hash();
        assert_eq!(via_chunks, via_packed);
    }
}
