//! SHA-256 hash primitives and SSZ chunking helpers (component A).
//!
//! Every hash in this crate is a plain 32-byte array — SSZ has no concept of
//! a "hash type" distinct from any other 32-byte chunk, so we don't invent one.

use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// SHA-256 of the concatenation of all supplied buffers.
///
/// Every call site in this crate concatenates exactly two 32-byte chunks, so
/// this ends up hashing exactly 64 bytes — but the signature stays variadic
/// to mirror the original `Sha256Hash(bs ...[]byte)` helper it was ported from.
pub fn sha256_concat(buffers: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for buf in buffers {
        hasher.update(buf);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// SHA-256 of two 32-byte chunks, concatenated left-then-right.
pub fn sha256_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    sha256_concat(&[left, right])
}

/// SSZ's little-endian `uint64` chunk encoding: 8 bytes of the value,
/// zero-padded on the right out to 32 bytes.
pub fn uint_to_hash(v: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[..8].copy_from_slice(&v.to_le_bytes());
    out
}

/// Slice `bytes` into 32-byte chunks, right-padding the final chunk with
/// zeros. This is the packing step for SSZ basic-type vectors/lists.
pub fn bytes_to_chunks(bytes: &[u8]) -> Vec<[u8; 32]> {
    let num_chunks = bytes.len().div_ceil(32);
    let mut chunks = Vec::with_capacity(num_chunks);
    for i in 0..num_chunks {
        let start = i * 32;
        let end = (start + 32).min(bytes.len());
        let mut chunk = [0u8; 32];
        chunk[..end - start].copy_from_slice(&bytes[start..end]);
        chunks.push(chunk);
    }
    chunks
}

/// Smallest power of two `>= n` (`1` for `n == 0`).
pub fn ceil_pow2(n: usize) -> usize {
    let mut res = 1usize;
    while res < n {
        res *= 2;
    }
    res
}

/// The root of an all-zero perfect binary tree with `n` leaves, computed by
/// iterative doubling (`log2(n)` SHA-256 calls) and memoized — beacon-state
/// subtrees can have up to 2^28 leaves, so recomputing this from scratch on
/// every call would dominate runtime.
pub fn zero_hash(n: usize) -> [u8; 32] {
    static TABLE: OnceLock<std::sync::Mutex<Vec<[u8; 32]>>> = OnceLock::new();
    let table = TABLE.get_or_init(|| std::sync::Mutex::new(vec![[0u8; 32]]));
    let mut table = table.lock().expect("zero-hash table poisoned");

    let levels_needed = n.trailing_zeros() as usize + 1;
    while table.len() < levels_needed.max(1) {
        let prev = *table.last().expect("table is never empty");
        table.push(sha256_pair(&prev, &prev));
    }

    let level = if n <= 1 { 0 } else { n.trailing_zeros() as usize };
    table[level]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_base_case_is_zero() {
        assert_eq!(zero_hash(0), [0u8; 32]);
        assert_eq!(zero_hash(1), [0u8; 32]);
    }

    #[test]
    fn zero_hash_doubling_invariant() {
        for &n in &[2usize, 4, 8, 16, 32, 64] {
            let expected = sha256_pair(&zero_hash(n / 2), &zero_hash(n / 2));
            assert_eq!(zero_hash(n), expected, "zero_hash({n}) doubling mismatch");
        }
    }

    #[test]
    fn ceil_pow2_matches_expected_values() {
        assert_eq!(ceil_pow2(0), 1);
        assert_eq!(ceil_pow2(1), 1);
        assert_eq!(ceil_pow2(2), 2);
        assert_eq!(ceil_pow2(3), 4);
        assert_eq!(ceil_pow2(5), 8);
        assert_eq!(ceil_pow2(512), 512);
        assert_eq!(ceil_pow2(513), 1024);
    }

    #[test]
    fn uint_to_hash_is_little_endian_padded() {
        let h = uint_to_hash(1);
        assert_eq!(h[0], 1);
        assert_eq!(&h[1..], &[0u8; 31]);
    }

    #[test]
    fn bytes_to_chunks_right_pads_last_chunk() {
        let data = vec![1u8, 2, 3];
        let chunks = bytes_to_chunks(&data);
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..3], &[1, 2, 3]);
        assert_eq!(&chunks[0][3..], &[0u8; 29]);
    }

    #[test]
    fn bytes_to_chunks_is_left_inverse_of_concatenation() {
        let data: Vec<u8> = (0..70u8).collect();
        let chunks = bytes_to_chunks(&data);
        assert_eq!(chunks.len(), 3);
        let mut reassembled = Vec::new();
        for c in &chunks {
            reassembled.extend_from_slice(c);
        }
        assert_eq!(&reassembled[..70], &data[..]);
        assert!(reassembled[70..].iter().all(|&b| b == 0));
    }
}
