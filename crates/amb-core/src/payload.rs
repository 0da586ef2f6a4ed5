//! Execution-payload state-root proving (component G).
//!
//! Ported from the `verifyExecutionPayload` branch of
//! `cmd/light_client_chain/prove/main.go`: proves that a given execution
//! state root and block number sit inside a beacon state's
//! `latest_execution_payload_header` field (generalized index 24), by
//! composing the outer state-tree proof with an inner proof through the
//! header container itself.

use crate::hash::uint_to_hash;
use crate::merkle::{Hash, MerkleTree};
use crate::state::{self, BeaconStateInputs};

/// Generalized index (within the header's own 14-leaf container) of
/// `state_root`.
pub const STATE_ROOT_FIELD_INDEX: usize = 2;
/// Generalized index of `receipts_root`.
pub const RECEIPTS_ROOT_FIELD_INDEX: usize = 3;
/// Generalized index of `block_number`.
pub const BLOCK_NUMBER_FIELD_INDEX: usize = 6;

/// A Bellatrix execution-payload header, field order matching the beacon
/// chain's SSZ schema exactly — load-bearing for the two field indices
/// above and for [`ExecutionPayloadHeader::hash_tree_root`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: Hash,
    pub fee_recipient: [u8; 20],
    pub state_root: Hash,
    pub receipts_root: Hash,
    pub logs_bloom: Vec<u8>,
    pub prev_randao: Hash,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Vec<u8>,
    pub base_fee_per_gas: u64,
    pub block_hash: Hash,
    pub transactions_root: Hash,
}

impl ExecutionPayloadHeader {
    fn leaves(&self) -> Vec<Hash> {
        let mut fee_recipient_chunk = [0u8; 32];
        fee_recipient_chunk[..20].copy_from_slice(&self.fee_recipient);
        vec![
            self.parent_hash,
            fee_recipient_chunk,
            self.state_root,
            self.receipts_root,
            crate::ssz::hash_bytes_vector(&self.logs_bloom),
            self.prev_randao,
            uint_to_hash(self.block_number),
            uint_to_hash(self.gas_limit),
            uint_to_hash(self.gas_used),
            uint_to_hash(self.timestamp),
            crate::ssz::hash_uint8_list(&self.extra_data, 32),
            uint_to_hash(self.base_fee_per_gas),
            self.block_hash,
            self.transactions_root,
        ]
    }

    pub fn hash_tree_root(&self) -> Hash {
        MerkleTree::new_vector(self.leaves()).hash()
    }

    /// Inner proof from this container's root down to one of its own
    /// fields (`state_root` or `block_number`), to be appended after the
    /// outer state-tree proof reaching generalized index 24.
    pub fn make_field_proof(&self, field_index: usize) -> Vec<Hash> {
        MerkleTree::new_vector(self.leaves()).make_proof(field_index).path
    }
}

/// The complete "same-slot" execution-payload proof: the outer state-tree
/// branch to generalized index 24, `proof1` in the original.
pub fn prove_execution_payload(state_inputs: &BeaconStateInputs) -> Vec<Hash> {
    state::build_state_tree(state_inputs)
        .make_proof(state::LATEST_EXECUTION_PAYLOAD_HEADER_GINDEX)
        .path
}

/// Compose the full branch reaching from a beacon state's root down to
/// `header`'s `state_root` field: the state-tree proof to index 24,
/// followed by the header-container proof to `STATE_ROOT_FIELD_INDEX`.
pub fn prove_execution_state_root(
    state_inputs: &BeaconStateInputs,
    header: &ExecutionPayloadHeader,
) -> Vec<Hash> {
    let mut branch = prove_execution_payload(state_inputs);
    branch.extend(header.make_field_proof(STATE_ROOT_FIELD_INDEX));
    branch
}

/// As [`prove_execution_state_root`], but for `block_number`.
pub fn prove_execution_block_number(
    state_inputs: &BeaconStateInputs,
    header: &ExecutionPayloadHeader,
) -> Vec<Hash> {
    let mut branch = prove_execution_payload(state_inputs);
    branch.extend(header.make_field_proof(BLOCK_NUMBER_FIELD_INDEX));
    branch
}

/// As [`prove_execution_state_root`], but for `receipts_root` — the branch
/// `executeMessageFromLog` checks a message's receipt against, rather than
/// the full header `verifyExecutionPayload` takes.
pub fn prove_execution_receipts_root(
    state_inputs: &BeaconStateInputs,
    header: &ExecutionPayloadHeader,
) -> Vec<Hash> {
    let mut branch = prove_execution_payload(state_inputs);
    branch.extend(header.make_field_proof(RECEIPTS_ROOT_FIELD_INDEX));
    branch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: [1; 32],
            fee_recipient: [2; 20],
            state_root: [3; 32],
            receipts_root: [4; 32],
            logs_bloom: vec![0u8; 256],
            prev_randao: [5; 32],
            block_number: 42,
            gas_limit: 30_000_000,
            gas_used: 21_000,
            timestamp: 1_700_000_000,
            extra_data: vec![],
            base_fee_per_gas: 7,
            block_hash: [6; 32],
            transactions_root: [7; 32],
        }
    }

    #[test]
    fn field_proof_reconstructs_header_root() {
        let header = sample_header();
        let root = header.hash_tree_root();
        let tree = MerkleTree::new_vector(header.leaves());
        let proof = tree.make_proof(STATE_ROOT_FIELD_INDEX);
        assert_eq!(proof.reconstruct_root(header.state_root), root);
    }

    #[test]
    fn block_number_field_proof_reconstructs_header_root() {
        let header = sample_header();
        let root = header.hash_tree_root();
        let tree = MerkleTree::new_vector(header.leaves());
        let proof = tree.make_proof(BLOCK_NUMBER_FIELD_INDEX);
        assert_eq!(proof.reconstruct_root(uint_to_hash(header.block_number)), root);
    }

    #[test]
    fn receipts_root_field_proof_reconstructs_header_root() {
        let header = sample_header();
        let root = header.hash_tree_root();
        let tree = MerkleTree::new_vector(header.leaves());
        let proof = tree.make_proof(RECEIPTS_ROOT_FIELD_INDEX);
        assert_eq!(proof.reconstruct_root(header.receipts_root), root);
    }
}
