//! Beacon-state tree reconstruction (component E).
//!
//! The beacon state is never deserialized wholesale into a materialized
//! Merkle tree; each of its 25 top-level fields is hashed to its own root
//! independently (packed-vector for numeric fields, list/vector-of-roots for
//! composite ones), and those 25 roots become the leaves of one
//! [`MerkleTree::new_vector`]. Generalized index `N` is then just leaf index
//! `N` of that outer tree (`limit = 32`, the next power of two `>= 25`).
//!
//! Field order is load-bearing: it must match `BeaconStateBellatrix` exactly
//! or every generalized index below points at the wrong field.

use crate::hash::{sha256_pair, uint_to_hash};
use crate::merkle::{Hash, MerkleTree};
use crate::ssz::{
    hash_container_list, hash_roots_list, hash_roots_vector, hash_uint64_list, hash_uint64_vector,
    hash_uint8_list,
};
use crate::types::BeaconBlockHeader;

/// Generalized index of `finalized_checkpoint` within the state tree.
pub const FINALIZED_CHECKPOINT_GINDEX: usize = 20;
/// Generalized index of `current_sync_committee`.
pub const CURRENT_SYNC_COMMITTEE_GINDEX: usize = 22;
/// Generalized index of `next_sync_committee`.
pub const NEXT_SYNC_COMMITTEE_GINDEX: usize = 23;
/// Generalized index of `latest_execution_payload_header`.
pub const LATEST_EXECUTION_PAYLOAD_HEADER_GINDEX: usize = 24;

/// `Fork` container: two 4-byte versions plus the activation epoch.
#[derive(Clone, Debug)]
pub struct Fork {
    pub previous_version: [u8; 4],
    pub current_version: [u8; 4],
    pub epoch: u64,
}

impl Fork {
    pub fn hash_tree_root(&self) -> Hash {
        let mut prev = [0u8; 32];
        prev[..4].copy_from_slice(&self.previous_version);
        let mut curr = [0u8; 32];
        curr[..4].copy_from_slice(&self.current_version);
        MerkleTree::new_vector(vec![prev, curr, uint_to_hash(self.epoch)]).hash()
    }
}

/// `Checkpoint` container: epoch plus block root.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: Hash,
}

impl Checkpoint {
    pub fn hash_tree_root(&self) -> Hash {
        MerkleTree::new_vector(vec![uint_to_hash(self.epoch), self.root]).hash()
    }
}

/// `Eth1Data` container: deposit root, deposit count, block hash.
#[derive(Clone, Debug)]
pub struct Eth1Data {
    pub deposit_root: Hash,
    pub deposit_count: u64,
    pub block_hash: Hash,
}

impl Eth1Data {
    pub fn hash_tree_root(&self) -> Hash {
        MerkleTree::new_vector(vec![
            self.deposit_root,
            uint_to_hash(self.deposit_count),
            self.block_hash,
        ])
        .hash()
    }
}

/// `Validator` container: the eight validator-registry fields.
#[derive(Clone, Debug)]
pub struct Validator {
    pub pubkey_root: Hash,
    pub withdrawal_credentials: Hash,
    pub effective_balance: u64,
    pub slashed: bool,
    pub activation_eligibility_epoch: u64,
    pub activation_epoch: u64,
    pub exit_epoch: u64,
    pub withdrawable_epoch: u64,
}

impl Validator {
    pub fn hash_tree_root(&self) -> Hash {
        let mut slashed_chunk = [0u8; 32];
        slashed_chunk[0] = self.slashed as u8;
        MerkleTree::new_vector(vec![
            self.pubkey_root,
            self.withdrawal_credentials,
            uint_to_hash(self.effective_balance),
            slashed_chunk,
            uint_to_hash(self.activation_eligibility_epoch),
            uint_to_hash(self.activation_epoch),
            uint_to_hash(self.exit_epoch),
            uint_to_hash(self.withdrawable_epoch),
        ])
        .hash()
    }
}

/// `SyncCommittee` container as it sits in the state tree: the packed
/// vector of 512 pubkey roots plus the aggregate pubkey root.
#[derive(Clone, Debug)]
pub struct SyncCommitteeRoots {
    pub pubkey_roots: Vec<Hash>,
    pub aggregate_pubkey_root: Hash,
}

impl SyncCommitteeRoots {
    pub fn hash_tree_root(&self) -> Hash {
        let pubkeys_root = hash_roots_vector(&self.pubkey_roots);
        MerkleTree::new_vector(vec![pubkeys_root, self.aggregate_pubkey_root]).hash()
    }
}

/// `ExecutionPayloadHeader` reduced to its hash-tree-root, computed
/// upstream by [`crate::payload`] — the state tree only ever needs the
/// single root, never the header's fields.
pub type ExecutionPayloadHeaderRoot = Hash;

/// The 25 top-level fields of a Bellatrix beacon state, each supplied as a
/// precomputed root (or raw data the caller hasn't rooted yet).
///
/// Owned rather than borrowed: implementations of `updater::BlockSource`
/// assemble this from a freshly deserialized beacon-API response, so there
/// is no longer-lived buffer for a borrow to point into.
#[derive(Clone, Debug)]
pub struct BeaconStateInputs {
    pub genesis_time: u64,
    pub genesis_validators_root: Hash,
    pub slot: u64,
    pub fork: Fork,
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: Vec<Hash>,
    pub state_roots: Vec<Hash>,
    pub historical_roots: Vec<Hash>,
    pub historical_roots_limit: usize,
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: Vec<Hash>,
    pub eth1_data_votes_limit: usize,
    pub eth1_deposit_index: u64,
    pub validators: Vec<Hash>,
    pub validator_registry_limit: usize,
    pub balances: Vec<u64>,
    pub randao_mixes: Vec<Hash>,
    pub slashings: Vec<u64>,
    pub previous_epoch_participation: Vec<u8>,
    pub current_epoch_participation: Vec<u8>,
    pub justification_bits: u8,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
    pub inactivity_scores: Vec<u64>,
    pub current_sync_committee: SyncCommitteeRoots,
    pub next_sync_committee: SyncCommitteeRoots,
    pub latest_execution_payload_header: ExecutionPayloadHeaderRoot,
}

/// `latest_block_header.hash_tree_root()`, computed with a zero `body_root`
/// placeholder per the SSZ spec's "signing root" convention for the header
/// stored *inside* the state it itself describes.
fn block_header_hash_tree_root(header: &BeaconBlockHeader) -> Hash {
    MerkleTree::new_vector(vec![
        uint_to_hash(header.slot),
        uint_to_hash(header.proposer_index),
        header.parent_root,
        header.state_root,
        header.body_root,
    ])
    .hash()
}

/// Reconstruct the full 32-leaf (25 populated, 7 zero-padded) beacon-state
/// tree. The caller reads [`MerkleTree::hash`] for the state root, or
/// [`MerkleTree::make_proof`]/[`MerkleTree::make_multi_proof`] at the
/// `*_GINDEX` constants above for any single-field proof.
pub fn build_state_tree(inputs: &BeaconStateInputs) -> MerkleTree {
    let justification_chunk = {
        let mut c = [0u8; 32];
        c[0] = inputs.justification_bits;
        c
    };

    let leaves = vec![
        uint_to_hash(inputs.genesis_time),
        inputs.genesis_validators_root,
        uint_to_hash(inputs.slot),
        inputs.fork.hash_tree_root(),
        block_header_hash_tree_root(&inputs.latest_block_header),
        hash_roots_vector(&inputs.block_roots),
        hash_roots_vector(&inputs.state_roots),
        hash_roots_list(&inputs.historical_roots, inputs.historical_roots_limit),
        inputs.eth1_data.hash_tree_root(),
        hash_container_list(&inputs.eth1_data_votes, inputs.eth1_data_votes_limit),
        uint_to_hash(inputs.eth1_deposit_index),
        hash_container_list(&inputs.validators, inputs.validator_registry_limit),
        hash_uint64_list(&inputs.balances, inputs.validator_registry_limit),
        hash_roots_vector(&inputs.randao_mixes),
        hash_uint64_vector(&inputs.slashings),
        hash_uint8_list(&inputs.previous_epoch_participation, inputs.validator_registry_limit),
        hash_uint8_list(&inputs.current_epoch_participation, inputs.validator_registry_limit),
        crate::ssz::hash_bytes_vector(&justification_chunk),
        inputs.previous_justified_checkpoint.hash_tree_root(),
        inputs.current_justified_checkpoint.hash_tree_root(),
        inputs.finalized_checkpoint.hash_tree_root(),
        hash_uint64_list(&inputs.inactivity_scores, inputs.validator_registry_limit),
        inputs.current_sync_committee.hash_tree_root(),
        inputs.next_sync_committee.hash_tree_root(),
        inputs.latest_execution_payload_header,
    ];

    MerkleTree::new_vector(leaves)
}

/// Verify that a `sync_committee` root matches the given state root under
/// generalized index `22` (current) or `23` (next), returning the
/// reconstructed path on success. Mirrors `proveNewSyncCommittee`.
pub fn prove_sync_committee(
    inputs: &BeaconStateInputs,
    state_root: Hash,
    next: bool,
) -> Option<crate::merkle::MerkleProof> {
    let tree = build_state_tree(inputs);
    let index = if next { NEXT_SYNC_COMMITTEE_GINDEX } else { CURRENT_SYNC_COMMITTEE_GINDEX };
    let committee_root = if next {
        inputs.next_sync_committee.hash_tree_root()
    } else {
        inputs.current_sync_committee.hash_tree_root()
    };
    let proof = tree.make_proof(index);
    if proof.reconstruct_root(committee_root) == state_root {
        Some(proof)
    } else {
        None
    }
}

/// Sha256-concatenate two already-rooted containers — used when a
/// container's field roots have been computed piecemeal rather than via
/// its own `hash_tree_root`.
pub fn pair(left: &Hash, right: &Hash) -> Hash {
    sha256_pair(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_inputs() -> BeaconStateInputs {
        let cp = Checkpoint { epoch: 0, root: [0; 32] };
        BeaconStateInputs {
            genesis_time: 0,
            genesis_validators_root: [0; 32],
            slot: 0,
            fork: Fork { previous_version: [0; 4], current_version: [1; 4], epoch: 0 },
            latest_block_header: BeaconBlockHeader {
                slot: 0,
                proposer_index: 0,
                parent_root: [0; 32],
                state_root: [0; 32],
                body_root: [0; 32],
            },
            block_roots: vec![],
            state_roots: vec![],
            historical_roots: vec![],
            historical_roots_limit: 16_777_216,
            eth1_data: Eth1Data { deposit_root: [0; 32], deposit_count: 0, block_hash: [0; 32] },
            eth1_data_votes: vec![],
            eth1_data_votes_limit: 2048,
            eth1_deposit_index: 0,
            validators: vec![],
            validator_registry_limit: 1 << 20,
            balances: vec![],
            randao_mixes: vec![],
            slashings: vec![],
            previous_epoch_participation: vec![],
            current_epoch_participation: vec![],
            justification_bits: 0,
            previous_justified_checkpoint: cp.clone(),
            current_justified_checkpoint: cp.clone(),
            finalized_checkpoint: cp,
            inactivity_scores: vec![],
            current_sync_committee: SyncCommitteeRoots {
                pubkey_roots: vec![[0; 32]; 512],
                aggregate_pubkey_root: [0; 32],
            },
            next_sync_committee: SyncCommitteeRoots {
                pubkey_roots: vec![[0; 32]; 512],
                aggregate_pubkey_root: [0; 32],
            },
            latest_execution_payload_header: [0; 32],
        }
    }

    #[test]
    fn state_tree_has_25_leaves_limit_32() {
        let inputs = empty_inputs();
        let tree = build_state_tree(&inputs);
        assert_eq!(tree.len(), 25);
        // limit is the next power of two at/above 25
        let proof = tree.make_proof(24);
        assert_eq!(proof.gen_index, 32 + 24);
    }

    #[test]
    fn sync_committee_proof_matches_manual_gindex() {
        let inputs = empty_inputs();
        let state_root = build_state_tree(&inputs).hash();
        let proof = prove_sync_committee(&inputs, state_root, false);
        assert!(proof.is_some());
        assert_eq!(proof.unwrap().gen_index, 32 + CURRENT_SYNC_COMMITTEE_GINDEX);
    }
}
