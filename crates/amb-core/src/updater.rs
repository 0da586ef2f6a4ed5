//! Light-client update assembly (component F).
//!
//! Ported from `LightClient.MakeUpdate`/`proveNewSyncCommittee`/
//! `syncDomainRoot`. This module stays synchronous: beacon-block and
//! beacon-state retrieval is abstracted behind the [`BlockSource`] trait so
//! that `amb-core` never depends on an HTTP client directly — `amb-rpc`
//! supplies the concrete (`reqwest`-backed) implementation and drives this
//! module's blocking calls from a `tokio::task::spawn_blocking`.

use crate::bls::{add_g1_points, pk_to_g1, sig_to_g2, verify_aggregate};
use crate::hash::{sha256_pair, uint_to_hash};
use crate::merkle::MerkleTree;
use crate::ssz::hash_bytes_vector;
use crate::state::{self, BeaconStateInputs};
use crate::types::{
    BeaconBlockHeader, GenesisConfig, SpecConfig, SyncCommittee, Update, DOMAIN_SYNC_COMMITTEE,
    MIN_SYNC_COMMITTEE_PARTICIPANTS,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("target slot {target} is behind current slot {current}")]
    TargetBehindCurrent { target: u64, current: u64 },
    #[error("target slot {target} is too far in the future, should be <= {max}")]
    TargetTooFarAhead { target: u64, max: u64 },
    #[error("no block found in slot window [{low}, {high}]")]
    NoCandidateBlock { low: u64, high: u64 },
    #[error("could not verify sync committee against state root")]
    SyncCommitteeProofFailed,
    #[error("aggregate signature verification failed: {0}")]
    SignatureVerificationFailed(#[from] crate::bls::BlsError),
    #[error("block source error: {0}")]
    Source(String),
}

/// A single sync-committee-signed beacon block, reduced to the fields the
/// updater actually needs (never the full body).
#[derive(Clone, Debug)]
pub struct CandidateBlock {
    pub header: BeaconBlockHeader,
    pub sync_committee_bits: Vec<bool>,
    pub sync_committee_signature: [u8; 96],
}

/// Abstracts beacon-node retrieval so `amb-core` never talks to the network
/// directly. All methods are blocking; errors are opaque strings, typed
/// further up the stack in `amb-rpc`.
pub trait BlockSource {
    fn block_by_slot(&self, slot: u64) -> Result<Option<CandidateBlock>, String>;
    fn block_by_root(&self, root: [u8; 32]) -> Result<CandidateBlock, String>;
    fn state_at_slot(&self, slot: u64) -> Result<BeaconStateInputs, String>;
    /// The raw 512-pubkey committee in effect at `reference_slot`: the
    /// state tree only ever stores each member's *hashed* pubkey, so
    /// verifying an aggregate signature needs this side channel.
    fn sync_committee(&self, reference_slot: u64, next: bool) -> Result<SyncCommittee, String>;
}

fn fetch_candidate(
    source: &dyn BlockSource,
    mut slot: u64,
    spec: &SpecConfig,
    with_finality: bool,
) -> Result<(u64, CandidateBlock), UpdaterError> {
    let low_bound = slot.saturating_sub(spec.slots_per_sync_committee_period());
    loop {
        tracing::debug!(slot, "fetching candidate block");
        match source.block_by_slot(slot).map_err(UpdaterError::Source)? {
            None => {
                tracing::debug!(slot, "no block at this slot, trying previous");
                if slot == 0 || slot <= low_bound {
                    return Err(UpdaterError::NoCandidateBlock { low: low_bound, high: slot });
                }
                slot -= 1;
            }
            Some(block) => {
                let participants = block.sync_committee_bits.iter().filter(|b| **b).count();
                let insufficient = participants < MIN_SYNC_COMMITTEE_PARTICIPANTS
                    || (with_finality && 3 * participants < 2 * spec.sync_committee_size);
                if insufficient {
                    tracing::debug!(slot, participants, "not enough sync committee signatures");
                    if slot == 0 || slot <= low_bound {
                        return Err(UpdaterError::NoCandidateBlock { low: low_bound, high: slot });
                    }
                    slot -= 1;
                    continue;
                }
                let pct = participants as f64 * 100.0 / spec.sync_committee_size as f64;
                tracing::info!(slot, participants, pct, "chosen header");
                return Ok((slot, block));
            }
        }
    }
}

/// The sync-committee signing domain: `DOMAIN_SYNC_COMMITTEE` followed by
/// the first 28 bytes of `sha256(fork_version_chunk || genesis_validators_root)`.
pub fn sync_domain_root(fork_version: [u8; 4], genesis: &GenesisConfig) -> [u8; 32] {
    let mut version_chunk = [0u8; 32];
    version_chunk[..4].copy_from_slice(&fork_version);
    let fork_data_root = sha256_pair(&version_chunk, &genesis.genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&DOMAIN_SYNC_COMMITTEE);
    domain[4..32].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// Reverse the byte order within each 32-byte word of a sync-committee
/// participation bit list, matching the on-chain contract's expected
/// bit-endianness.
fn reverse_bits_per_word(bits: &[bool], sync_committee_size: usize) -> Vec<[u8; 32]> {
    let mut bytes = vec![0u8; sync_committee_size / 8];
    for (i, &b) in bits.iter().enumerate() {
        if b {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    let words = sync_committee_size / 256;
    let mut out = Vec::with_capacity(words);
    for w in 0..words {
        let mut word = [0u8; 32];
        word.copy_from_slice(&bytes[w * 32..w * 32 + 32]);
        for k in 0..16 {
            word.swap(k, 31 - k);
        }
        out.push(word);
    }
    out
}

/// Split a committee into participating / non-participating public keys
/// according to `bits`, in committee order.
pub fn split_participating_committee(
    committee: &SyncCommittee,
    bits: &[bool],
) -> (Vec<[u8; 48]>, Vec<usize>) {
    let mut present = Vec::new();
    let mut missing = Vec::new();
    for (i, key) in committee.public_keys.iter().enumerate() {
        if bits.get(i).copied().unwrap_or(false) {
            present.push(key.0);
        } else {
            missing.push(i);
        }
    }
    (present, missing)
}

/// Aggregate every participating public key into one `G1Point`, and build
/// a multi-proof over the non-participating members' hashed pubkeys so the
/// target chain can reconstruct — and therefore check — the aggregate
/// public key without ever storing the full committee on-chain.
struct SignerSet {
    aggregated: crate::bls::G1Point,
    missing_pubkeys: Vec<crate::bls::G1Point>,
    missing_decommitments: Vec<[u8; 32]>,
}

fn assemble_signers(committee: &SyncCommittee, bits: &[bool]) -> Result<SignerSet, UpdaterError> {
    let (present, missing) = split_participating_committee(committee, bits);

    let mut aggregated: Option<crate::bls::G1Point> = None;
    for raw in &present {
        aggregated = Some(add_g1_points(aggregated.as_ref(), raw)?);
    }
    let aggregated = aggregated.ok_or(UpdaterError::SyncCommitteeProofFailed)?;

    let hashed_pubkeys: Vec<[u8; 32]> =
        committee.public_keys.iter().map(|pk| hash_bytes_vector(&pk.0)).collect();
    let tree = MerkleTree::new_vector(hashed_pubkeys);
    let multi_proof = tree.make_multi_proof(&missing);

    // `missing` is ascending (the committee sweep runs low to high); the
    // multi-proof and the target contract both work in descending index
    // order, so the participant list sent on-chain has to be reversed to
    // line up with `missing_decommitments`.
    let missing_pubkeys = missing
        .iter()
        .rev()
        .map(|&i| pk_to_g1(&committee.public_keys[i].0))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SignerSet {
        aggregated,
        missing_pubkeys,
        missing_decommitments: multi_proof.decommitments,
    })
}

/// Assemble a light-client update proving the sync committee's signature
/// over `curSlot`'s header onto a newly attested header. Returns `Ok(None)`
/// when there is nothing newer to report — never an error, matching
/// `MakeUpdate`'s `(nil, nil)` sentinel.
#[allow(clippy::too_many_arguments)]
pub fn make_update(
    source: &dyn BlockSource,
    spec: &SpecConfig,
    genesis: &GenesisConfig,
    bellatrix_fork_version: [u8; 4],
    with_finality: bool,
    cur_slot: u64,
    target_slot: u64,
    now_unix: u64,
) -> Result<Option<Update>, UpdaterError> {
    let slots_per_period = spec.slots_per_sync_committee_period();
    let cur_period_start = cur_slot - cur_slot % slots_per_period;
    let next_period_end = cur_period_start + 2 * slots_per_period - 1;

    let clock_slot = (now_unix.saturating_sub(genesis.genesis_time)) / spec.seconds_per_slot;
    let mut slot = next_period_end.min(clock_slot);

    if target_slot > 0 {
        if target_slot < cur_slot {
            return Err(UpdaterError::TargetBehindCurrent { target: target_slot, current: cur_slot });
        }
        if target_slot > next_period_end {
            return Err(UpdaterError::TargetTooFarAhead { target: target_slot, max: next_period_end });
        }
        slot = target_slot;
    }

    let (signature_slot, head) = fetch_candidate(source, slot, spec, with_finality)?;
    let attested_root = head.header.parent_root;
    tracing::info!(?attested_root, "fetching attested block");
    let attested_block = source.block_by_root(attested_root).map_err(UpdaterError::Source)?;
    let attested_header = attested_block.header;

    let cur_block = source
        .block_by_slot(cur_slot)
        .map_err(UpdaterError::Source)?
        .ok_or_else(|| UpdaterError::Source(format!("current slot {cur_slot} has no block")))?;

    tracing::info!(cur_slot, signature_slot, "proving sync committee");
    let current_period = cur_slot / slots_per_period;
    let candidate_period = signature_slot / slots_per_period;
    let is_next = current_period != candidate_period;

    let cur_state = source.state_at_slot(cur_slot).map_err(UpdaterError::Source)?;
    let committee_proof = state::prove_sync_committee(&cur_state, cur_block.header.state_root, is_next)
        .ok_or(UpdaterError::SyncCommitteeProofFailed)?;

    let committee = source.sync_committee(cur_slot, is_next).map_err(UpdaterError::Source)?;
    let signers = assemble_signers(&committee, &head.sync_committee_bits)?;

    let domain_root = sync_domain_root(bellatrix_fork_version, genesis);
    let signing_root = sha256_pair(&attested_root, &domain_root);
    let present_raw: Vec<[u8; 48]> =
        split_participating_committee(&committee, &head.sync_committee_bits).0;
    verify_aggregate(&present_raw, &signing_root, &head.sync_committee_signature)?;

    let mut update = Update {
        fork_version: bellatrix_fork_version,
        signature_slot,
        attested_header: attested_header.clone(),
        finalized_header: attested_header,
        sync_committee: signers.missing_pubkeys,
        sync_committee_aggregated: signers.aggregated,
        sync_aggregate_signature: sig_to_g2(&head.sync_committee_signature)?,
        sync_aggregate_bit_list: reverse_bits_per_word(&head.sync_committee_bits, spec.sync_committee_size),
        sync_committee_branch: committee_proof.path,
        finality_branch: Vec::new(),
        sync_committee_root_decommitments: signers.missing_decommitments,
    };

    if with_finality {
        tracing::info!(slot = update.attested_header.slot, "fetching finality beacon state");
        let attested_state = source.state_at_slot(update.attested_header.slot).map_err(UpdaterError::Source)?;
        let reconstructed = crate::state::build_state_tree(&attested_state).hash();
        if reconstructed != update.attested_header.state_root {
            panic!(
                "failed to reconstruct given state root, {:x?} != {:x?}",
                reconstructed, update.attested_header.state_root
            );
        }
        let finalized_root = attested_state.finalized_checkpoint.root;
        let finalized_block = source.block_by_root(finalized_root).map_err(UpdaterError::Source)?;
        update.finalized_header = finalized_block.header;

        let epoch_chunk = uint_to_hash(attested_state.finalized_checkpoint.epoch);
        let proof = crate::state::build_state_tree(&attested_state)
            .make_proof(crate::state::FINALIZED_CHECKPOINT_GINDEX);
        update.finality_branch = std::iter::once(epoch_chunk).chain(proof.path).collect();

        if update.finalized_header.slot <= cur_slot {
            return Ok(None);
        }
    } else if update.attested_header.slot <= cur_slot {
        return Ok(None);
    }

    Ok(Some(update))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_domain_root_is_deterministic() {
        let genesis = GenesisConfig { genesis_time: 0, genesis_validators_root: [1u8; 32] };
        let a = sync_domain_root([2, 0, 0, 0], &genesis);
        let b = sync_domain_root([2, 0, 0, 0], &genesis);
        assert_eq!(a, b);
        assert_eq!(&a[..4], &DOMAIN_SYNC_COMMITTEE);
    }

    #[test]
    fn sync_domain_root_changes_with_fork_version() {
        let genesis = GenesisConfig { genesis_time: 0, genesis_validators_root: [1u8; 32] };
        let a = sync_domain_root([2, 0, 0, 0], &genesis);
        let b = sync_domain_root([3, 0, 0, 0], &genesis);
        assert_ne!(a, b);
    }

    #[test]
    fn split_participating_committee_partitions_correctly() {
        let committee = SyncCommittee {
            public_keys: (0..4).map(|i| crate::types::BlsPublicKey([i as u8; 48])).collect(),
            aggregate_key: crate::types::BlsPublicKey([0; 48]),
        };
        let bits = vec![true, false, true, false];
        let (present, missing) = split_participating_committee(&committee, &bits);
        assert_eq!(present.len(), 2);
        assert_eq!(missing, vec![1, 3]);
    }

    #[test]
    fn reverse_bits_per_word_handles_512_committee() {
        let mut bits = vec![false; 512];
        bits[0] = true;
        bits[300] = true;
        let words = reverse_bits_per_word(&bits, 512);
        assert_eq!(words.len(), 2);
    }
}
