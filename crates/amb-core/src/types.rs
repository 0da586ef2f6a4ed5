//! Shared wire and domain types: beacon headers, sync-committee updates,
//! and the chain-spec constants that size every tree in [`crate::state`].
//!
//! Field layout mirrors the reference oracle's `lightclient.Update` and
//! `config.SpecConfig` — these are the exact structures ABI-encoded for the
//! target-chain light-client contract and decoded from the beacon node's
//! `/eth/v1/config/spec` endpoint, respectively.

use crate::bls::{G1Point, G2Point};
use crate::merkle::Hash;
use serde::{Deserialize, Serialize};

/// Number of validators in a sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Compressed BLS12-381 public key length.
pub const BLS_PUBKEY_LEN: usize = 48;

/// Compressed BLS12-381 signature length.
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Minimum number of participating sync-committee members an update's
/// aggregate signature must be backed by, per the light-client sync
/// protocol (`>= SYNC_COMMITTEE_SIZE * 2 / 3` would be the safe finality
/// bound; the reference oracle additionally floors this at a constant).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = 10;

/// The `DOMAIN_SYNC_COMMITTEE` domain type, prefixed onto the fork data
/// root when computing the sync committee's signing domain.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// A BLS12-381 public key (48-byte compressed G1 point).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)?;
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err(serde::de::Error::custom("invalid BLS public key length"));
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(&bytes);
        Ok(BlsPublicKey(arr))
    }
}

/// A BLS12-381 signature (96-byte compressed G2 point).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)?;
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err(serde::de::Error::custom("invalid BLS signature length"));
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(&bytes);
        Ok(BlsSignature(arr))
    }
}

/// A beacon block header — the minimal subset of a beacon block needed to
/// navigate and verify the chain; bodies are never fetched or stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: Hash,
    pub state_root: Hash,
    pub body_root: Hash,
}

/// A beacon-chain sync committee: 512 public keys plus their aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncCommittee {
    pub public_keys: Vec<BlsPublicKey>,
    pub aggregate_key: BlsPublicKey,
}

/// The light-client update payload assembled for the target chain, ABI
/// encoded and submitted to the on-chain light client contract's `step`
/// entrypoint. Execution-payload proofs (`verifyExecutionPayload`,
/// `executeMessageFromLog`) are a separate call with their own payload —
/// see [`crate::navigator::ExecutionPayloadProof`] — not a part of `step`.
#[derive(Clone, Debug)]
pub struct Update {
    pub fork_version: [u8; 4],
    /// The slot of the signed (not attested) header — the block whose sync
    /// aggregate this update's signature was taken from.
    pub signature_slot: u64,
    pub attested_header: BeaconBlockHeader,
    pub finalized_header: BeaconBlockHeader,
    pub sync_committee: Vec<G1Point>,
    pub sync_committee_aggregated: G1Point,
    pub sync_aggregate_signature: G2Point,
    pub sync_aggregate_bit_list: Vec<Hash>,
    pub sync_committee_branch: Vec<Hash>,
    pub finality_branch: Vec<Hash>,
    /// Decommitments for the sparse multiproof reconstructing the
    /// sync-committee root from [`Update::sync_committee`]'s missed
    /// participants, kept separate from `sync_committee_branch` (the
    /// committee-root-to-state-root branch) per spec.
    pub sync_committee_root_decommitments: Vec<Hash>,
}

/// Chain-spec constants, sourced from the beacon node's `/eth/v1/config/spec`
/// endpoint or a local override. Every field here sizes a tree in
/// [`crate::state`] or bounds a slot computation in [`crate::updater`] /
/// [`crate::navigator`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpecConfig {
    pub seconds_per_slot: u64,
    pub slots_per_epoch: u64,
    pub altair_fork_epoch: u64,
    pub altair_fork_version: [u8; 4],
    pub bellatrix_fork_epoch: u64,
    pub bellatrix_fork_version: [u8; 4],
    pub epochs_per_sync_committee_period: u64,
    pub sync_committee_size: usize,
    pub validator_registry_limit: usize,
    pub historical_roots_limit: usize,
    pub epochs_per_eth1_voting_period: u64,
    pub slots_per_historical_root: u64,
}

impl SpecConfig {
    pub fn slots_per_sync_committee_period(&self) -> u64 {
        self.epochs_per_sync_committee_period * self.slots_per_epoch
    }
}

/// Genesis parameters anchoring slot-to-wallclock conversion and the
/// sync-committee signing domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub genesis_time: u64,
    pub genesis_validators_root: Hash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bls_pubkey_round_trips_through_hex() {
        let key = BlsPublicKey([7u8; BLS_PUBKEY_LEN]);
        let json = serde_json::to_string(&key).unwrap();
        let decoded: BlsPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn slots_per_sync_committee_period_multiplies_correctly() {
        let spec = SpecConfig {
            seconds_per_slot: 12,
            slots_per_epoch: 32,
            altair_fork_epoch: 0,
            altair_fork_version: [1, 0, 0, 0],
            bellatrix_fork_epoch: 0,
            bellatrix_fork_version: [2, 0, 0, 0],
            epochs_per_sync_committee_period: 256,
            sync_committee_size: 512,
            validator_registry_limit: 1 << 40,
            historical_roots_limit: 16_777_216,
            epochs_per_eth1_voting_period: 64,
            slots_per_historical_root: 8192,
        };
        assert_eq!(spec.slots_per_sync_committee_period(), 8192);
    }
}
