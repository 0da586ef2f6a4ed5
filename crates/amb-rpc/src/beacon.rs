//! Beacon-node REST client (`/eth/v1`, `/eth/v2`), matching
//! `oracle/client/client.go`'s `Eth2Client` endpoint set and error
//! semantics (`404`/`400` both collapse to [`RpcError::NotFound`]).
//!
//! Unlike the Go original, responses here are decoded as JSON rather than
//! SSZ — `debug/beacon/states/{id}` and `beacon/blocks/{id}` both accept an
//! `Accept: application/json` beacon-API content negotiation, trading some
//! payload size for not needing an SSZ decoder in this crate.

use crate::error::RpcError;
use crate::types::*;
use amb_core::merkle::Hash;
use amb_core::navigator::StateSource;
use amb_core::payload::ExecutionPayloadHeader;
use amb_core::state::{BeaconStateInputs, Checkpoint, Eth1Data, Fork, SyncCommitteeRoots};
use amb_core::types::{BeaconBlockHeader, BlsPublicKey, GenesisConfig, SpecConfig, SyncCommittee};
use amb_core::updater::{BlockSource, CandidateBlock};
use std::time::Duration;

pub struct BeaconClient {
    base_url: String,
    http: reqwest::Client,
}

impl BeaconClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .expect("reqwest client builds");
        Self { base_url: base_url.into(), http }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, RpcError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.http.get(&url).send().await?;
        match res.status().as_u16() {
            200 => res.json::<T>().await.map_err(|e| RpcError::decode(e.to_string())),
            404 | 400 => Err(RpcError::NotFound),
            code => Err(RpcError::BadStatus(code)),
        }
    }

    pub async fn get_spec(&self) -> Result<SpecConfig, RpcError> {
        let env: Envelope<SpecData> = self.get_json("/eth/v1/config/spec").await?;
        let d = env.data;
        Ok(SpecConfig {
            seconds_per_slot: d.seconds_per_slot,
            slots_per_epoch: d.slots_per_epoch,
            altair_fork_epoch: d.altair_fork_epoch,
            altair_fork_version: crate::hexutil::decode_fork_version(&d.altair_fork_version)?,
            bellatrix_fork_epoch: d.bellatrix_fork_epoch,
            bellatrix_fork_version: crate::hexutil::decode_fork_version(&d.bellatrix_fork_version)?,
            epochs_per_sync_committee_period: d.epochs_per_sync_committee_period,
            sync_committee_size: d.sync_committee_size,
            validator_registry_limit: d.validator_registry_limit,
            historical_roots_limit: d.historical_roots_limit,
            epochs_per_eth1_voting_period: d.epochs_per_eth1_voting_period,
            slots_per_historical_root: d.slots_per_historical_root,
        })
    }

    pub async fn get_genesis(&self) -> Result<GenesisConfig, RpcError> {
        let env: Envelope<GenesisData> = self.get_json("/eth/v1/beacon/genesis").await?;
        Ok(GenesisConfig {
            genesis_time: env.data.genesis_time,
            genesis_validators_root: crate::hexutil::decode_hash(&env.data.genesis_validators_root)?,
        })
    }

    pub async fn get_block_by_slot(&self, slot: u64) -> Result<Option<CandidateBlock>, RpcError> {
        let path = format!("/eth/v2/beacon/blocks/{slot}");
        match self.get_json::<BeaconBlockEnvelope>(&path).await {
            Ok(env) => Ok(Some(candidate_from_message(&env.data.message)?)),
            Err(RpcError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn get_block_by_root(&self, root: Hash) -> Result<CandidateBlock, RpcError> {
        let path = format!("/eth/v2/beacon/blocks/{}", crate::hexutil::encode_bytes(&root));
        let env: BeaconBlockEnvelope = self.get_json(&path).await?;
        candidate_from_message(&env.data.message)
    }

    pub async fn get_state(&self, slot: u64) -> Result<BeaconStateInputs, RpcError> {
        let path = format!("/eth/v2/debug/beacon/states/{slot}");
        let env: BeaconStateEnvelope = self.get_json(&path).await?;
        state_inputs_from_json(&env.data)
    }

    pub async fn get_execution_header(&self, slot: u64) -> Result<ExecutionPayloadHeader, RpcError> {
        let path = format!("/eth/v2/beacon/blocks/{slot}");
        let env: BeaconBlockEnvelope = self.get_json(&path).await?;
        execution_header_from_json(&env.data.message.body.execution_payload)
    }
}

fn candidate_from_message(msg: &BeaconBlockMessage) -> Result<CandidateBlock, RpcError> {
    let header = BeaconBlockHeader {
        slot: msg.slot,
        proposer_index: msg.proposer_index,
        parent_root: crate::hexutil::decode_hash(&msg.parent_root)?,
        state_root: crate::hexutil::decode_hash(&msg.state_root)?,
        body_root: [0; 32],
    };
    let sync_committee_bits =
        crate::hexutil::decode_bitlist(&msg.body.sync_aggregate.sync_committee_bits, 512)?;
    let sync_committee_signature =
        crate::hexutil::decode_96(&msg.body.sync_aggregate.sync_committee_signature)?;
    Ok(CandidateBlock { header, sync_committee_bits, sync_committee_signature })
}

fn execution_header_from_json(p: &ExecutionPayloadJson) -> Result<ExecutionPayloadHeader, RpcError> {
    Ok(ExecutionPayloadHeader {
        parent_hash: crate::hexutil::decode_hash(&p.parent_hash)?,
        fee_recipient: crate::hexutil::decode_address(&p.fee_recipient)?,
        state_root: crate::hexutil::decode_hash(&p.state_root)?,
        receipts_root: crate::hexutil::decode_hash(&p.receipts_root)?,
        logs_bloom: crate::hexutil::decode_bytes(&p.logs_bloom)?,
        prev_randao: crate::hexutil::decode_hash(&p.prev_randao)?,
        block_number: p.block_number,
        gas_limit: p.gas_limit,
        gas_used: p.gas_used,
        timestamp: p.timestamp,
        extra_data: crate::hexutil::decode_bytes(&p.extra_data)?,
        base_fee_per_gas: p.base_fee_per_gas,
        block_hash: crate::hexutil::decode_hash(&p.block_hash)?,
        transactions_root: [0; 32],
    })
}

fn state_inputs_from_json(d: &BeaconStateData) -> Result<BeaconStateInputs, RpcError> {
    let roots = |v: &[String]| -> Result<Vec<Hash>, RpcError> {
        v.iter().map(|s| crate::hexutil::decode_hash(s)).collect()
    };
    let nums = |v: &[String]| -> Result<Vec<u64>, RpcError> {
        v.iter().map(|s| s.parse().map_err(|_| RpcError::decode("bad u64"))).collect()
    };
    let checkpoint = |c: &CheckpointJson| -> Result<Checkpoint, RpcError> {
        Ok(Checkpoint {
            epoch: c.epoch.parse().map_err(|_| RpcError::decode("bad epoch"))?,
            root: crate::hexutil::decode_hash(&c.root)?,
        })
    };
    let committee_roots = |c: &SyncCommitteeJson| -> Result<SyncCommitteeRoots, RpcError> {
        let pubkey_roots = c
            .pubkeys
            .iter()
            .map(|pk| {
                let bytes = crate::hexutil::decode_48(pk)?;
                Ok(amb_core::ssz::hash_bytes_vector(&bytes))
            })
            .collect::<Result<Vec<_>, RpcError>>()?;
        let aggregate_bytes = crate::hexutil::decode_48(&c.aggregate_pubkey)?;
        Ok(SyncCommitteeRoots {
            pubkey_roots,
            aggregate_pubkey_root: amb_core::ssz::hash_bytes_vector(&aggregate_bytes),
        })
    };

    Ok(BeaconStateInputs {
        genesis_time: d.genesis_time.parse().map_err(|_| RpcError::decode("bad genesis_time"))?,
        genesis_validators_root: crate::hexutil::decode_hash(&d.genesis_validators_root)?,
        slot: d.slot.parse().map_err(|_| RpcError::decode("bad slot"))?,
        fork: Fork {
            previous_version: crate::hexutil::decode_fork_version(&d.fork.previous_version)?,
            current_version: crate::hexutil::decode_fork_version(&d.fork.current_version)?,
            epoch: d.fork.epoch.parse().map_err(|_| RpcError::decode("bad fork epoch"))?,
        },
        latest_block_header: BeaconBlockHeader {
            slot: d.latest_block_header.slot.parse().map_err(|_| RpcError::decode("bad slot"))?,
            proposer_index: d
                .latest_block_header
                .proposer_index
                .parse()
                .map_err(|_| RpcError::decode("bad proposer_index"))?,
            parent_root: crate::hexutil::decode_hash(&d.latest_block_header.parent_root)?,
            state_root: crate::hexutil::decode_hash(&d.latest_block_header.state_root)?,
            body_root: crate::hexutil::decode_hash(&d.latest_block_header.body_root)?,
        },
        block_roots: roots(&d.block_roots)?,
        state_roots: roots(&d.state_roots)?,
        historical_roots: roots(&d.historical_roots)?,
        historical_roots_limit: 1 << 24,
        eth1_data: Eth1Data {
            deposit_root: crate::hexutil::decode_hash(&d.eth1_data.deposit_root)?,
            deposit_count: d
                .eth1_data
                .deposit_count
                .parse()
                .map_err(|_| RpcError::decode("bad deposit_count"))?,
            block_hash: crate::hexutil::decode_hash(&d.eth1_data.block_hash)?,
        },
        eth1_data_votes: d
            .eth1_data_votes
            .iter()
            .map(|v| {
                Ok(amb_core::state::Eth1Data {
                    deposit_root: crate::hexutil::decode_hash(&v.deposit_root)?,
                    deposit_count: v
                        .deposit_count
                        .parse()
                        .map_err(|_| RpcError::decode("bad deposit_count"))?,
                    block_hash: crate::hexutil::decode_hash(&v.block_hash)?,
                }
                .hash_tree_root())
            })
            .collect::<Result<Vec<_>, RpcError>>()?,
        eth1_data_votes_limit: 64 * 32,
        eth1_deposit_index: d
            .eth1_deposit_index
            .parse()
            .map_err(|_| RpcError::decode("bad eth1_deposit_index"))?,
        validators: Vec::new(),
        validator_registry_limit: 1 << 40,
        balances: nums(&d.balances)?,
        randao_mixes: roots(&d.randao_mixes)?,
        slashings: nums(&d.slashings)?,
        previous_epoch_participation: crate::hexutil::decode_bytes(&d.previous_epoch_participation)?,
        current_epoch_participation: crate::hexutil::decode_bytes(&d.current_epoch_participation)?,
        justification_bits: crate::hexutil::decode_bytes(&d.justification_bits)?
            .first()
            .copied()
            .unwrap_or(0),
        previous_justified_checkpoint: checkpoint(&d.previous_justified_checkpoint)?,
        current_justified_checkpoint: checkpoint(&d.current_justified_checkpoint)?,
        finalized_checkpoint: checkpoint(&d.finalized_checkpoint)?,
        inactivity_scores: nums(&d.inactivity_scores)?,
        current_sync_committee: committee_roots(&d.current_sync_committee)?,
        next_sync_committee: committee_roots(&d.next_sync_committee)?,
        latest_execution_payload_header: execution_header_from_json(&ExecutionPayloadJson {
            parent_hash: d.latest_execution_payload_header.parent_hash.clone(),
            fee_recipient: d.latest_execution_payload_header.fee_recipient.clone(),
            state_root: d.latest_execution_payload_header.state_root.clone(),
            receipts_root: d.latest_execution_payload_header.receipts_root.clone(),
            logs_bloom: d.latest_execution_payload_header.logs_bloom.clone(),
            prev_randao: d.latest_execution_payload_header.prev_randao.clone(),
            block_number: d
                .latest_execution_payload_header
                .block_number
                .parse()
                .map_err(|_| RpcError::decode("bad block_number"))?,
            gas_limit: d
                .latest_execution_payload_header
                .gas_limit
                .parse()
                .map_err(|_| RpcError::decode("bad gas_limit"))?,
            gas_used: d
                .latest_execution_payload_header
                .gas_used
                .parse()
                .map_err(|_| RpcError::decode("bad gas_used"))?,
            timestamp: d
                .latest_execution_payload_header
                .timestamp
                .parse()
                .map_err(|_| RpcError::decode("bad timestamp"))?,
            extra_data: d.latest_execution_payload_header.extra_data.clone(),
            base_fee_per_gas: d
                .latest_execution_payload_header
                .base_fee_per_gas
                .parse()
                .map_err(|_| RpcError::decode("bad base_fee_per_gas"))?,
            block_hash: d.latest_execution_payload_header.block_hash.clone(),
            transactions_root: Some(d.latest_execution_payload_header.transactions_root.clone()),
        })?
        .hash_tree_root(),
    })
}

fn sync_committee_from_json(c: &SyncCommitteeJson) -> Result<SyncCommittee, RpcError> {
    let public_keys = c
        .pubkeys
        .iter()
        .map(|pk| Ok(BlsPublicKey(crate::hexutil::decode_48(pk)?)))
        .collect::<Result<Vec<_>, RpcError>>()?;
    Ok(SyncCommittee { public_keys, aggregate_key: BlsPublicKey(crate::hexutil::decode_48(&c.aggregate_pubkey)?) })
}

/// Blocking adapter bridging `amb_core`'s synchronous `BlockSource`/
/// `StateSource` traits to this crate's `async` [`BeaconClient`]. The
/// current Tokio runtime handle drives each call with `block_on`, matching
/// the "bridge via `spawn_blocking`"-equivalent boundary the core crate
/// documents: since `BlockSource` itself is invoked from inside
/// `amb-driver`'s async loop via `spawn_blocking`, blocking here is safe.
pub struct BlockingBeaconSource {
    pub client: BeaconClient,
    pub runtime: tokio::runtime::Handle,
}

impl BlockingBeaconSource {
    pub fn new(client: BeaconClient, runtime: tokio::runtime::Handle) -> Self {
        Self { client, runtime }
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        tokio::task::block_in_place(|| self.runtime.block_on(fut))
    }
}

impl BlockSource for BlockingBeaconSource {
    fn block_by_slot(&self, slot: u64) -> Result<Option<CandidateBlock>, String> {
        self.block_on(self.client.get_block_by_slot(slot)).map_err(|e| e.to_string())
    }

    fn block_by_root(&self, root: Hash) -> Result<CandidateBlock, String> {
        self.block_on(self.client.get_block_by_root(root)).map_err(|e| e.to_string())
    }

    fn state_at_slot(&self, slot: u64) -> Result<BeaconStateInputs, String> {
        self.block_on(self.client.get_state(slot)).map_err(|e| e.to_string())
    }

    fn sync_committee(&self, reference_slot: u64, next: bool) -> Result<SyncCommittee, String> {
        self.block_on(async {
            let path = format!("/eth/v2/debug/beacon/states/{reference_slot}");
            let env: BeaconStateEnvelope = self.client.get_json(&path).await?;
            let json = if next { &env.data.next_sync_committee } else { &env.data.current_sync_committee };
            sync_committee_from_json(json)
        })
        .map_err(|e| e.to_string())
    }
}

impl StateSource for BlockingBeaconSource {
    fn state_at_slot(&self, slot: u64) -> Result<BeaconStateInputs, String> {
        self.block_on(self.client.get_state(slot)).map_err(|e| e.to_string())
    }

    fn execution_header_at_slot(&self, slot: u64) -> Result<ExecutionPayloadHeader, String> {
        self.block_on(self.client.get_execution_header(slot)).map_err(|e| e.to_string())
    }

    fn block_number_at_slot(&self, slot: u64) -> Result<Option<u64>, String> {
        match self.block_on(self.client.get_execution_header(slot)) {
            Ok(header) => Ok(Some(header.block_number)),
            Err(RpcError::NotFound) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }
}
