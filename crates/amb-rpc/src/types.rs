//! JSON wire types for the beacon REST API and execution JSON-RPC API.
//!
//! Field names and the `*_STR` numeric-as-string convention mirror
//! `oracle/client/model.go`'s `ModelSpecData`/`ModelGenesisData` exactly, so
//! that the JSON decodes without any manual remapping.

use serde::{Deserialize, Serialize};

fn de_u64_str<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(u64),
    }
    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom),
        StrOrNum::Num(n) => Ok(n),
    }
}

fn de_usize_str<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    de_u64_str(deserializer).map(|v| v as usize)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenesisData {
    #[serde(deserialize_with = "de_u64_str")]
    pub genesis_time: u64,
    pub genesis_validators_root: String,
}

/// Mirrors `ModelSpecData`; `slots_per_historical_root` is absent from
/// `config.go`'s YAML-loaded `SpecConfig` but present here, reconciled in
/// `amb_core::types::SpecConfig` by carrying both sources.
#[derive(Debug, Clone, Deserialize)]
pub struct SpecData {
    #[serde(rename = "SECONDS_PER_SLOT", deserialize_with = "de_u64_str")]
    pub seconds_per_slot: u64,
    #[serde(rename = "SLOTS_PER_EPOCH", deserialize_with = "de_u64_str")]
    pub slots_per_epoch: u64,
    #[serde(rename = "ALTAIR_FORK_EPOCH", deserialize_with = "de_u64_str")]
    pub altair_fork_epoch: u64,
    #[serde(rename = "ALTAIR_FORK_VERSION")]
    pub altair_fork_version: String,
    #[serde(rename = "BELLATRIX_FORK_EPOCH", deserialize_with = "de_u64_str")]
    pub bellatrix_fork_epoch: u64,
    #[serde(rename = "BELLATRIX_FORK_VERSION")]
    pub bellatrix_fork_version: String,
    #[serde(rename = "EPOCHS_PER_SYNC_COMMITTEE_PERIOD", deserialize_with = "de_u64_str")]
    pub epochs_per_sync_committee_period: u64,
    #[serde(rename = "SYNC_COMMITTEE_SIZE", deserialize_with = "de_usize_str")]
    pub sync_committee_size: usize,
    #[serde(rename = "VALIDATOR_REGISTRY_LIMIT", deserialize_with = "de_usize_str")]
    pub validator_registry_limit: usize,
    #[serde(rename = "HISTORICAL_ROOTS_LIMIT", deserialize_with = "de_usize_str")]
    pub historical_roots_limit: usize,
    #[serde(rename = "EPOCHS_PER_ETH1_VOTING_PERIOD", deserialize_with = "de_u64_str")]
    pub epochs_per_eth1_voting_period: u64,
    #[serde(rename = "SLOTS_PER_HISTORICAL_ROOT", deserialize_with = "de_u64_str")]
    pub slots_per_historical_root: u64,
}

/// Minimal SSZ-shaped beacon block body sufficient to recover
/// `sync_aggregate` and the header fields the navigator/updater need.
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconBlockEnvelope {
    pub version: Option<String>,
    pub data: SignedBeaconBlockData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedBeaconBlockData {
    pub message: BeaconBlockMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconBlockMessage {
    #[serde(deserialize_with = "de_u64_str")]
    pub slot: u64,
    #[serde(deserialize_with = "de_u64_str")]
    pub proposer_index: u64,
    pub parent_root: String,
    pub state_root: String,
    pub body: BeaconBlockBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconBlockBody {
    pub sync_aggregate: SyncAggregateJson,
    pub execution_payload: ExecutionPayloadJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncAggregateJson {
    pub sync_committee_bits: String,
    pub sync_committee_signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionPayloadJson {
    pub parent_hash: String,
    pub fee_recipient: String,
    pub state_root: String,
    pub receipts_root: String,
    pub logs_bloom: String,
    pub prev_randao: String,
    #[serde(deserialize_with = "de_u64_str")]
    pub block_number: u64,
    #[serde(deserialize_with = "de_u64_str")]
    pub gas_limit: u64,
    #[serde(deserialize_with = "de_u64_str")]
    pub gas_used: u64,
    #[serde(deserialize_with = "de_u64_str")]
    pub timestamp: u64,
    pub extra_data: String,
    #[serde(deserialize_with = "de_u64_str")]
    pub base_fee_per_gas: u64,
    pub block_hash: String,
    pub transactions_root: Option<String>,
}

/// The subset of `debug/beacon/states/{id}` this crate rebuilds a state
/// tree from. Only the 25 top-level fields named in
/// `amb_core::state::build_state_tree` are modeled.
#[derive(Debug, Clone, Deserialize)]
pub struct BeaconStateEnvelope {
    pub data: BeaconStateData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconStateData {
    pub genesis_time: String,
    pub genesis_validators_root: String,
    pub slot: String,
    pub fork: ForkJson,
    pub latest_block_header: BeaconBlockHeaderJson,
    pub block_roots: Vec<String>,
    pub state_roots: Vec<String>,
    pub historical_roots: Vec<String>,
    pub eth1_data: Eth1DataJson,
    pub eth1_data_votes: Vec<Eth1DataJson>,
    pub eth1_deposit_index: String,
    pub validators: Vec<serde_json::Value>,
    pub balances: Vec<String>,
    pub randao_mixes: Vec<String>,
    pub slashings: Vec<String>,
    pub previous_epoch_participation: String,
    pub current_epoch_participation: String,
    pub justification_bits: String,
    pub previous_justified_checkpoint: CheckpointJson,
    pub current_justified_checkpoint: CheckpointJson,
    pub finalized_checkpoint: CheckpointJson,
    pub inactivity_scores: Vec<String>,
    pub current_sync_committee: SyncCommitteeJson,
    pub next_sync_committee: SyncCommitteeJson,
    pub latest_execution_payload_header: ExecutionPayloadHeaderJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForkJson {
    pub previous_version: String,
    pub current_version: String,
    pub epoch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconBlockHeaderJson {
    pub slot: String,
    pub proposer_index: String,
    pub parent_root: String,
    pub state_root: String,
    pub body_root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Eth1DataJson {
    pub deposit_root: String,
    pub deposit_count: String,
    pub block_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointJson {
    pub epoch: String,
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncCommitteeJson {
    pub pubkeys: Vec<String>,
    pub aggregate_pubkey: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionPayloadHeaderJson {
    pub parent_hash: String,
    pub fee_recipient: String,
    pub state_root: String,
    pub receipts_root: String,
    pub logs_bloom: String,
    pub prev_randao: String,
    pub block_number: String,
    pub gas_limit: String,
    pub gas_used: String,
    pub timestamp: String,
    pub extra_data: String,
    pub base_fee_per_gas: String,
    pub block_hash: String,
    pub transactions_root: String,
}

/// `eth_getProof` result shape (EIP-1186), carrying the proof rather than
/// verifying it: this system forwards these node lists on-chain as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthGetProofResult {
    pub address: String,
    pub balance: String,
    pub code_hash: String,
    pub nonce: String,
    pub storage_hash: String,
    pub account_proof: Vec<String>,
    pub storage_proof: Vec<StorageProofEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageProofEntry {
    pub key: String,
    pub value: String,
    pub proof: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: String,
    pub transaction_hash: String,
    pub transaction_index: String,
    pub log_index: String,
    pub block_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub transaction_index: String,
    pub block_hash: String,
    pub block_number: String,
    pub cumulative_gas_used: String,
    pub gas_used: String,
    pub contract_address: Option<String>,
    pub logs: Vec<LogEntry>,
    pub logs_bloom: String,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionBlock {
    pub hash: Option<String>,
    pub number: Option<String>,
    pub transactions: Vec<serde_json::Value>,
}

/// JSON-RPC 2.0 envelope, both directions.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'a str,
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}
