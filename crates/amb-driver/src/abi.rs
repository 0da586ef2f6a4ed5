//! Target-chain contract calldata: `headSlot`/`head`/`step` on the
//! beacon-light-client contract, `stateRoot` on the light-client-chain
//! mirror, and `executeMessage`/`executeMessageFromLog` on the AMB
//! contract, grounded in `oracle/contract/abi.go`'s `.Pack(...)` call sites
//! across `cmd/worker`, `cmd/light_client/worker`, and `cmd/amb`.
//!
//! The concrete tuple shape for `Update`/`Fp`/`Fp2`/`G1Point`/`G2Point`
//! isn't recoverable from the retrieval pack (the Solidity ABI JSON is
//! `//go:embed`-ed, not vendored alongside the Go source) and is
//! reconstructed here directly from `amb_core::bls`'s own field layout:
//! every 381-bit field element crosses the ABI boundary as a `(uint256,
//! uint256)` pair, matching how this crate already splits it for BLS
//! precompile consumption.

use amb_core::bls::{Fp, Fp2, G1Point, G2Point};
use amb_core::merkle::Hash;
use amb_core::payload::ExecutionPayloadHeader;
use amb_core::types::{BeaconBlockHeader, Update};
use ethabi::{ParamType, Token};
use primitive_types::U256;

fn u256_to_token(v: U256) -> Token {
    let mut buf = [0u8; 32];
    v.to_big_endian(&mut buf);
    Token::Uint(ethabi::Uint::from_big_endian(&buf))
}

fn fp_param_type() -> ParamType {
    ParamType::Tuple(vec![ParamType::Uint(256), ParamType::Uint(256)])
}

fn fp_token(fp: &Fp) -> Token {
    Token::Tuple(vec![u256_to_token(fp.a), u256_to_token(fp.b)])
}

fn fp2_param_type() -> ParamType {
    ParamType::Tuple(vec![fp_param_type(), fp_param_type()])
}

fn fp2_token(fp2: &Fp2) -> Token {
    Token::Tuple(vec![fp_token(&fp2.a), fp_token(&fp2.b)])
}

fn g1_param_type() -> ParamType {
    ParamType::Tuple(vec![fp_param_type(), fp_param_type()])
}

fn g1_token(p: &G1Point) -> Token {
    Token::Tuple(vec![fp_token(&p.x), fp_token(&p.y)])
}

fn g2_param_type() -> ParamType {
    ParamType::Tuple(vec![fp2_param_type(), fp2_param_type()])
}

fn g2_token(p: &G2Point) -> Token {
    Token::Tuple(vec![fp2_token(&p.x), fp2_token(&p.y)])
}

fn header_param_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Uint(64),
        ParamType::Uint(64),
        ParamType::FixedBytes(32),
        ParamType::FixedBytes(32),
        ParamType::FixedBytes(32),
    ])
}

fn header_token(h: &BeaconBlockHeader) -> Token {
    Token::Tuple(vec![
        Token::Uint(h.slot.into()),
        Token::Uint(h.proposer_index.into()),
        Token::FixedBytes(h.parent_root.to_vec()),
        Token::FixedBytes(h.state_root.to_vec()),
        Token::FixedBytes(h.body_root.to_vec()),
    ])
}

fn hash_array_token(hashes: &[Hash]) -> Token {
    Token::Array(hashes.iter().map(|h| Token::FixedBytes(h.to_vec())).collect())
}

fn update_param_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::FixedBytes(4),
        ParamType::Uint(64),
        header_param_type(),
        header_param_type(),
        ParamType::Array(Box::new(g1_param_type())),
        g1_param_type(),
        g2_param_type(),
        ParamType::Array(Box::new(ParamType::FixedBytes(32))),
        ParamType::Array(Box::new(ParamType::FixedBytes(32))),
        ParamType::Array(Box::new(ParamType::FixedBytes(32))),
        ParamType::Array(Box::new(ParamType::FixedBytes(32))),
    ])
}

fn update_token(update: &Update) -> Token {
    Token::Tuple(vec![
        Token::FixedBytes(update.fork_version.to_vec()),
        Token::Uint(update.signature_slot.into()),
        header_token(&update.attested_header),
        header_token(&update.finalized_header),
        Token::Array(update.sync_committee.iter().map(g1_token).collect()),
        g1_token(&update.sync_committee_aggregated),
        g2_token(&update.sync_aggregate_signature),
        hash_array_token(&update.sync_aggregate_bit_list),
        hash_array_token(&update.sync_committee_branch),
        hash_array_token(&update.finality_branch),
        hash_array_token(&update.sync_committee_root_decommitments),
    ])
}

fn execution_payload_header_param_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::FixedBytes(32),
        ParamType::Address,
        ParamType::FixedBytes(32),
        ParamType::FixedBytes(32),
        ParamType::Bytes,
        ParamType::FixedBytes(32),
        ParamType::Uint(64),
        ParamType::Uint(64),
        ParamType::Uint(64),
        ParamType::Uint(64),
        ParamType::Bytes,
        ParamType::Uint(64),
        ParamType::FixedBytes(32),
        ParamType::FixedBytes(32),
    ])
}

fn execution_payload_header_token(h: &ExecutionPayloadHeader) -> Token {
    Token::Tuple(vec![
        Token::FixedBytes(h.parent_hash.to_vec()),
        Token::Address(h.fee_recipient.into()),
        Token::FixedBytes(h.state_root.to_vec()),
        Token::FixedBytes(h.receipts_root.to_vec()),
        Token::Bytes(h.logs_bloom.clone()),
        Token::FixedBytes(h.prev_randao.to_vec()),
        Token::Uint(h.block_number.into()),
        Token::Uint(h.gas_limit.into()),
        Token::Uint(h.gas_used.into()),
        Token::Uint(h.timestamp.into()),
        Token::Bytes(h.extra_data.clone()),
        Token::Uint(h.base_fee_per_gas.into()),
        Token::FixedBytes(h.block_hash.to_vec()),
        Token::FixedBytes(h.transactions_root.to_vec()),
    ])
}

fn encode_call(name: &str, param_types: &[ParamType], tokens: Vec<Token>) -> Vec<u8> {
    let selector = ethabi::short_signature(name, param_types);
    let mut out = selector.to_vec();
    out.extend(ethabi::encode(&tokens));
    out
}

pub fn encode_head_slot() -> Vec<u8> {
    encode_call("headSlot", &[], vec![])
}

pub fn encode_head() -> Vec<u8> {
    encode_call("head", &[], vec![])
}

pub fn encode_state_root(block_number: u64) -> Vec<u8> {
    encode_call("stateRoot", &[ParamType::Uint(256)], vec![Token::Uint(block_number.into())])
}

pub fn encode_step(update: &Update) -> Vec<u8> {
    encode_call("step", &[update_param_type()], vec![update_token(update)])
}

/// `applyCandidate()` — promotes a previously-submitted (but not yet
/// finalized) update to the light client's canonical head, matching
/// `cmd/light_client/send_proof/main.go`'s second `.Pack` call.
pub fn encode_apply_candidate() -> Vec<u8> {
    encode_call("applyCandidate", &[], vec![])
}

/// `verifyExecutionPayload(startSlot, targetSlot, header, proof)` — submits
/// one of the three cross-slot execution-payload proof shapes the navigator
/// assembles, matching every `.Pack("verifyExecutionPayload", ...)` call
/// site in `cmd/light_client_chain/prove/main.go`.
pub fn encode_verify_execution_payload(
    start_slot: u64,
    target_slot: u64,
    header: &ExecutionPayloadHeader,
    branch: &[Hash],
) -> Vec<u8> {
    let param_types = vec![
        ParamType::Uint(256),
        ParamType::Uint(256),
        execution_payload_header_param_type(),
        ParamType::Array(Box::new(ParamType::FixedBytes(32))),
    ];
    let tokens = vec![
        Token::Uint(start_slot.into()),
        Token::Uint(target_slot.into()),
        execution_payload_header_token(header),
        hash_array_token(branch),
    ];
    encode_call("verifyExecutionPayload", &param_types, tokens)
}

pub fn encode_execute_message(
    block_number: u64,
    message: &[u8],
    account_proof: &[Vec<u8>],
    storage_proof: &[Vec<u8>],
) -> Vec<u8> {
    let param_types = vec![
        ParamType::Uint(256),
        ParamType::Bytes,
        ParamType::Array(Box::new(ParamType::Bytes)),
        ParamType::Array(Box::new(ParamType::Bytes)),
    ];
    let tokens = vec![
        Token::Uint(block_number.into()),
        Token::Bytes(message.to_vec()),
        Token::Array(account_proof.iter().cloned().map(Token::Bytes).collect()),
        Token::Array(storage_proof.iter().cloned().map(Token::Bytes).collect()),
    ];
    encode_call("executeMessage", &param_types, tokens)
}

/// `executeMessageFromLog(syncedSlot, sourceSlot, txIndex, logIndex, msg,
/// receiptsRootProof, proof)` — `synced_slot` is the slot the target
/// contract already trusts, `source_slot` is where the emitting execution
/// block lives, and `receipts_root_proof` is the cross-slot branch
/// connecting the two when they differ; empty when `synced_slot ==
/// source_slot`.
#[allow(clippy::too_many_arguments)]
pub fn encode_execute_message_from_log(
    synced_slot: u64,
    source_slot: u64,
    tx_index: u64,
    log_index: u64,
    message: &[u8],
    receipts_root_proof: &[Hash],
    proof: &[Vec<u8>],
) -> Vec<u8> {
    let param_types = vec![
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::Bytes,
        ParamType::Array(Box::new(ParamType::FixedBytes(32))),
        ParamType::Array(Box::new(ParamType::Bytes)),
    ];
    let tokens = vec![
        Token::Uint(synced_slot.into()),
        Token::Uint(source_slot.into()),
        Token::Uint(tx_index.into()),
        Token::Uint(log_index.into()),
        Token::Bytes(message.to_vec()),
        hash_array_token(receipts_root_proof),
        Token::Array(proof.iter().cloned().map(Token::Bytes).collect()),
    ];
    encode_call("executeMessageFromLog", &param_types, tokens)
}

/// Decodes a single `uint256` return value, truncated to `u64` — every
/// read-only call this driver makes (`headSlot`, `head`, `stateRoot`)
/// returns a slot, block number, or root that fits comfortably in 64 bits
/// or 32 bytes respectively.
pub fn decode_uint_return(data: &[u8]) -> Result<U256, ethabi::Error> {
    let tokens = ethabi::decode(&[ParamType::Uint(256)], data)?;
    tokens
        .into_iter()
        .next()
        .and_then(|t| t.into_uint())
        .map(|u| {
            let mut buf = [0u8; 32];
            u.to_big_endian(&mut buf);
            U256::from_big_endian(&buf)
        })
        .ok_or_else(|| ethabi::Error::InvalidData)
}

/// Decodes a single `bytes32` return value (`head()` on the light-client
/// contracts returns the synced execution block's block hash or root).
pub fn decode_bytes32_return(data: &[u8]) -> Result<[u8; 32], ethabi::Error> {
    let tokens = ethabi::decode(&[ParamType::FixedBytes(32)], data)?;
    let bytes = tokens.into_iter().next().and_then(|t| t.into_fixed_bytes()).ok_or(ethabi::Error::InvalidData)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_slot_call_is_selector_only() {
        let data = encode_head_slot();
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn state_root_call_encodes_one_word_after_selector() {
        let data = encode_state_root(12345);
        assert_eq!(data.len(), 4 + 32);
    }

    #[test]
    fn execute_message_call_round_trips_through_ethabi_decode() {
        let data = encode_execute_message(7, b"hello", &[vec![1, 2, 3]], &[vec![4, 5]]);
        let decoded = ethabi::decode(
            &[
                ParamType::Uint(256),
                ParamType::Bytes,
                ParamType::Array(Box::new(ParamType::Bytes)),
                ParamType::Array(Box::new(ParamType::Bytes)),
            ],
            &data[4..],
        )
        .unwrap();
        assert_eq!(decoded[1].clone().into_bytes().unwrap(), b"hello".to_vec());
    }
}
