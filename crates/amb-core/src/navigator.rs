//! Cross-slot navigation (component H).
//!
//! Composes an execution-payload state-root proof that reaches from the
//! *start* state (the one the on-chain light client already trusts) down to
//! an execution payload that may live many slots in the past, by picking
//! one of three regimes depending on how far back `target_slot` is. Ported
//! from the `if/else if/else` ladder in `prove/main.go`.

use crate::merkle::{Hash, MerkleTree};
use crate::payload::{self, ExecutionPayloadHeader};
use crate::state::{self, BeaconStateInputs};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("target slot {target} is ahead of start slot {start}")]
    TargetAheadOfStart { target: u64, start: u64 },
    #[error("block source error: {0}")]
    Source(String),
    #[error("binary search window [{low}, {high}] closed without a match for block number {target}")]
    SpiralSearchExhausted { low: u64, high: u64, target: u64 },
}

/// Everything the navigator needs from the beacon node, kept separate from
/// [`crate::updater::BlockSource`] since the navigator proves payloads for
/// already-trusted slots rather than discovering new ones.
pub trait StateSource {
    fn state_at_slot(&self, slot: u64) -> Result<BeaconStateInputs, String>;
    fn execution_header_at_slot(&self, slot: u64) -> Result<ExecutionPayloadHeader, String>;
    /// Slot of the block whose `execution_payload.block_number` field is
    /// closest to (but not exceeding) the binary-search midpoint; `None` if
    /// the slot is empty.
    fn block_number_at_slot(&self, slot: u64) -> Result<Option<u64>, String>;
}

/// One of the three execution-payload proof shapes `verifyExecutionPayload`
/// can submit, each carrying everything except the target-contract call.
pub struct ExecutionPayloadProof {
    pub start_slot: u64,
    pub target_slot: u64,
    pub header: ExecutionPayloadHeader,
    pub branch: Vec<Hash>,
}

/// Build the execution-payload proof connecting `start_slot`'s trusted
/// state to `target_slot`'s execution payload, picking same-slot / recent
/// / distant composition automatically.
pub fn prove_execution_payload_at(
    source: &dyn StateSource,
    spec: &crate::types::SpecConfig,
    start_slot: u64,
    target_slot: u64,
) -> Result<ExecutionPayloadProof, NavigatorError> {
    prove_header_field_at(source, spec, start_slot, target_slot, None)
}

/// As [`prove_execution_payload_at`], but returns only the `receipts_root`
/// branch (`header` carries the other fields but `branch` proves this one
/// field in isolation) — what `executeMessageFromLog` wants for its
/// `receiptsRootProof` argument, since that call checks one field inline
/// instead of taking the full header.
pub fn prove_receipts_root_at(
    source: &dyn StateSource,
    spec: &crate::types::SpecConfig,
    start_slot: u64,
    target_slot: u64,
) -> Result<ExecutionPayloadProof, NavigatorError> {
    prove_header_field_at(source, spec, start_slot, target_slot, Some(payload::RECEIPTS_ROOT_FIELD_INDEX))
}

/// Shared implementation behind [`prove_execution_payload_at`] and
/// [`prove_receipts_root_at`]: `field_index` is `None` for the full-header
/// case, `Some(payload::RECEIPTS_ROOT_FIELD_INDEX)` (or any other header
/// field index) to narrow the branch to one field.
pub fn prove_header_field_at(
    source: &dyn StateSource,
    spec: &crate::types::SpecConfig,
    start_slot: u64,
    target_slot: u64,
    field_index: Option<usize>,
) -> Result<ExecutionPayloadProof, NavigatorError> {
    if target_slot > start_slot {
        return Err(NavigatorError::TargetAheadOfStart { target: target_slot, start: start_slot });
    }

    if target_slot == 0 || target_slot == start_slot {
        return prove_same_slot(source, start_slot, field_index);
    }
    if target_slot + spec.slots_per_historical_root > start_slot {
        return prove_recent(source, start_slot, target_slot, field_index);
    }
    prove_distant(source, spec, start_slot, target_slot, field_index)
}

fn inner_branch(header: &ExecutionPayloadHeader, state: &BeaconStateInputs, field_index: Option<usize>) -> Vec<Hash> {
    let mut branch = payload::prove_execution_payload(state);
    if let Some(idx) = field_index {
        branch.extend(header.make_field_proof(idx));
    }
    branch
}

fn prove_same_slot(
    source: &dyn StateSource,
    start_slot: u64,
    field_index: Option<usize>,
) -> Result<ExecutionPayloadProof, NavigatorError> {
    let state = source.state_at_slot(start_slot).map_err(NavigatorError::Source)?;
    let header = source.execution_header_at_slot(start_slot).map_err(NavigatorError::Source)?;
    let branch = inner_branch(&header, &state, field_index);
    Ok(ExecutionPayloadProof { start_slot, target_slot: start_slot, header, branch })
}

fn prove_recent(
    source: &dyn StateSource,
    start_slot: u64,
    target_slot: u64,
    field_index: Option<usize>,
) -> Result<ExecutionPayloadProof, NavigatorError> {
    let start_state = source.state_at_slot(start_slot).map_err(NavigatorError::Source)?;
    let target_state = source.state_at_slot(target_slot).map_err(NavigatorError::Source)?;
    let header = source.execution_header_at_slot(target_slot).map_err(NavigatorError::Source)?;

    let proof1 = inner_branch(&header, &target_state, field_index);
    let state_roots_len = start_state.state_roots.len().max(1);
    let proof2 = MerkleTree::new_vector(start_state.state_roots.clone())
        .make_proof((target_slot as usize) % state_roots_len)
        .path;
    let proof3 = state::build_state_tree(&start_state).make_proof(6).path;

    let branch = proof1.into_iter().chain(proof2).chain(proof3).collect();
    Ok(ExecutionPayloadProof { start_slot, target_slot, header, branch })
}

fn prove_distant(
    source: &dyn StateSource,
    spec: &crate::types::SpecConfig,
    start_slot: u64,
    target_slot: u64,
    field_index: Option<usize>,
) -> Result<ExecutionPayloadProof, NavigatorError> {
    let historical_root_index = target_slot / spec.slots_per_historical_root;
    let historical_batch_slot =
        historical_root_index * spec.slots_per_historical_root + spec.slots_per_historical_root;

    let start_state = source.state_at_slot(start_slot).map_err(NavigatorError::Source)?;
    let batch_state = source.state_at_slot(historical_batch_slot).map_err(NavigatorError::Source)?;
    let target_state = source.state_at_slot(target_slot).map_err(NavigatorError::Source)?;
    let header = source.execution_header_at_slot(target_slot).map_err(NavigatorError::Source)?;

    let proof1 = inner_branch(&header, &target_state, field_index);
    let state_roots_len = batch_state.state_roots.len().max(1);
    let proof2 = MerkleTree::new_vector(batch_state.state_roots.clone())
        .make_proof((target_slot as usize) % state_roots_len)
        .path;
    let block_roots_root = MerkleTree::new_vector(batch_state.block_roots.clone()).hash();
    let proof3 = MerkleTree::new_list(start_state.historical_roots.clone(), spec.historical_roots_limit)
        .make_proof(historical_root_index as usize)
        .path;
    let proof4 = state::build_state_tree(&start_state).make_proof(7).path;

    let branch = proof1
        .into_iter()
        .chain(proof2)
        .chain(std::iter::once(block_roots_root))
        .chain(proof3)
        .chain(proof4)
        .collect();
    Ok(ExecutionPayloadProof { start_slot, target_slot, header, branch })
}

/// Binary search for the beacon slot whose execution payload has block
/// number `target_block_number`, tolerating missed slots by trying
/// `mid, mid+1, mid-1, mid+2, mid-2, ...` before giving up on a window.
pub fn find_beacon_block_by_execution_block_number(
    source: &dyn StateSource,
    target_block_number: u64,
    mut low: u64,
    mut high: u64,
) -> Result<u64, NavigatorError> {
    while low <= high {
        let mid = low + (high - low) / 2;
        match spiral_probe(source, mid, low, high)? {
            None => {
                return Err(NavigatorError::SpiralSearchExhausted { low, high, target: target_block_number })
            }
            Some((slot, block_number)) => {
                if block_number == target_block_number {
                    return Ok(slot);
                } else if block_number < target_block_number {
                    low = slot + 1;
                } else {
                    if slot == 0 {
                        break;
                    }
                    high = slot - 1;
                }
            }
        }
    }
    Err(NavigatorError::SpiralSearchExhausted { low, high, target: target_block_number })
}

/// Try `center`, then `center+1, center-1, center+2, center-2, ...` within
/// `[low, high]` until a populated slot is found.
fn spiral_probe(
    source: &dyn StateSource,
    center: u64,
    low: u64,
    high: u64,
) -> Result<Option<(u64, u64)>, NavigatorError> {
    if let Some(n) = source.block_number_at_slot(center).map_err(NavigatorError::Source)? {
        return Ok(Some((center, n)));
    }
    let mut offset: u64 = 1;
    loop {
        let mut probed_any = false;
        if center + offset <= high {
            probed_any = true;
            if let Some(n) =
                source.block_number_at_slot(center + offset).map_err(NavigatorError::Source)?
            {
                return Ok(Some((center + offset, n)));
            }
        }
        if center >= low + offset {
            probed_any = true;
            if let Some(n) =
                source.block_number_at_slot(center - offset).map_err(NavigatorError::Source)?
            {
                return Ok(Some((center - offset, n)));
            }
        }
        if !probed_any {
            return Ok(None);
        }
        offset += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeSource {
        block_numbers: RefCell<HashMap<u64, u64>>,
    }

    impl StateSource for FakeSource {
        fn state_at_slot(&self, _slot: u64) -> Result<BeaconStateInputs, String> {
            unimplemented!("not exercised by spiral-search tests")
        }
        fn execution_header_at_slot(&self, _slot: u64) -> Result<ExecutionPayloadHeader, String> {
            unimplemented!("not exercised by spiral-search tests")
        }
        fn block_number_at_slot(&self, slot: u64) -> Result<Option<u64>, String> {
            Ok(self.block_numbers.borrow().get(&slot).copied())
        }
    }

    #[test]
    fn spiral_search_finds_exact_block_number() {
        let mut map = HashMap::new();
        for slot in 0..100u64 {
            map.insert(slot, slot * 2);
        }
        let source = FakeSource { block_numbers: RefCell::new(map) };
        let slot = find_beacon_block_by_execution_block_number(&source, 60, 0, 99).unwrap();
        assert_eq!(slot, 30);
    }

    #[test]
    fn spiral_search_tolerates_missed_slots() {
        let mut map = HashMap::new();
        for slot in 0..100u64 {
            if slot != 30 {
                map.insert(slot, slot * 2);
            }
        }
        let source = FakeSource { block_numbers: RefCell::new(map) };
        // slot 30 is missed; 60 is still reachable from a neighboring slot
        let slot = find_beacon_block_by_execution_block_number(&source, 60, 0, 99);
        assert!(slot.is_ok());
    }
}
