//! `0x`-prefixed hex parsing shared by the beacon and execution clients.

use crate::error::RpcError;

pub fn decode_bytes(s: &str) -> Result<Vec<u8>, RpcError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let s = if s.len() % 2 == 1 { format!("0{s}") } else { s.to_string() };
    hex::decode(s).map_err(|e| RpcError::decode(format!("bad hex {e}")))
}

pub fn decode_hash(s: &str) -> Result<[u8; 32], RpcError> {
    let bytes = decode_bytes(s)?;
    if bytes.len() != 32 {
        return Err(RpcError::decode(format!("expected 32 bytes, got {}", bytes.len())));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn decode_address(s: &str) -> Result<[u8; 20], RpcError> {
    let bytes = decode_bytes(s)?;
    if bytes.len() != 20 {
        return Err(RpcError::decode(format!("expected 20 bytes, got {}", bytes.len())));
    }
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn decode_u64(s: &str) -> Result<u64, RpcError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| RpcError::decode(format!("bad hex int {e}")))
}

pub fn decode_fork_version(s: &str) -> Result<[u8; 4], RpcError> {
    let bytes = decode_bytes(s)?;
    if bytes.len() != 4 {
        return Err(RpcError::decode(format!("expected 4-byte fork version, got {}", bytes.len())));
    }
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn decode_48(s: &str) -> Result<[u8; 48], RpcError> {
    let bytes = decode_bytes(s)?;
    if bytes.len() != 48 {
        return Err(RpcError::decode(format!("expected 48 bytes, got {}", bytes.len())));
    }
    let mut out = [0u8; 48];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn decode_96(s: &str) -> Result<[u8; 96], RpcError> {
    let bytes = decode_bytes(s)?;
    if bytes.len() != 96 {
        return Err(RpcError::decode(format!("expected 96 bytes, got {}", bytes.len())));
    }
    let mut out = [0u8; 96];
    out.copy_from_slice(&bytes);
    Ok(out)
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses a packed little-endian SSZ bitlist (`sync_committee_bits`) into
/// one bool per committee member.
pub fn decode_bitlist(s: &str, len: usize) -> Result<Vec<bool>, RpcError> {
    let bytes = decode_bytes(s)?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let byte = bytes.get(i / 8).copied().unwrap_or(0);
        out.push(byte & (1 << (i % 8)) != 0);
    }
    Ok(out)
}
