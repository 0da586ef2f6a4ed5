//! BLS12-381 aggregate signature verification and the on-chain Fp/Fp2 point
//! decomposition used to ABI-encode sync-committee updates (component C).
//!
//! Signature aggregation and pairing verification go through `blst`'s
//! high-level `min_pk` API. The G1/G2 affine-coordinate decomposition into
//! `Fp`/`Fp2` needed for the target-chain ABI has no high-level equivalent,
//! so that part drops to `blst`'s raw FFI bindings, mirroring what the
//! reference oracle does via the Go `blst` bindings directly.

use blst::{
    blst_p1_affine, blst_p1_affine_serialize, blst_p1_uncompress, blst_p2_affine,
    blst_p2_affine_serialize, blst_p2_uncompress, BLST_ERROR,
};
use primitive_types::U256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlsError {
    #[error("invalid public key: {0:?}")]
    InvalidPublicKey(BLST_ERROR),
    #[error("invalid signature: {0:?}")]
    InvalidSignature(BLST_ERROR),
    #[error("no public keys to aggregate")]
    EmptyAggregate,
    #[error("signature does not verify")]
    VerificationFailed,
}

/// One element of BLS12-381's base field Fp, split into a 16-byte high limb
/// (`a`) and a 32-byte low limb (`b`) the way the target-chain ABI expects
/// a 48-byte field element to arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fp {
    pub a: U256,
    pub b: U256,
}

/// An element of the quadratic extension field Fp2 = Fp\[u\]/(u^2 + 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fp2 {
    pub a: Fp,
    pub b: Fp,
}

/// A G1 point (public key), decomposed into ABI-friendly field elements
/// alongside the raw compressed bytes it was parsed from.
#[derive(Debug, Clone)]
pub struct G1Point {
    pub raw: [u8; 48],
    pub x: Fp,
    pub y: Fp,
}

/// A G2 point (signature), decomposed the same way.
#[derive(Debug, Clone)]
pub struct G2Point {
    pub raw: [u8; 96],
    pub x: Fp2,
    pub y: Fp2,
}

fn fp_from_slice(b: &[u8]) -> Fp {
    debug_assert_eq!(b.len(), 48);
    Fp { a: U256::from_big_endian(&b[0..16]), b: U256::from_big_endian(&b[16..48]) }
}

/// Uncompress a 48-byte compressed public key and split it into the
/// Fp-pair ABI representation.
///
/// `blst_p1_affine` stores its coordinates in Montgomery form with
/// little-endian limbs, so reading `affine.x.l`/`affine.y.l` directly would
/// produce neither the canonical field value nor canonical byte order.
/// `blst_p1_affine_serialize` does the Montgomery-to-canonical conversion
/// and emits the standard 96-byte big-endian `X || Y` encoding, which is
/// what `fp_from_slice` expects.
pub fn pk_to_g1(compressed: &[u8; 48]) -> Result<G1Point, BlsError> {
    let mut affine = blst_p1_affine::default();
    let res = unsafe { blst_p1_uncompress(&mut affine, compressed.as_ptr()) };
    if res != BLST_ERROR::BLST_SUCCESS {
        return Err(BlsError::InvalidPublicKey(res));
    }
    let mut serialized = [0u8; 96];
    unsafe { blst_p1_affine_serialize(serialized.as_mut_ptr(), &affine) };
    Ok(G1Point {
        raw: *compressed,
        x: fp_from_slice(&serialized[0..48]),
        y: fp_from_slice(&serialized[48..96]),
    })
}

/// Uncompress a 96-byte compressed signature and split it into the
/// Fp2-pair ABI representation.
///
/// Mirrors the reference oracle's field ordering exactly: within each Fp2,
/// the *lower*-index 48 bytes of the serialized coordinate land in field
/// `b`, and the upper 48 bytes land in field `a` — swapped relative to the
/// natural reading order.
pub fn sig_to_g2(compressed: &[u8; 96]) -> Result<G2Point, BlsError> {
    let mut affine = blst_p2_affine::default();
    let res = unsafe { blst_p2_uncompress(&mut affine, compressed.as_ptr()) };
    if res != BLST_ERROR::BLST_SUCCESS {
        return Err(BlsError::InvalidSignature(res));
    }
    // 192-byte canonical big-endian `X.c0 || X.c1 || Y.c0 || Y.c1` encoding,
    // converted out of Montgomery form the same way `blst_p1_affine_serialize`
    // does for G1.
    let mut serialized = [0u8; 192];
    unsafe { blst_p2_affine_serialize(serialized.as_mut_ptr(), &affine) };
    let x_bytes = &serialized[0..96];
    let y_bytes = &serialized[96..192];
    Ok(G2Point {
        raw: *compressed,
        x: Fp2 { b: fp_from_slice(&x_bytes[0..48]), a: fp_from_slice(&x_bytes[48..96]) },
        y: Fp2 { b: fp_from_slice(&y_bytes[0..48]), a: fp_from_slice(&y_bytes[48..96]) },
    })
}

/// Ethereum 2.0's domain separation tag for sync-committee (G2, min-pubkey)
/// BLS signatures.
const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Verify that `sig` is a valid aggregate signature over `message` by the
/// aggregate of `pubkeys`.
pub fn verify_aggregate(
    pubkeys: &[[u8; 48]],
    message: &[u8; 32],
    sig: &[u8; 96],
) -> Result<(), BlsError> {
    use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};

    if pubkeys.is_empty() {
        return Err(BlsError::EmptyAggregate);
    }

    let signature =
        Signature::from_bytes(sig).map_err(BlsError::InvalidSignature)?;

    let keys: Vec<PublicKey> = pubkeys
        .iter()
        .map(|pk| PublicKey::from_bytes(pk).map_err(BlsError::InvalidPublicKey))
        .collect::<Result<_, _>>()?;
    let key_refs: Vec<&PublicKey> = keys.iter().collect();

    let aggregated = AggregatePublicKey::aggregate(&key_refs, false)
        .map_err(BlsError::InvalidPublicKey)?
        .to_public_key();

    let result = signature.verify(false, message, DST, &[], &aggregated, false);
    if result != BLST_ERROR::BLST_SUCCESS {
        return Err(BlsError::VerificationFailed);
    }
    Ok(())
}

/// Aggregate two already-decomposed G1 points, returning `b` unchanged if
/// `a` is `None` — the identity case a running aggregator starts from.
pub fn add_g1_points(a: Option<&G1Point>, b: &[u8; 48]) -> Result<G1Point, BlsError> {
    use blst::min_pk::{AggregatePublicKey, PublicKey};

    let b_point = PublicKey::from_bytes(b).map_err(BlsError::InvalidPublicKey)?;
    let combined = match a {
        None => b_point,
        Some(a) => {
            let a_point = PublicKey::from_bytes(&a.raw).map_err(BlsError::InvalidPublicKey)?;
            AggregatePublicKey::aggregate(&[&a_point, &b_point], false)
                .map_err(BlsError::InvalidPublicKey)?
                .to_public_key()
        }
    };
    pk_to_g1(&combined.compress().try_into().expect("compressed pk is 48 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_aggregate_rejects_empty_pubkeys() {
        let err = verify_aggregate(&[], &[0u8; 32], &[0u8; 96]);
        assert!(matches!(err, Err(BlsError::EmptyAggregate)));
    }

    #[test]
    fn pk_to_g1_rejects_garbage_bytes() {
        let garbage = [0xffu8; 48];
        assert!(pk_to_g1(&garbage).is_err());
    }

    #[test]
    fn sig_to_g2_rejects_garbage_bytes() {
        let garbage = [0xffu8; 96];
        assert!(sig_to_g2(&garbage).is_err());
    }
}
