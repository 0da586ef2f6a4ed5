//! # amb-core
//!
//! Pure Rust proof-construction core for a cross-chain arbitrary message
//! bridge between an Ethereum-like beacon chain and an EVM target chain.
//!
//! This crate contains **no networking code** and **no async runtime
//! dependency**. Every function here is deterministic and synchronous; I/O
//! boundaries are expressed as plain traits (`updater::BlockSource`,
//! `navigator::StateSource`) implemented downstream in `amb-rpc`.
//!
//! ## Layers
//!
//! - [`hash`] / [`merkle`] / [`ssz`] — the Merkleization engine: SHA-256
//!   primitives, a non-materialized generalized-index Merkle tree, and the
//!   SSZ container-field helpers built on top of it.
//! - [`bls`] — BLS12-381 aggregate signature verification and the G1/G2
//!   point decomposition the target-chain ABI expects.
//! - [`state`] — beacon-state tree reconstruction from precomputed field
//!   roots, with the fixed generalized-index vocabulary the rest of the
//!   crate is built against.
//! - [`updater`] — assembles a light-client [`types::Update`] proving a
//!   sync committee's signature over a new header.
//! - [`payload`] / [`navigator`] — proves an execution-layer state root or
//!   block number sits inside a given (possibly historical) beacon state.

pub mod bls;
pub mod hash;
pub mod merkle;
pub mod navigator;
pub mod payload;
pub mod ssz;
pub mod state;
pub mod types;
pub mod updater;

pub use bls::{BlsError, G1Point, G2Point};
pub use merkle::{MerkleMultiProof, MerkleProof, MerkleTree};
pub use navigator::{find_beacon_block_by_execution_block_number, prove_execution_payload_at};
pub use types::{BeaconBlockHeader, SpecConfig, SyncCommittee, Update};
pub use updater::make_update;
