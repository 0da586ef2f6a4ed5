//! # amb-rpc
//!
//! Beacon-chain and execution-layer JSON clients, plus the trie-proof
//! assembly that bridges `amb-core`'s pure, synchronous proof-construction
//! traits to real async network I/O. Nothing in here does cryptography or
//! Merkleization on its own terms — it fetches the JSON the chains expose
//! and reshapes it into the types `amb-core` already knows how to prove
//! things about.

pub mod beacon;
pub mod error;
pub mod execution;
pub mod hexutil;
pub mod proof;
pub mod trie;
pub mod types;

pub use beacon::{BeaconClient, BlockingBeaconSource};
pub use error::RpcError;
pub use execution::ExecutionClient;
pub use proof::{build_receipts_proof, fetch_storage_proof, sent_message_storage_key, ReceiptsProof, StorageProof};
pub use trie::OrderedTrie;
