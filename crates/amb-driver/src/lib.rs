//! # amb-driver
//!
//! The periodic relay service (component J): configuration loading, ABI
//! calldata for the target-chain contracts, EIP-1559 transaction signing
//! and submission, and the driver loop itself that ties a
//! [`amb_core::updater::make_update`] call to a `step` transaction.
//!
//! Everything in this crate is `async`/`tokio`-based — it owns every I/O
//! suspension point in the system, matching `amb-core` staying synchronous
//! and pure. Binaries live under `src/bin/*.rs`, one per original `cmd/*`
//! entrypoint (`amb-relay-step`, `amb-relay-execute-storage`,
//! `amb-relay-execute-log`, `amb-relay-prove`).

pub mod abi;
pub mod config;
pub mod driver;
pub mod sender;

pub use driver::{Driver, DriverError};
