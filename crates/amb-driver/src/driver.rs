//! The periodic light-client update loop (component J), ported from
//! `oracle/cmd/worker/main.go`: read the last-synced slot off the target
//! contract, ask [`amb_core::updater::make_update`] for a fresher one, and
//! submit it if there is one.
//!
//! The core proof-construction call (`make_update`) is synchronous and
//! potentially slow (several blocking HTTP round trips through
//! [`amb_rpc::beacon::BlockingBeaconSource`]), so each tick runs it inside
//! `tokio::task::spawn_blocking` rather than blocking the driver's own
//! executor thread.

use crate::abi;
use crate::sender::{SenderError, TxRequest, TxSender};
use amb_core::types::{GenesisConfig, SpecConfig};
use amb_core::updater::{make_update, BlockSource, UpdaterError};
use amb_rpc::RpcError;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("light-client update assembly failed: {0}")]
    Updater(#[from] UpdaterError),
    #[error("target-chain call failed: {0}")]
    Rpc(#[from] RpcError),
    #[error("target-chain ABI decode failed: {0}")]
    Abi(#[from] ethabi::Error),
    #[error("transaction submission failed: {0}")]
    Sender(#[from] SenderError),
    #[error("cancelled")]
    Cancelled,
}

/// Everything one `step` tick needs: a beacon-chain source, a sender bound
/// to the target light-client contract, and the chain-spec/genesis
/// parameters sizing every proof `make_update` builds.
pub struct Driver<S: BlockSource + Send + Sync + 'static> {
    source: Arc<S>,
    sender: TxSender,
    contract: [u8; 20],
    spec: SpecConfig,
    genesis: GenesisConfig,
    bellatrix_fork_version: [u8; 4],
    with_finality: bool,
    /// The last slot this driver believes the on-chain light client has
    /// accepted. Refreshed from the contract at the start of every tick
    /// rather than trusted across ticks, since another relayer instance
    /// (or a manual `step`) may have advanced it concurrently.
    cursor: u64,
}

impl<S: BlockSource + Send + Sync + 'static> Driver<S> {
    pub fn new(
        source: Arc<S>,
        sender: TxSender,
        contract: [u8; 20],
        spec: SpecConfig,
        genesis: GenesisConfig,
        bellatrix_fork_version: [u8; 4],
        with_finality: bool,
    ) -> Self {
        Self { source, sender, contract, spec, genesis, bellatrix_fork_version, with_finality, cursor: 0 }
    }

    /// Reads `headSlot()` off the target light-client contract and caches
    /// it as the current cursor, matching the original's
    /// `worker.Run`'s first call each tick.
    async fn refresh_cursor(&mut self) -> Result<u64, DriverError> {
        let raw = self.sender.client().call_contract(self.contract, &abi::encode_head_slot()).await?;
        let slot = abi::decode_uint_return(&raw)?.as_u64();
        self.cursor = slot;
        Ok(slot)
    }

    /// Runs one tick: refresh the cursor, attempt `make_update`, submit a
    /// `step` transaction if a fresher update exists. Returns the slot the
    /// cursor advanced to, or `None` if there was nothing new to report.
    pub async fn tick(&mut self) -> Result<Option<u64>, DriverError> {
        let cur_slot = self.refresh_cursor().await?;
        tracing::info!(cur_slot, "starting light-client update tick");

        let source = self.source.clone();
        let spec = self.spec.clone();
        let genesis = self.genesis.clone();
        let bellatrix_fork_version = self.bellatrix_fork_version;
        let with_finality = self.with_finality;
        let now_unix = SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before epoch").as_secs();

        let update = tokio::task::spawn_blocking(move || {
            make_update(source.as_ref(), &spec, &genesis, bellatrix_fork_version, with_finality, cur_slot, 0, now_unix)
        })
        .await
        .expect("make_update task panicked")?;

        let Some(update) = update else {
            tracing::info!(cur_slot, "no fresher update available yet");
            return Ok(None);
        };

        let advance_to = if with_finality { update.finalized_header.slot } else { update.attested_header.slot };
        tracing::info!(
            attested_slot = update.attested_header.slot,
            finalized_slot = update.finalized_header.slot,
            "submitting step transaction"
        );

        let calldata = abi::encode_step(&update);
        let tx_hash = self.sender.send_tx(TxRequest { to: self.contract, data: calldata, gas: None }).await?;
        self.sender.wait_receipt(tx_hash).await?;
        self.cursor = advance_to;
        tracing::info!(advance_to, "step transaction confirmed");
        Ok(Some(advance_to))
    }

    /// Runs `tick` on a fixed period until `cancel` fires, matching the
    /// original's `time.Ticker`-driven loop. Any error is treated as fatal
    /// (per the error-handling taxonomy, a transport error or invariant
    /// violation should stop the driver rather than retry blindly) and
    /// propagated to the caller, who is expected to log it and exit.
    pub async fn run(&mut self, period: Duration, cancel: CancellationToken) -> Result<(), DriverError> {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(DriverError::Cancelled),
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "fatal error in driver tick, exiting");
                        return Err(e);
                    }
                }
            }
        }
    }
}
