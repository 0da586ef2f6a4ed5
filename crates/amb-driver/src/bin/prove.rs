//! `amb-relay-prove` — one-shot execution-payload proving, mirroring
//! `cmd/light_client_chain/prove/main.go`: compose the cross-slot branch
//! connecting a trusted beacon state to a target execution payload, then
//! submit `verifyExecutionPayload` to the target chain.

use amb_driver::abi;
use amb_driver::config;
use amb_driver::sender::{load_signing_key, TxRequest, TxSender};
use amb_rpc::beacon::{BeaconClient, BlockingBeaconSource};
use amb_rpc::ExecutionClient;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "amb-relay-prove", about = "Prove and submit one execution-payload branch")]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Slot of the beacon state the target light client already trusts.
    #[arg(long)]
    start_slot: u64,

    /// Slot of the execution payload to prove inclusion of.
    #[arg(long)]
    target_slot: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let cfg = config::read_from_file(&args.config)?;
    let eth1 = cfg.eth1.ok_or_else(|| anyhow::anyhow!("config is missing the eth1 section"))?;

    let beacon_client = BeaconClient::new(cfg.eth2.url.clone());
    let spec = match cfg.eth2.spec {
        Some(s) => s,
        None => beacon_client.get_spec().await?,
    };

    let source = Arc::new(BlockingBeaconSource::new(beacon_client, tokio::runtime::Handle::current()));
    let start_slot = args.start_slot;
    let target_slot = args.target_slot;
    let proof = tokio::task::spawn_blocking(move || {
        amb_core::navigator::prove_execution_payload_at(source.as_ref(), &spec, start_slot, target_slot)
    })
    .await??;

    tracing::info!(
        start_slot = proof.start_slot,
        target_slot = proof.target_slot,
        branch_len = proof.branch.len(),
        "assembled execution-payload proof"
    );

    let calldata =
        abi::encode_verify_execution_payload(proof.start_slot, proof.target_slot, &proof.header, &proof.branch);

    let execution_client = ExecutionClient::new(eth1.url.clone());
    let signing_key = load_signing_key(&eth1.private_key_file)?;
    let mut sender = TxSender::new(execution_client, signing_key, eth1.gas_fee_cap, eth1.gas_tip_cap).await?;
    let tx_hash = sender.send_tx(TxRequest { to: eth1.contract, data: calldata, gas: None }).await?;
    let receipt = sender.wait_receipt(tx_hash).await?;
    tracing::info!(tx_hash = %hex::encode(tx_hash), status = ?receipt.status, "verifyExecutionPayload confirmed");
    Ok(())
}
