//! `amb-relay-execute-log` — one-shot receipts-trie message execution,
//! mirroring `cmd/amb/execute_log/main.go`: rebuild the source block's
//! receipts trie, prove inclusion of the transaction carrying the emitted
//! log, and submit `executeMessageFromLog` to the target chain.

use amb_driver::abi;
use amb_driver::config;
use amb_driver::sender::{load_signing_key, TxRequest, TxSender};
use amb_rpc::beacon::{BeaconClient, BlockingBeaconSource};
use amb_rpc::proof::build_receipts_proof;
use amb_rpc::ExecutionClient;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "amb-relay-execute-log", about = "Execute one AMB message via a receipts-trie proof")]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Execution block the emitting transaction is in, hex-encoded.
    #[arg(long)]
    block_hash: String,

    /// The synced slot the target contract already trusts (the
    /// beacon-chain slot whose state root anchors this block).
    #[arg(long)]
    synced_slot: u64,

    /// The beacon slot the source execution block belongs to.
    #[arg(long)]
    source_slot: u64,

    /// Index of the transaction emitting the message within its block.
    #[arg(long)]
    tx_index: u64,

    /// Index of the log within the whole block (as returned by
    /// `eth_getLogs`), not within its own receipt.
    #[arg(long)]
    log_index_in_block: u64,

    #[arg(long)]
    message_hex: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let cfg = config::read_from_file(&args.config)?;
    let eth1 = cfg.eth1.ok_or_else(|| anyhow::anyhow!("config is missing the eth1 section"))?;

    let message = amb_rpc::hexutil::decode_bytes(&args.message_hex)?;
    let block_hash = amb_rpc::hexutil::decode_hash(&args.block_hash)?;

    let execution_client = ExecutionClient::new(eth1.url.clone());
    let receipts_proof =
        build_receipts_proof(&execution_client, block_hash, args.tx_index, args.log_index_in_block).await?;

    tracing::info!(
        tx_index = args.tx_index,
        log_index_in_receipt = receipts_proof.log_index_in_receipt,
        proof_nodes = receipts_proof.proof.len(),
        "assembled receipts-trie proof"
    );

    if args.synced_slot < args.source_slot {
        anyhow::bail!("synced_slot must be >= source_slot; run amb-relay-prove first");
    }

    // The branch linking `source_slot`'s receipts root up to `synced_slot`'s
    // already-trusted state root (component H), empty when the two
    // coincide and the receipt's own block root is what the target
    // contract already trusts.
    let receipts_root_proof = if args.synced_slot == args.source_slot {
        Vec::new()
    } else {
        let beacon_client = BeaconClient::new(cfg.eth2.url.clone());
        let spec = match cfg.eth2.spec.clone() {
            Some(s) => s,
            None => beacon_client.get_spec().await?,
        };
        let source = Arc::new(BlockingBeaconSource::new(beacon_client, tokio::runtime::Handle::current()));
        let proof = tokio::task::spawn_blocking(move || {
            amb_core::navigator::prove_receipts_root_at(source.as_ref(), &spec, args.synced_slot, args.source_slot)
        })
        .await??;
        proof.branch
    };

    let calldata = abi::encode_execute_message_from_log(
        args.synced_slot,
        args.source_slot,
        args.tx_index,
        receipts_proof.log_index_in_receipt,
        &message,
        &receipts_root_proof,
        &receipts_proof.proof,
    );

    let signing_key = load_signing_key(&eth1.private_key_file)?;
    let mut sender = TxSender::new(execution_client, signing_key, eth1.gas_fee_cap, eth1.gas_tip_cap).await?;
    let tx_hash = sender.send_tx(TxRequest { to: eth1.contract, data: calldata, gas: None }).await?;
    let receipt = sender.wait_receipt(tx_hash).await?;
    tracing::info!(tx_hash = %hex::encode(tx_hash), status = ?receipt.status, "executeMessageFromLog confirmed");
    Ok(())
}
