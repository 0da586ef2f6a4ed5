//! `amb-relay-execute-storage` — one-shot storage-proof message execution,
//! mirroring `cmd/amb/execute_storage/main.go`: derive the AMB contract's
//! `sentMessages[nonce]` storage key, fetch an `eth_getProof` at the target
//! execution block, and submit `executeMessage` to the target chain.

use amb_driver::abi;
use amb_driver::config;
use amb_driver::sender::{load_signing_key, TxRequest, TxSender};
use amb_rpc::proof::fetch_storage_proof;
use amb_rpc::ExecutionClient;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "amb-relay-execute-storage", about = "Execute one AMB message via a storage-trie proof")]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Message nonce assigned by the source AMB contract.
    #[arg(long)]
    nonce: u64,

    /// Execution block number the proof is taken against.
    #[arg(long)]
    block_number: u64,

    /// Raw message bytes, hex-encoded (0x-prefixed or not). Fetching the
    /// originating log is an external watcher's job; this binary relays a
    /// message the caller already has in hand.
    #[arg(long)]
    message_hex: String,

    /// Set once a `VerifiedStorageRoot` log has already been observed for
    /// a slot at or after this message's source slot — skips the account
    /// proof and relies on the already-verified root, the normative path.
    #[arg(long, default_value_t = false)]
    reuse_verified_root: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let cfg = config::read_from_file(&args.config)?;
    let eth1 = cfg.eth1.ok_or_else(|| anyhow::anyhow!("config is missing the eth1 section"))?;

    let message = amb_rpc::hexutil::decode_bytes(&args.message_hex)?;

    let execution_client = ExecutionClient::new(eth1.url.clone());
    let proof = fetch_storage_proof(
        &execution_client,
        eth1.contract,
        args.nonce,
        args.block_number,
        args.reuse_verified_root,
    )
    .await?;

    tracing::info!(
        nonce = args.nonce,
        block_number = args.block_number,
        account_proof_nodes = proof.account_proof.len(),
        storage_proof_nodes = proof.storage_proof.len(),
        "assembled storage proof"
    );

    let calldata =
        abi::encode_execute_message(args.block_number, &message, &proof.account_proof, &proof.storage_proof);

    let signing_key = load_signing_key(&eth1.private_key_file)?;
    let mut sender = TxSender::new(execution_client, signing_key, eth1.gas_fee_cap, eth1.gas_tip_cap).await?;
    let tx_hash = sender.send_tx(TxRequest { to: eth1.contract, data: calldata, gas: None }).await?;
    let receipt = sender.wait_receipt(tx_hash).await?;
    tracing::info!(tx_hash = %hex::encode(tx_hash), status = ?receipt.status, "executeMessage confirmed");
    Ok(())
}
