//! `amb-relay-step` — the periodic light-client update driver, mirroring
//! `oracle/cmd/worker/main.go`. Loads a YAML config, fetches any spec/
//! genesis overrides not present in it, and runs [`amb_driver::Driver::run`]
//! until cancelled or a fatal error occurs.

use amb_driver::config;
use amb_driver::driver::Driver;
use amb_driver::sender::{load_signing_key, TxSender};
use amb_rpc::beacon::{BeaconClient, BlockingBeaconSource};
use amb_rpc::ExecutionClient;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "amb-relay-step", about = "Periodic beacon light-client update relayer")]
struct Args {
    /// Path to the YAML configuration file (see `oracle/config/config.go`'s
    /// `eth1`/`eth2` shape).
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Poll interval between `step` attempts.
    #[arg(long, default_value = "60")]
    interval_secs: u64,

    /// Whether to also prove and submit the finalized-checkpoint branch.
    #[arg(long, default_value_t = true)]
    with_finality: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let cfg = config::read_from_file(&args.config)?;
    let eth1 = cfg.eth1.ok_or_else(|| anyhow::anyhow!("config is missing the eth1 section"))?;

    let beacon_client = BeaconClient::new(cfg.eth2.url.clone());
    let genesis = match cfg.eth2.genesis {
        Some(g) => g,
        None => beacon_client.get_genesis().await?,
    };
    let spec = match cfg.eth2.spec {
        Some(s) => s,
        None => beacon_client.get_spec().await?,
    };

    let source = Arc::new(BlockingBeaconSource::new(beacon_client, tokio::runtime::Handle::current()));

    let signing_key = load_signing_key(&eth1.private_key_file)?;
    let execution_client = ExecutionClient::new(eth1.url.clone());
    let sender = TxSender::new(execution_client, signing_key, eth1.gas_fee_cap, eth1.gas_tip_cap).await?;

    tracing::info!(address = %hex::encode(sender.address()), "relayer account");

    let bellatrix_fork_version = spec.bellatrix_fork_version;
    let mut driver =
        Driver::new(source, sender, eth1.contract, spec, genesis, bellatrix_fork_version, args.with_finality);

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received Ctrl-C, shutting down");
        cancel_on_signal.cancel();
    });

    match driver.run(Duration::from_secs(args.interval_secs), cancel).await {
        Ok(()) => Ok(()),
        Err(amb_driver::driver::DriverError::Cancelled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
