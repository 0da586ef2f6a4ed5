//! YAML configuration, matching `oracle/config/config.go`'s `Config` shape:
//! an `eth1` side (the target EVM chain the driver submits transactions to)
//! and an `eth2` side (the beacon chain light-client updates are sourced
//! from). Unknown fields are rejected, matching the Go loader's
//! `dec.KnownFields(true)`.

use amb_core::types::{GenesisConfig, SpecConfig};
use amb_rpc::hexutil;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("can't parse yaml config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("bad hex value in config: {0}")]
    Hex(#[from] amb_rpc::RpcError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigYaml {
    eth1: Option<Eth1ConfigYaml>,
    eth2: Eth2ConfigYaml,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct Eth1ConfigYaml {
    client: HttpClientConfig,
    contract: String,
    /// Path to a file holding a raw hex-encoded secp256k1 private key.
    /// The original oracle decrypts a Web3 Secret Storage keystore here;
    /// this driver expects the key already in plaintext on disk, which
    /// keeps `amb-driver` from having to implement scrypt/AES keystore
    /// decryption for a feature orthogonal to the bridging logic itself.
    private_key_file: String,
    /// `max_priority_fee_per_gas`, in wei. The original oracle hard-codes
    /// this to 1 gwei in `sender.go`; this driver makes it configurable
    /// and keeps the same 1 gwei default.
    #[serde(default = "default_gas_fee_wei")]
    gas_tip_cap: u64,
    /// `max_fee_per_gas`, in wei, same treatment as `gas_tip_cap`.
    #[serde(default = "default_gas_fee_wei")]
    gas_fee_cap: u64,
}

fn default_gas_fee_wei() -> u64 {
    1_000_000_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct Eth2ConfigYaml {
    client: HttpClientConfig,
    genesis: Option<GenesisConfigYaml>,
    spec: Option<SpecConfigYaml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct HttpClientConfig {
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct GenesisConfigYaml {
    #[serde(rename = "GENESIS_TIME")]
    genesis_time: u64,
    #[serde(rename = "GENESIS_VALIDATORS_ROOT")]
    genesis_validators_root: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpecConfigYaml {
    #[serde(rename = "SECONDS_PER_SLOT")]
    seconds_per_slot: u64,
    #[serde(rename = "SLOTS_PER_EPOCH")]
    slots_per_epoch: u64,
    #[serde(rename = "ALTAIR_FORK_EPOCH")]
    altair_fork_epoch: u64,
    #[serde(rename = "ALTAIR_FORK_VERSION")]
    altair_fork_version: String,
    #[serde(rename = "BELLATRIX_FORK_EPOCH")]
    bellatrix_fork_epoch: u64,
    #[serde(rename = "BELLATRIX_FORK_VERSION")]
    bellatrix_fork_version: String,
    #[serde(rename = "EPOCHS_PER_SYNC_COMMITTEE_PERIOD")]
    epochs_per_sync_committee_period: u64,
    #[serde(rename = "SYNC_COMMITTEE_SIZE")]
    sync_committee_size: usize,
    #[serde(rename = "VALIDATOR_REGISTRY_LIMIT")]
    validator_registry_limit: usize,
    #[serde(rename = "HISTORICAL_ROOTS_LIMIT")]
    historical_roots_limit: usize,
    #[serde(rename = "EPOCHS_PER_ETH1_VOTING_PERIOD")]
    epochs_per_eth1_voting_period: u64,
    #[serde(rename = "SLOTS_PER_HISTORICAL_ROOT", default = "default_slots_per_historical_root")]
    slots_per_historical_root: u64,
}

fn default_slots_per_historical_root() -> u64 {
    8192
}

pub struct Eth1Config {
    pub url: String,
    pub contract: [u8; 20],
    pub private_key_file: String,
    pub gas_tip_cap: u64,
    pub gas_fee_cap: u64,
}

pub struct Eth2Config {
    pub url: String,
    pub genesis: Option<GenesisConfig>,
    pub spec: Option<SpecConfig>,
}

pub struct Config {
    pub eth1: Option<Eth1Config>,
    pub eth2: Eth2Config,
}

pub fn read_from_file(path: &str) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let raw: ConfigYaml = serde_yaml::from_str(&contents)?;
    Ok(Config {
        eth1: raw.eth1.map(convert_eth1).transpose()?,
        eth2: convert_eth2(raw.eth2)?,
    })
}

fn convert_eth1(raw: Eth1ConfigYaml) -> Result<Eth1Config, ConfigError> {
    Ok(Eth1Config {
        url: raw.client.url,
        contract: hexutil::decode_address(&raw.contract)?,
        private_key_file: raw.private_key_file,
        gas_tip_cap: raw.gas_tip_cap,
        gas_fee_cap: raw.gas_fee_cap,
    })
}

fn convert_eth2(raw: Eth2ConfigYaml) -> Result<Eth2Config, ConfigError> {
    Ok(Eth2Config {
        url: raw.client.url,
        genesis: raw
            .genesis
            .map(|g| -> Result<GenesisConfig, ConfigError> {
                Ok(GenesisConfig {
                    genesis_time: g.genesis_time,
                    genesis_validators_root: hexutil::decode_hash(&g.genesis_validators_root)?,
                })
            })
            .transpose()?,
        spec: raw
            .spec
            .map(|s| -> Result<SpecConfig, ConfigError> {
                Ok(SpecConfig {
                    seconds_per_slot: s.seconds_per_slot,
                    slots_per_epoch: s.slots_per_epoch,
                    altair_fork_epoch: s.altair_fork_epoch,
                    altair_fork_version: hexutil::decode_fork_version(&s.altair_fork_version)?,
                    bellatrix_fork_epoch: s.bellatrix_fork_epoch,
                    bellatrix_fork_version: hexutil::decode_fork_version(&s.bellatrix_fork_version)?,
                    epochs_per_sync_committee_period: s.epochs_per_sync_committee_period,
                    sync_committee_size: s.sync_committee_size,
                    validator_registry_limit: s.validator_registry_limit,
                    historical_roots_limit: s.historical_roots_limit,
                    epochs_per_eth1_voting_period: s.epochs_per_eth1_voting_period,
                    slots_per_historical_root: s.slots_per_historical_root,
                })
            })
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_top_level_fields() {
        let yaml = "eth1:\n  client:\n    url: http://localhost\n  contract: \"0x0000000000000000000000000000000000000000\"\n  private_key_file: ./key.hex\neth2:\n  client:\n    url: http://localhost\nbogus: true\n";
        let err = serde_yaml::from_str::<ConfigYaml>(yaml).unwrap_err();
        assert!(err.to_string().contains("bogus") || err.to_string().contains("unknown field"));
    }

    #[test]
    fn parses_minimal_config() {
        let yaml = "eth2:\n  client:\n    url: http://localhost:5052\n";
        let raw: ConfigYaml = serde_yaml::from_str(yaml).unwrap();
        assert!(raw.eth1.is_none());
        assert_eq!(raw.eth2.client.url, "http://localhost:5052");
    }
}
