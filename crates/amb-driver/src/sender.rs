//! Transaction signing and submission against the target EVM chain,
//! grounded in `oracle/sender/sender.go`'s `TxSender`: track a nonce
//! locally, estimate gas when the caller doesn't pin it, sign an EIP-1559
//! transaction, and poll for its receipt.
//!
//! Unlike the original, which decrypts a Web3 Secret Storage keystore via
//! `go-ethereum/accounts/keystore`, this driver reads a raw hex-encoded
//! private key from disk (see `config::Eth1Config::private_key_file`) —
//! keystore decryption is a large, security-sensitive feature orthogonal to
//! bridging logic, and plenty of production relayers take the key directly
//! from an operator-managed secret instead.

use amb_rpc::ExecutionClient;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("can't read private key file: {0}")]
    ReadKey(#[from] std::io::Error),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("signing failed: {0}")]
    Sign(String),
    #[error(transparent)]
    Rpc(#[from] amb_rpc::RpcError),
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

pub fn load_signing_key(path: &str) -> Result<SigningKey, SenderError> {
    let raw = std::fs::read_to_string(path)?;
    let hex_str = raw.trim().strip_prefix("0x").unwrap_or(raw.trim());
    let bytes = hex::decode(hex_str).map_err(|e| SenderError::InvalidKey(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| SenderError::InvalidKey(e.to_string()))
}

pub fn address_from_signing_key(key: &SigningKey) -> [u8; 20] {
    let point = key.verifying_key().to_encoded_point(false);
    let uncompressed = point.as_bytes();
    let hash = keccak256(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..32]);
    out
}

/// An unsigned EIP-1559 (type 2) transaction request, mirroring
/// `go-ethereum/core/types.DynamicFeeTx`'s fields used by this driver
/// (no `value`, no access list beyond the empty default).
pub struct TxRequest {
    pub to: [u8; 20],
    pub data: Vec<u8>,
    pub gas: Option<u64>,
}

pub struct TxSender {
    client: ExecutionClient,
    signing_key: SigningKey,
    address: [u8; 20],
    chain_id: u64,
    nonce: u64,
    max_fee_per_gas: u64,
    max_priority_fee_per_gas: u64,
}

impl TxSender {
    pub async fn new(
        client: ExecutionClient,
        signing_key: SigningKey,
        max_fee_per_gas: u64,
        max_priority_fee_per_gas: u64,
    ) -> Result<Self, SenderError> {
        let address = address_from_signing_key(&signing_key);
        let chain_id = client.chain_id().await?;
        let nonce = client.nonce_at(address).await?;
        Ok(Self {
            client,
            signing_key,
            address,
            chain_id,
            nonce,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }

    pub fn address(&self) -> [u8; 20] {
        self.address
    }

    /// Read-only access to the underlying execution client, for callers
    /// that need a plain `eth_call` (e.g. the driver loop's `headSlot()`
    /// check) without going through the signing/nonce machinery.
    pub fn client(&self) -> &ExecutionClient {
        &self.client
    }

    /// Signs and submits `req`, advancing the locally tracked nonce on
    /// success, matching `TxSender.SendTx`'s gas-estimate-then-sign flow.
    pub async fn send_tx(&mut self, req: TxRequest) -> Result<[u8; 32], SenderError> {
        let gas = match req.gas {
            Some(g) => g,
            None => {
                let estimated = self.client.estimate_gas(self.address, req.to, &req.data).await?;
                estimated * 3 / 2
            }
        };

        let unsigned = UnsignedTx {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: gas,
            to: req.to,
            data: req.data,
        };
        let raw = unsigned.sign_and_encode(&self.signing_key)?;
        let tx_hash = keccak256(&raw);
        self.client.send_raw_transaction(&raw).await?;
        self.nonce += 1;
        Ok(tx_hash)
    }

    /// Polls `eth_getTransactionReceipt` every 5 seconds until the receipt
    /// appears, matching `TxSender.WaitReceipt`'s unbounded retry loop.
    pub async fn wait_receipt(
        &self,
        tx_hash: [u8; 32],
    ) -> Result<amb_rpc::types::TransactionReceipt, SenderError> {
        loop {
            if let Some(receipt) = self.client.transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        }
    }
}

struct UnsignedTx {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u64,
    max_fee_per_gas: u64,
    gas_limit: u64,
    to: [u8; 20],
    data: Vec<u8>,
}

impl UnsignedTx {
    fn rlp_fields(&self, stream: &mut rlp::RlpStream) {
        stream.append(&self.chain_id);
        stream.append(&self.nonce);
        stream.append(&self.max_priority_fee_per_gas);
        stream.append(&self.max_fee_per_gas);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_slice());
        stream.append(&0u64); // value
        stream.append(&self.data);
        stream.begin_list(0); // access_list
    }

    fn sighash(&self) -> [u8; 32] {
        let mut stream = rlp::RlpStream::new_list(9);
        self.rlp_fields(&mut stream);
        let mut payload = vec![0x02u8];
        payload.extend_from_slice(&stream.out());
        keccak256(&payload)
    }

    fn sign_and_encode(&self, key: &SigningKey) -> Result<Vec<u8>, SenderError> {
        let hash = self.sighash();
        let (signature, recovery_id): (Signature, RecoveryId) =
            key.sign_prehash_recoverable(&hash).map_err(|e| SenderError::Sign(e.to_string()))?;

        let mut stream = rlp::RlpStream::new_list(12);
        self.rlp_fields(&mut stream);
        stream.append(&(recovery_id.to_byte() as u64));
        stream.append(&signature.r().to_bytes().as_slice());
        stream.append(&signature.s().to_bytes().as_slice());

        let mut out = vec![0x02u8];
        out.extend_from_slice(&stream.out());
        Ok(out)
    }
}
