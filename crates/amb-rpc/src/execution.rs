//! Execution-layer JSON-RPC client: `eth_getLogs`, `eth_getProof`,
//! `eth_call`, `eth_getBlockByHash`, `eth_getTransactionReceipt`, and the
//! transaction-submission primitives `eth_chainId`/`eth_getTransactionCount`/
//! `eth_estimateGas`/`eth_sendRawTransaction`, grounded in
//! `oracle/cmd/amb/execute_storage`'s and `oracle/sender/sender.go`'s use of
//! `go-ethereum`'s `ethclient.Client`/`gethclient.Client`.

use crate::error::RpcError;
use crate::types::*;
use std::time::Duration;

pub struct ExecutionClient {
    url: String,
    http: reqwest::Client,
    next_id: std::sync::atomic::AtomicU64,
}

impl ExecutionClient {
    pub fn new(url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("reqwest client builds");
        Self { url: url.into(), http, next_id: std::sync::atomic::AtomicU64::new(1) }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let req = JsonRpcRequest { jsonrpc: "2.0", method, params, id };
        let res = self.http.post(&self.url).json(&req).send().await?;
        let body: JsonRpcResponse<T> = res.json().await.map_err(|e| RpcError::decode(e.to_string()))?;
        if let Some(err) = body.error {
            return Err(RpcError::JsonRpc { code: err.code, message: err.message });
        }
        body.result.ok_or_else(|| RpcError::decode("missing result"))
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let hex: String = self.call("eth_chainId", serde_json::json!([])).await?;
        crate::hexutil::decode_u64(&hex)
    }

    pub async fn nonce_at(&self, address: [u8; 20]) -> Result<u64, RpcError> {
        let hex: String = self
            .call("eth_getTransactionCount", serde_json::json!([crate::hexutil::encode_bytes(&address), "pending"]))
            .await?;
        crate::hexutil::decode_u64(&hex)
    }

    pub async fn estimate_gas(
        &self,
        from: [u8; 20],
        to: [u8; 20],
        data: &[u8],
    ) -> Result<u64, RpcError> {
        let hex: String = self
            .call(
                "eth_estimateGas",
                serde_json::json!([{
                    "from": crate::hexutil::encode_bytes(&from),
                    "to": crate::hexutil::encode_bytes(&to),
                    "data": crate::hexutil::encode_bytes(data),
                }]),
            )
            .await?;
        crate::hexutil::decode_u64(&hex)
    }

    pub async fn call_contract(&self, to: [u8; 20], data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let hex: String = self
            .call(
                "eth_call",
                serde_json::json!([{
                    "to": crate::hexutil::encode_bytes(&to),
                    "data": crate::hexutil::encode_bytes(data),
                }, "latest"]),
            )
            .await?;
        crate::hexutil::decode_bytes(&hex)
    }

    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<[u8; 32], RpcError> {
        let hex: String =
            self.call("eth_sendRawTransaction", serde_json::json!([crate::hexutil::encode_bytes(raw)])).await?;
        crate::hexutil::decode_hash(&hex)
    }

    pub async fn transaction_receipt(&self, tx_hash: [u8; 32]) -> Result<Option<TransactionReceipt>, RpcError> {
        self.call("eth_getTransactionReceipt", serde_json::json!([crate::hexutil::encode_bytes(&tx_hash)])).await
    }

    pub async fn get_logs(
        &self,
        address: [u8; 20],
        topics: Vec<Option<[u8; 32]>>,
    ) -> Result<Vec<LogEntry>, RpcError> {
        let topics_json: Vec<serde_json::Value> = topics
            .into_iter()
            .map(|t| match t {
                Some(h) => serde_json::Value::String(crate::hexutil::encode_bytes(&h)),
                None => serde_json::Value::Null,
            })
            .collect();
        self.call(
            "eth_getLogs",
            serde_json::json!([{
                "address": crate::hexutil::encode_bytes(&address),
                "topics": topics_json,
                "fromBlock": "earliest",
                "toBlock": "latest",
            }]),
        )
        .await
    }

    /// Full block with transaction objects, so callers can walk
    /// `transactions[i].hash` and fetch each one's receipt in turn — the
    /// same sequence `execute_log/main.go` uses to rebuild a block's
    /// receipts trie.
    pub async fn block_by_hash(&self, hash: [u8; 32]) -> Result<ExecutionBlock, RpcError> {
        self.call("eth_getBlockByHash", serde_json::json!([crate::hexutil::encode_bytes(&hash), true])).await
    }

    /// EIP-1186 account + storage proof. The node lists it returns are
    /// forwarded to the target-chain contract unmodified, exactly as
    /// `execute_storage/main.go`'s `transformProof` does — this crate never
    /// walks or verifies the trie itself for the storage path.
    pub async fn get_proof(
        &self,
        address: [u8; 20],
        storage_keys: &[[u8; 32]],
        block_number: u64,
    ) -> Result<EthGetProofResult, RpcError> {
        let keys: Vec<String> = storage_keys.iter().map(crate::hexutil::encode_bytes).collect();
        self.call(
            "eth_getProof",
            serde_json::json!([crate::hexutil::encode_bytes(&address), keys, format!("0x{block_number:x}")]),
        )
        .await
    }
}
