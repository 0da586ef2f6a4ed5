//! Transport-level error types for the beacon and execution clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned 404/400")]
    NotFound,
    #[error("unexpected status code {0}")]
    BadStatus(u16),
    #[error("response body did not decode: {0}")]
    Decode(String),
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },
}

impl RpcError {
    pub fn decode(msg: impl Into<String>) -> Self {
        RpcError::Decode(msg.into())
    }
}
