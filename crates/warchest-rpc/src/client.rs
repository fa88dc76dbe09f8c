//! JSON-RPC chain client.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::types::{RpcEnvelope, StatusResponse, ValidatorsResponse};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("rpc error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("response carried neither result nor error")]
    EmptyResult,
}

/// Boxed future returned by [`ChainClient`] methods.
pub type RpcFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RpcError>> + Send + 'a>>;

/// Read-only chain queries used by the poller.
pub trait ChainClient: Send + Sync {
    fn status(&self) -> RpcFuture<'_, StatusResponse>;
    fn validators(&self, block_height: u64) -> RpcFuture<'_, ValidatorsResponse>;
}

/// HTTP JSON-RPC 2.0 client.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("warchest/0.1")
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "warchest",
            "method": method,
            "params": params,
        });

        let resp = self.http.post(&self.url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(%method, %status, "rpc returned non-2xx");
            return Err(RpcError::Status(status.as_u16()));
        }

        let bytes = resp.bytes().await?;
        let envelope: RpcEnvelope<T> = serde_json::from_slice(&bytes)?;
        match (envelope.result, envelope.error) {
            (_, Some(err)) => Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcError::EmptyResult),
        }
    }
}

impl ChainClient for JsonRpcClient {
    fn status(&self) -> RpcFuture<'_, StatusResponse> {
        Box::pin(self.call("status", json!([])))
    }

    fn validators(&self, block_height: u64) -> RpcFuture<'_, ValidatorsResponse> {
        Box::pin(self.call("validators", json!([block_height])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closed_port_is_transport_error() {
        let client = JsonRpcClient::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let err = client.status().await.unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));
    }

    #[test]
    fn keeps_configured_url() {
        let client =
            JsonRpcClient::new("https://rpc.testnet.near.org", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url(), "https://rpc.testnet.near.org");
    }
}
