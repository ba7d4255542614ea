use crate::client::{BlockchainClient, RpcError};
use crate::types::{Block, Transaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: JsonValue,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 client for an Ethereum-compatible node over HTTP.
pub struct HttpClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint: endpoint.into(), next_id: AtomicU64::new(1) })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
        what: impl FnOnce() -> String,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "sending JSON-RPC request");
        let request = JsonRpcRequest { jsonrpc: "2.0", id, method, params };
        let body = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let response: JsonRpcResponse = serde_json::from_slice(&body)?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc { code: error.code, message: error.message });
        }
        match response.result {
            None | Some(JsonValue::Null) => Err(RpcError::NotFound(what())),
            Some(result) => Ok(serde_json::from_value(result)?),
        }
    }
}

#[async_trait::async_trait]
impl BlockchainClient for HttpClient {
    async fn block_by_number(&self, number: u64) -> Result<Block, RpcError> {
        self.call(
            "eth_getBlockByNumber",
            json!([format!("{:#x}", number), true]),
            || format!("block {}", number),
        )
        .await
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Block, RpcError> {
        self.call("eth_getBlockByHash", json!([hash, true]), || format!("block {}", hash))
            .await
    }

    async fn transactions_in_block(&self, number: u64) -> Result<Vec<Transaction>, RpcError> {
        Ok(self.block_by_number(number).await?.transactions)
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<Transaction, RpcError> {
        self.call("eth_getTransactionByHash", json!([hash]), || format!("transaction {}", hash))
            .await
    }
}
