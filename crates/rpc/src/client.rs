use crate::types::{Block, Transaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Node returned error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Point lookups offered by a blockchain node.
#[async_trait::async_trait]
pub trait BlockchainClient: Send + Sync {
    async fn block_by_number(&self, number: u64) -> Result<Block, RpcError>;

    async fn block_by_hash(&self, hash: &str) -> Result<Block, RpcError>;

    /// Full transaction objects of the block at `number`.
    async fn transactions_in_block(&self, number: u64) -> Result<Vec<Transaction>, RpcError>;

    async fn transaction_by_hash(&self, hash: &str) -> Result<Transaction, RpcError>;
}
