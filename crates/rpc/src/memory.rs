use crate::client::{BlockchainClient, RpcError};
use crate::types::{Block, Transaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A node held in memory. Serves the same lookups as a real node and counts
/// the calls it receives.
#[derive(Default)]
pub struct MemoryClient {
    blocks: Vec<Block>,
    by_number: HashMap<u64, usize>,
    by_hash: HashMap<String, usize>,
    transactions: HashMap<String, Transaction>,
    calls: AtomicUsize,
}

impl MemoryClient {
    pub fn new(blocks: Vec<Block>) -> Self {
        let mut client = MemoryClient::default();
        for block in blocks {
            client.insert_block(block);
        }
        client
    }

    /// Loads a JSON array of blocks in node format.
    pub fn from_json(json: &str) -> Result<Self, RpcError> {
        let blocks: Vec<Block> = serde_json::from_str(json)?;
        Ok(Self::new(blocks))
    }

    pub fn insert_block(&mut self, block: Block) {
        let index = self.blocks.len();
        for tx in &block.transactions {
            self.transactions.insert(tx.hash.to_lowercase(), tx.clone());
        }
        self.by_number.insert(block.number, index);
        self.by_hash.insert(block.hash.to_lowercase(), index);
        self.blocks.push(block);
    }

    /// Number of lookups served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn block_at(&self, number: u64) -> Result<&Block, RpcError> {
        self.by_number
            .get(&number)
            .map(|&index| &self.blocks[index])
            .ok_or_else(|| RpcError::NotFound(format!("block {}", number)))
    }
}

#[async_trait::async_trait]
impl BlockchainClient for MemoryClient {
    async fn block_by_number(&self, number: u64) -> Result<Block, RpcError> {
        self.record_call();
        self.block_at(number).cloned()
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Block, RpcError> {
        self.record_call();
        self.by_hash
            .get(&hash.to_lowercase())
            .map(|&index| self.blocks[index].clone())
            .ok_or_else(|| RpcError::NotFound(format!("block {}", hash)))
    }

    async fn transactions_in_block(&self, number: u64) -> Result<Vec<Transaction>, RpcError> {
        self.record_call();
        Ok(self.block_at(number)?.transactions.clone())
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<Transaction, RpcError> {
        self.record_call();
        self.transactions
            .get(&hash.to_lowercase())
            .cloned()
            .ok_or_else(|| RpcError::NotFound(format!("transaction {}", hash)))
    }
}
