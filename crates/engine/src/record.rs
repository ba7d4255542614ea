use chainql_common::Value;
use chainql_rpc::{Block, Transaction};

/// A raw record fetched from the node, before it becomes a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Block(Box<Block>),
    Transaction(Box<Transaction>),
}

impl Record {
    /// Identity used to match records across AND/OR operands.
    pub fn identity(&self) -> &str {
        match self {
            Record::Block(block) => &block.hash,
            Record::Transaction(tx) => &tx.hash,
        }
    }

    /// Cell value of `column` (lowercase), `None` for a column the record
    /// does not have.
    pub fn value(&self, column: &str) -> Option<Value> {
        match self {
            Record::Block(block) => block_value(block, column),
            Record::Transaction(tx) => transaction_value(tx, column),
        }
    }
}

impl From<Block> for Record {
    fn from(block: Block) -> Self {
        Record::Block(Box::new(block))
    }
}

impl From<Transaction> for Record {
    fn from(tx: Transaction) -> Self {
        Record::Transaction(Box::new(tx))
    }
}

fn block_value(block: &Block, column: &str) -> Option<Value> {
    let value: Value = match column {
        "blocknumber" => block.number.into(),
        "blockhash" => block.hash.as_str().into(),
        "parenthash" => block.parent_hash.as_str().into(),
        "nonce" => block.nonce.clone().into(),
        "sha3uncles" => block.sha3_uncles.as_str().into(),
        "logsbloom" => block.logs_bloom.clone().into(),
        "transactionsroot" => block.transactions_root.as_str().into(),
        "stateroot" => block.state_root.as_str().into(),
        "receiptsroot" => block.receipts_root.as_str().into(),
        "miner" => block.miner.as_str().into(),
        "difficulty" => block.difficulty.into(),
        "totaldifficulty" => block.total_difficulty.into(),
        "extradata" => block.extra_data.as_str().into(),
        "size" => block.size.into(),
        "gaslimit" => block.gas_limit.into(),
        "gasused" => block.gas_used.into(),
        "timestamp" => block.timestamp.into(),
        "transactioncount" => (block.transactions.len() as u64).into(),
        "unclecount" => (block.uncles.len() as u64).into(),
        _ => return None,
    };
    Some(value)
}

fn transaction_value(tx: &Transaction, column: &str) -> Option<Value> {
    let value: Value = match column {
        "hash" => tx.hash.as_str().into(),
        "nonce" => tx.nonce.into(),
        "blockhash" => tx.block_hash.clone().into(),
        "blocknumber" => tx.block_number.into(),
        "transactionindex" => tx.transaction_index.into(),
        "from" => tx.from.as_str().into(),
        "to" => tx.to.clone().into(),
        "value" => tx.value.into(),
        "gas" => tx.gas.into(),
        "gasprice" => tx.gas_price.into(),
        "input" => tx.input.as_str().into(),
        _ => return None,
    };
    Some(value)
}
