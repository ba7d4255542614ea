use crate::record::Record;
use crate::table::{Lookup, TableKind};
use chainql_common::{Error, Result};
use chainql_rpc::BlockchainClient;
use chainql_sql::{FilterItem, LogicalOperator, Predicate};
use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Evaluates a WHERE tree into records. Logical nodes resolve their first
/// operand completely before starting the second.
pub fn evaluate<'a>(
    client: &'a dyn BlockchainClient,
    table: TableKind,
    predicate: &'a Predicate,
) -> BoxFuture<'a, Result<Vec<Record>>> {
    async move {
        match predicate {
            Predicate::Filter(filter) => evaluate_filter(client, table, filter).await,
            Predicate::Logical(operation) => {
                if operation.operands.len() != 2 {
                    return Err(Error::InvalidOperatorArity(operation.operands.len()));
                }
                let first = evaluate(client, table, &operation.operands[0]).await?;
                let second = evaluate(client, table, &operation.operands[1]).await?;
                let (left, right) = (first.len(), second.len());
                let combined = combine(operation.op, first, second);
                debug!(op = ?operation.op, left, right, result = combined.len(), "combined operands");
                Ok(combined)
            }
        }
    }
    .boxed()
}

async fn evaluate_filter(
    client: &dyn BlockchainClient,
    table: TableKind,
    filter: &FilterItem,
) -> Result<Vec<Record>> {
    match table.lookup(&filter.column, &filter.value)? {
        Lookup::BlockByNumber(number) => {
            info!(number, "getting block");
            let block = client
                .block_by_number(number)
                .await
                .map_err(|e| Error::upstream(format!("block {}", number), e))?;
            Ok(vec![block.into()])
        }
        Lookup::BlockByHash(hash) => {
            info!(%hash, "getting block by hash");
            let block = client
                .block_by_hash(&hash)
                .await
                .map_err(|e| Error::upstream(format!("block {}", hash), e))?;
            Ok(vec![block.into()])
        }
        Lookup::TransactionsInBlock(number) => {
            info!(number, "getting transactions stored in block");
            let transactions = client
                .transactions_in_block(number)
                .await
                .map_err(|e| Error::upstream(format!("transactions of block {}", number), e))?;
            Ok(transactions.into_iter().map(Record::from).collect())
        }
        Lookup::TransactionByHash(hash) => {
            info!(%hash, "getting transaction by hash");
            let tx = client
                .transaction_by_hash(&hash)
                .await
                .map_err(|e| Error::upstream(format!("transaction {}", hash), e))?;
            Ok(vec![tx.into()])
        }
    }
}

/// Identity-keyed set algebra over two operand results.
///
/// AND keeps, in the first operand's order, the second operand's record
/// for every identity both sides share. OR keeps the first operand's
/// records followed by the second operand's records with new identities.
/// A repeated identity within one side keeps its first position and its
/// last record.
pub fn combine(op: LogicalOperator, first: Vec<Record>, second: Vec<Record>) -> Vec<Record> {
    let first = index_by_identity(first);
    let mut second = index_by_identity(second);
    match op {
        LogicalOperator::And => first.keys().filter_map(|id| second.swap_remove(id)).collect(),
        LogicalOperator::Or => {
            second.retain(|id, _| !first.contains_key(id));
            first.into_values().chain(second.into_values()).collect()
        }
    }
}

fn index_by_identity(records: Vec<Record>) -> IndexMap<String, Record> {
    let mut index = IndexMap::with_capacity(records.len());
    for record in records {
        index.insert(record.identity().to_string(), record);
    }
    index
}
