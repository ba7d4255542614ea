//! Engine crate
//!
//! Executes planned queries against a blockchain node that only answers
//! point lookups. Filters become RPC calls combined with set algebra over
//! record hashes; grouping, ordering and limiting happen client-side.
//!
//! # Example
//! ```rust
//! use chainql_engine::QueryEngine;
//! use chainql_rpc::MemoryClient;
//! use chainql_sql::Planner;
//! use std::sync::Arc;
//!
//! let engine = QueryEngine::new(Arc::new(MemoryClient::default()));
//! let query = Planner::new().sql_to_query("SELECT hash FROM transactions").unwrap();
//! let result = futures::executor::block_on(engine.execute(&query));
//! assert!(result.is_err(), "queries need a WHERE clause");
//! ```

pub mod convert;
pub mod grouping;
pub mod ordering;
pub mod predicate;
pub mod reader;
pub mod record;
pub mod result;
pub mod table;

pub use convert::{ConvertedRows, HavingFilter};
pub use ordering::{build_order_spec, OrderSpec};
pub use reader::{read_plan, AliasMap, PlanParts};
pub use record::Record;
pub use result::ResultTable;
pub use table::{Lookup, TableKind};

use chainql_common::{Error, Result};
use chainql_rpc::BlockchainClient;
use chainql_sql::Query;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs queries against one node.
#[derive(Clone)]
pub struct QueryEngine {
    client: Arc<dyn BlockchainClient>,
}

impl QueryEngine {
    pub fn new(client: Arc<dyn BlockchainClient>) -> Self {
        QueryEngine { client }
    }

    pub async fn execute(&self, query: &Query) -> Result<ResultTable> {
        let parts = read_plan(query)?;
        let table = TableKind::from_name(parts.table_name)?;
        let selection = parts
            .selection
            .ok_or_else(|| Error::MissingWhereClause(table.name().to_string()))?;

        let records = predicate::evaluate(self.client.as_ref(), table, selection).await?;
        info!(%table, records = records.len(), "fetched records");

        let selected_columns = parts.selected_columns_for(table);
        let order = build_order_spec(
            parts.order_by.unwrap_or_default(),
            &selected_columns,
            &parts.aliases,
        );

        let converted = if parts.is_grouped() {
            grouping::group(&records, &parts, table, &order)?
        } else if parts.having.is_some() {
            return Err(Error::Execution(
                "HAVING requires GROUP BY or an aggregate in the select list".to_string(),
            ));
        } else {
            convert::convert(&records, table, parts.select_items, &order.extra_columns)?
        };
        debug!(rows = converted.rows.len(), columns = converted.columns.len(), "converted records");

        let mut result = ResultTable::new(table, converted, parts.aliases.clone());
        result.order(&order)?;
        if let Some(limit) = parts.limit {
            result.limit(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        result.project();
        Ok(result)
    }
}
