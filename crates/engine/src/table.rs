use chainql_common::{Error, Result};
use chainql_rpc::parse_quantity;
use std::fmt;
use tracing::warn;

const BLOCK_COLUMNS: &[&str] = &[
    "blocknumber",
    "blockhash",
    "parenthash",
    "nonce",
    "sha3uncles",
    "logsbloom",
    "transactionsroot",
    "stateroot",
    "receiptsroot",
    "miner",
    "difficulty",
    "totaldifficulty",
    "extradata",
    "size",
    "gaslimit",
    "gasused",
    "timestamp",
    "transactioncount",
    "unclecount",
];

const TRANSACTION_COLUMNS: &[&str] = &[
    "hash",
    "nonce",
    "blockhash",
    "blocknumber",
    "transactionindex",
    "from",
    "to",
    "value",
    "gas",
    "gasprice",
    "input",
];

/// The record domains a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Blocks,
    Transactions,
}

/// The single RPC call that answers an equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    BlockByNumber(u64),
    BlockByHash(String),
    TransactionsInBlock(u64),
    TransactionByHash(String),
}

impl TableKind {
    pub fn from_name(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case("blocks") {
            Ok(TableKind::Blocks)
        } else if name.eq_ignore_ascii_case("transactions") {
            Ok(TableKind::Transactions)
        } else {
            warn!(table = name, "query on unknown table");
            Err(Error::UnknownTable(name.to_string()))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Blocks => "blocks",
            TableKind::Transactions => "transactions",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Blocks => BLOCK_COLUMNS,
            TableKind::Transactions => TRANSACTION_COLUMNS,
        }
    }

    /// Lowercased `column` if the table has it, `UnknownColumn` otherwise.
    pub fn column(&self, column: &str) -> Result<String> {
        let lowered = column.to_lowercase();
        if self.columns().contains(&lowered.as_str()) {
            Ok(lowered)
        } else {
            Err(Error::UnknownColumn { column: column.to_string(), table: self.name().to_string() })
        }
    }

    /// Maps `column = literal` onto a point lookup. Only `blocknumber` and
    /// `blockhash` (blocks) or `blocknumber` and `hash` (transactions) can
    /// be looked up.
    pub fn lookup(&self, column: &str, literal: &str) -> Result<Lookup> {
        let value = literal.trim_matches(|c| c == '\'' || c == '"');
        let lowered = column.to_lowercase();
        match (self, lowered.as_str()) {
            (TableKind::Blocks, "blocknumber") => {
                Ok(Lookup::BlockByNumber(parse_block_number(column, value)?))
            }
            (TableKind::Blocks, "blockhash") => Ok(Lookup::BlockByHash(value.to_string())),
            (TableKind::Transactions, "blocknumber") => {
                Ok(Lookup::TransactionsInBlock(parse_block_number(column, value)?))
            }
            (TableKind::Transactions, "hash") => Ok(Lookup::TransactionByHash(value.to_string())),
            _ => Err(Error::UnsupportedFilterColumn {
                column: column.to_string(),
                table: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_block_number(column: &str, value: &str) -> Result<u64> {
    let parsed = if value.starts_with("0x") || value.starts_with("0X") {
        parse_quantity(value).ok().and_then(|n| u64::try_from(n).ok())
    } else {
        value.parse::<u64>().ok()
    };
    parsed.ok_or_else(|| Error::InvalidFilterValue {
        column: column.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_case_insensitive() {
        assert_eq!(TableKind::from_name("BLOCKS").unwrap(), TableKind::Blocks);
        assert_eq!(TableKind::from_name("Transactions").unwrap(), TableKind::Transactions);
    }

    #[test]
    fn test_unknown_table_carries_name() {
        match TableKind::from_name("receipts") {
            Err(Error::UnknownTable(name)) => assert_eq!(name, "receipts"),
            other => panic!("Expected UnknownTable, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_routes_filter_columns() {
        assert_eq!(
            TableKind::Blocks.lookup("blockNumber", "1652339").unwrap(),
            Lookup::BlockByNumber(1_652_339)
        );
        assert_eq!(
            TableKind::Blocks.lookup("BlockHash", "'0xb1'").unwrap(),
            Lookup::BlockByHash("0xb1".to_string())
        );
        assert_eq!(
            TableKind::Transactions.lookup("blocknumber", "0x10").unwrap(),
            Lookup::TransactionsInBlock(16)
        );
        assert_eq!(
            TableKind::Transactions.lookup("hash", "\"0xt1\"").unwrap(),
            Lookup::TransactionByHash("0xt1".to_string())
        );
    }

    #[test]
    fn test_unfilterable_column_is_rejected() {
        match TableKind::Transactions.lookup("gas", "21000") {
            Err(Error::UnsupportedFilterColumn { column, table }) => {
                assert_eq!(column, "gas");
                assert_eq!(table, "transactions");
            }
            other => panic!("Expected UnsupportedFilterColumn, got {:?}", other),
        }
        // `hash` is the block identity column only under its `blockhash` name.
        assert!(TableKind::Blocks.lookup("hash", "'0xb1'").is_err());
    }

    #[test]
    fn test_bad_block_number_is_invalid_value() {
        assert!(matches!(
            TableKind::Blocks.lookup("blocknumber", "'latest'"),
            Err(Error::InvalidFilterValue { .. })
        ));
    }

    #[test]
    fn test_column_validation() {
        assert_eq!(TableKind::Transactions.column("GasPrice").unwrap(), "gasprice");
        assert!(matches!(
            TableKind::Blocks.column("gasprice"),
            Err(Error::UnknownColumn { .. })
        ));
    }
}
