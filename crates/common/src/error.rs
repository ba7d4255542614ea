use thiserror::Error;

/// Boxed cause carried by [`Error::UpstreamFetchFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for query execution.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Table {0} does not exist")]
    UnknownTable(String),
    #[error("Query on table {0} without a WHERE clause is not supported")]
    MissingWhereClause(String),
    #[error("Column {column} is not filterable on table {table}")]
    UnsupportedFilterColumn { column: String, table: String },
    #[error("Logical operation expects two boolean expressions, found {0}")]
    InvalidOperatorArity(usize),
    #[error("Alias {0} is ambiguous")]
    AmbiguousAlias(String),
    #[error("Column {0} must appear in the GROUP BY clause or be used in an aggregate function")]
    GroupByProjectionMismatch(String),
    #[error("ORDER BY column {0} must appear in the GROUP BY clause")]
    GroupByOrderMismatch(String),
    #[error("Failed to fetch {what} from node: {source}")]
    UpstreamFetchFailure {
        what: String,
        #[source]
        source: BoxError,
    },
    #[error("Column {column} does not exist in table {table}")]
    UnknownColumn { column: String, table: String },
    #[error("Invalid value {value} for column {column}")]
    InvalidFilterValue { column: String, value: String },
    #[error("Function {0} is not supported")]
    UnsupportedFunction(String),
    #[error("Execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn upstream(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::UpstreamFetchFailure { what: what.into(), source: source.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_upstream_failure_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "node stalled");
        let err = Error::upstream("block 1652339", io);
        assert_eq!(err.to_string(), "Failed to fetch block 1652339 from node: node stalled");
        assert_eq!(err.source().map(|s| s.to_string()), Some("node stalled".to_string()));
    }

    #[test]
    fn test_messages_name_offending_item() {
        let err = Error::UnsupportedFilterColumn {
            column: "gas".to_string(),
            table: "transactions".to_string(),
        };
        assert_eq!(err.to_string(), "Column gas is not filterable on table transactions");
        assert_eq!(Error::AmbiguousAlias("x".into()).to_string(), "Alias x is ambiguous");
    }
}
