pub mod plan;
pub mod planner;

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::{Parser, ParserError};

pub use plan::{
    CompareOp, FilterItem, FunctionArg, FunctionCall, HavingClause, LogicalOperation,
    LogicalOperator, OrderExpr, OrderItem, OrderingDirection, Predicate, Query, SelectExpr,
    SelectItem,
};
pub use planner::{Planner, PlanningError};

/// Parses a SQL string into a vector of statements.
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, ParserError> {
    let dialect = GenericDialect {};
    Parser::parse_sql(&dialect, sql)
}
