use crate::plan::{
    CompareOp, FilterItem, FunctionArg, FunctionCall, HavingClause, OrderExpr, OrderItem,
    OrderingDirection, Predicate, Query, SelectExpr, SelectItem,
};
use crate::parse_sql;
use sqlparser::ast::{
    BinaryOperator, Expr as SqlExpr, FunctionArg as SqlFunctionArg, FunctionArgExpr,
    FunctionArguments, GroupByExpr, LimitClause, OrderByKind, Query as SqlQuery,
    SelectItem as SqlSelectItem, SetExpr, Statement, TableFactor,
};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PlanningError {
    #[error("SQL parsing error: {0}")]
    Parse(String),
    #[error("Exactly one statement is required, found {0}")]
    StatementCount(usize),
    #[error("Unsupported SQL statement: {0}")]
    UnsupportedStatement(String),
    #[error("Unsupported query structure: {0}")]
    UnsupportedQuery(String),
    #[error("No table found in FROM clause")]
    NoTableInFromClause,
    #[error("Unsupported table factor: {0}")]
    UnsupportedTableFactor(String),
    #[error("Expected exactly one table in FROM clause, found {0}")]
    MultipleTablesInFrom(usize),
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    #[error("Invalid LIMIT value: {0}")]
    InvalidLimit(String),
}

/// Turns SQL text into a [`Query`].
#[derive(Default)]
pub struct Planner {}

impl Planner {
    pub fn new() -> Self {
        Planner {}
    }

    pub fn sql_to_query(&self, sql: &str) -> Result<Query, PlanningError> {
        let statements = parse_sql(sql).map_err(|e| PlanningError::Parse(e.to_string()))?;
        if statements.len() != 1 {
            return Err(PlanningError::StatementCount(statements.len()));
        }
        self.plan_query(&statements[0])
    }

    pub fn plan_query(&self, statement: &Statement) -> Result<Query, PlanningError> {
        match statement {
            Statement::Query(query) => self.plan_sql_query(query),
            _ => Err(PlanningError::UnsupportedStatement(statement.to_string())),
        }
    }

    fn plan_sql_query(&self, query: &SqlQuery) -> Result<Query, PlanningError> {
        let select = match &*query.body {
            SetExpr::Select(select) => select,
            other => return Err(PlanningError::UnsupportedQuery(other.to_string())),
        };

        if select.from.is_empty() {
            return Err(PlanningError::NoTableInFromClause);
        }
        if select.from.len() != 1 {
            return Err(PlanningError::MultipleTablesInFrom(select.from.len()));
        }
        let table_with_joins = &select.from[0];
        if !table_with_joins.joins.is_empty() {
            return Err(PlanningError::UnsupportedQuery("JOINs are not supported".to_string()));
        }
        let from = match &table_with_joins.relation {
            TableFactor::Table { name, .. } => {
                name.to_string().trim_matches(|c| c == '"' || c == '`').to_string()
            }
            other => return Err(PlanningError::UnsupportedTableFactor(other.to_string())),
        };

        let projection = select
            .projection
            .iter()
            .map(|item| self.plan_select_item(item))
            .collect::<Result<Vec<_>, _>>()?;

        let selection = select
            .selection
            .as_ref()
            .map(|expr| self.plan_predicate(expr))
            .transpose()?;

        let group_by = match &select.group_by {
            GroupByExpr::Expressions(exprs, _) if exprs.is_empty() => None,
            GroupByExpr::Expressions(exprs, _) => Some(
                exprs
                    .iter()
                    .map(|expr| self.plan_column(expr))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            GroupByExpr::All(_) => {
                return Err(PlanningError::UnsupportedQuery("GROUP BY ALL".to_string()))
            }
        };

        let having = select.having.as_ref().map(|expr| self.plan_having(expr)).transpose()?;

        let order_by = match &query.order_by {
            None => None,
            Some(order_by) => match &order_by.kind {
                OrderByKind::Expressions(exprs) => Some(
                    exprs
                        .iter()
                        .map(|item| {
                            let direction = match item.options.asc {
                                Some(false) => OrderingDirection::Desc,
                                _ => OrderingDirection::Asc,
                            };
                            Ok(OrderItem { expr: self.plan_order_expr(&item.expr)?, direction })
                        })
                        .collect::<Result<Vec<_>, PlanningError>>()?,
                ),
                OrderByKind::All(_) => {
                    return Err(PlanningError::UnsupportedQuery("ORDER BY ALL".to_string()))
                }
            },
        };

        let limit = match &query.limit_clause {
            None => None,
            Some(LimitClause::LimitOffset { limit, offset: None, .. }) => {
                limit.as_ref().map(|expr| self.plan_limit(expr)).transpose()?
            }
            Some(other) => {
                return Err(PlanningError::UnsupportedQuery(format!("OFFSET in {}", other)))
            }
        };

        Ok(Query { projection, from, selection, group_by, having, order_by, limit })
    }

    fn plan_select_item(&self, item: &SqlSelectItem) -> Result<SelectItem, PlanningError> {
        match item {
            SqlSelectItem::UnnamedExpr(expr) => {
                Ok(SelectItem { expr: self.plan_select_expr(expr)?, alias: None })
            }
            SqlSelectItem::ExprWithAlias { expr, alias } => Ok(SelectItem {
                expr: self.plan_select_expr(expr)?,
                alias: Some(alias.value.clone()),
            }),
            SqlSelectItem::Wildcard(_) => Ok(SelectItem::wildcard()),
            other => Err(PlanningError::UnsupportedExpression(other.to_string())),
        }
    }

    fn plan_select_expr(&self, expr: &SqlExpr) -> Result<SelectExpr, PlanningError> {
        match expr {
            SqlExpr::Function(_) => Ok(SelectExpr::Function(self.plan_function(expr)?)),
            _ => Ok(SelectExpr::Column(self.plan_column(expr)?)),
        }
    }

    fn plan_order_expr(&self, expr: &SqlExpr) -> Result<OrderExpr, PlanningError> {
        match expr {
            SqlExpr::Function(_) => Ok(OrderExpr::Function(self.plan_function(expr)?)),
            _ => Ok(OrderExpr::Column(self.plan_column(expr)?)),
        }
    }

    fn plan_column(&self, expr: &SqlExpr) -> Result<String, PlanningError> {
        match expr {
            SqlExpr::Identifier(ident) => Ok(ident.value.clone()),
            SqlExpr::CompoundIdentifier(idents) => idents
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| PlanningError::UnsupportedExpression(expr.to_string())),
            SqlExpr::Nested(inner) => self.plan_column(inner),
            _ => Err(PlanningError::UnsupportedExpression(expr.to_string())),
        }
    }

    fn plan_function(&self, expr: &SqlExpr) -> Result<FunctionCall, PlanningError> {
        let function = match expr {
            SqlExpr::Function(function) => function,
            _ => return Err(PlanningError::UnsupportedExpression(expr.to_string())),
        };
        let args = match &function.args {
            FunctionArguments::List(list) if list.args.len() == 1 => &list.args,
            _ => return Err(PlanningError::UnsupportedExpression(expr.to_string())),
        };
        let arg = match &args[0] {
            SqlFunctionArg::Unnamed(FunctionArgExpr::Wildcard) => FunctionArg::Wildcard,
            SqlFunctionArg::Unnamed(FunctionArgExpr::Expr(inner)) => {
                FunctionArg::Column(self.plan_column(inner)?)
            }
            _ => return Err(PlanningError::UnsupportedExpression(expr.to_string())),
        };
        Ok(FunctionCall::new(function.name.to_string(), arg))
    }

    fn plan_predicate(&self, expr: &SqlExpr) -> Result<Predicate, PlanningError> {
        match expr {
            SqlExpr::Nested(inner) => self.plan_predicate(inner),
            SqlExpr::BinaryOp { left, op: BinaryOperator::And, right } => Ok(Predicate::and(
                self.plan_predicate(left)?,
                self.plan_predicate(right)?,
            )),
            SqlExpr::BinaryOp { left, op: BinaryOperator::Or, right } => Ok(Predicate::or(
                self.plan_predicate(left)?,
                self.plan_predicate(right)?,
            )),
            SqlExpr::BinaryOp { left, op: BinaryOperator::Eq, right } => {
                let (column, value) = match (left.as_ref(), right.as_ref()) {
                    (value @ SqlExpr::Value(_), column) => (column, value),
                    (column, value) => (column, value),
                };
                Ok(Predicate::Filter(FilterItem {
                    column: self.plan_column(column)?,
                    value: self.plan_literal(value)?,
                }))
            }
            SqlExpr::BinaryOp { op, .. } => Err(PlanningError::UnsupportedOperator(op.to_string())),
            _ => Err(PlanningError::UnsupportedExpression(expr.to_string())),
        }
    }

    fn plan_having(&self, expr: &SqlExpr) -> Result<HavingClause, PlanningError> {
        let (left, op, right) = match expr {
            SqlExpr::Nested(inner) => return self.plan_having(inner),
            SqlExpr::BinaryOp { left, op, right } => (left, op, right),
            _ => return Err(PlanningError::UnsupportedExpression(expr.to_string())),
        };
        let op = match op {
            BinaryOperator::Eq => CompareOp::Eq,
            BinaryOperator::NotEq => CompareOp::NotEq,
            BinaryOperator::Lt => CompareOp::Lt,
            BinaryOperator::LtEq => CompareOp::LtEq,
            BinaryOperator::Gt => CompareOp::Gt,
            BinaryOperator::GtEq => CompareOp::GtEq,
            _ => return Err(PlanningError::UnsupportedOperator(op.to_string())),
        };
        Ok(HavingClause {
            target: self.plan_order_expr(left)?,
            op,
            value: self.plan_literal(right)?,
        })
    }

    // Literals keep their source spelling, quotes included.
    fn plan_literal(&self, expr: &SqlExpr) -> Result<String, PlanningError> {
        match expr {
            SqlExpr::Value(_) => Ok(expr.to_string()),
            _ => Err(PlanningError::UnsupportedExpression(expr.to_string())),
        }
    }

    fn plan_limit(&self, expr: &SqlExpr) -> Result<u64, PlanningError> {
        expr.to_string()
            .parse::<u64>()
            .map_err(|_| PlanningError::InvalidLimit(expr.to_string()))
    }
}
