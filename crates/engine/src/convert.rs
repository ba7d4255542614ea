//! Record-to-row conversion.
//!
//! Turns fetched records into rows of [`Value`]s for the selected columns,
//! either one row per record or one row per group with aggregates computed.
//! Columns needed only for ordering or HAVING are appended after the
//! projected ones and dropped again by [`crate::ResultTable::project`].

use crate::record::Record;
use crate::table::TableKind;
use chainql_common::{Error, Result, Value};
use chainql_sql::{CompareOp, FunctionArg, FunctionCall, OrderExpr, SelectExpr, SelectItem};
use indexmap::IndexMap;
use std::cmp::Ordering;

/// Rows plus the layout of their columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRows {
    pub rows: Vec<Vec<Value>>,
    /// Canonical column names in row order.
    pub columns: Vec<String>,
    /// Header per column: the alias if one was given, else the column name.
    pub labels: Vec<String>,
    /// Number of leading columns that belong to the final projection.
    pub projected: usize,
}

impl ConvertedRows {
    pub fn column_index(&self) -> IndexMap<String, usize> {
        let mut index = IndexMap::with_capacity(self.columns.len());
        for (position, column) in self.columns.iter().enumerate() {
            index.entry(column.clone()).or_insert(position);
        }
        index
    }
}

/// One row per record.
pub fn convert(
    records: &[Record],
    table: TableKind,
    select_items: &[SelectItem],
    extra_columns: &[OrderExpr],
) -> Result<ConvertedRows> {
    let mut layout = Layout::default();
    for item in select_items {
        match &item.expr {
            SelectExpr::Column(name) => {
                let column = table.column(name)?;
                layout.push(column, item.alias.clone(), Cell::Column);
            }
            SelectExpr::Wildcard => {
                for column in table.columns() {
                    layout.push(column.to_string(), None, Cell::Column);
                }
            }
            SelectExpr::Function(call) => {
                return Err(Error::Execution(format!(
                    "aggregate {} requires grouping",
                    call.column_name()
                )))
            }
        }
    }
    layout.projected = layout.columns.len();
    for extra in extra_columns {
        match extra {
            OrderExpr::Column(name) => {
                let column = table.column(name)?;
                if !layout.contains(&column) {
                    layout.push(column, None, Cell::Column);
                }
            }
            OrderExpr::Function(call) => {
                return Err(Error::Execution(format!(
                    "aggregate {} requires grouping",
                    call.column_name()
                )))
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            layout
                .columns
                .iter()
                .map(|column| record.value(column).unwrap_or(Value::Null))
                .collect()
        })
        .collect();
    Ok(layout.finish(rows))
}

/// One row per distinct `group_by` key, in first-seen key order. Without
/// group columns all records form a single group, even when there are none.
pub fn convert_grouped(
    records: &[Record],
    table: TableKind,
    select_items: &[SelectItem],
    group_by: &[String],
    extra_columns: &[OrderExpr],
    having: Option<&HavingFilter>,
) -> Result<ConvertedRows> {
    let mut layout = Layout::default();
    for item in select_items {
        match &item.expr {
            SelectExpr::Column(name) => {
                let column = table.column(name)?;
                layout.push(column, item.alias.clone(), Cell::Column);
            }
            SelectExpr::Wildcard => {
                for column in table.columns() {
                    layout.push(column.to_string(), None, Cell::Column);
                }
            }
            SelectExpr::Function(call) => {
                let aggregate = Aggregate::new(call, table)?;
                layout.push(call.column_name(), item.alias.clone(), Cell::Aggregate(aggregate));
            }
        }
    }
    layout.projected = layout.columns.len();
    for extra in extra_columns {
        let (column, cell) = match extra {
            OrderExpr::Column(name) => (table.column(name)?, Cell::Column),
            OrderExpr::Function(call) => {
                (call.column_name(), Cell::Aggregate(Aggregate::new(call, table)?))
            }
        };
        if !layout.contains(&column) {
            layout.push(column, None, cell);
        }
    }

    let mut groups: IndexMap<Vec<Value>, Vec<&Record>> = IndexMap::new();
    for record in records {
        let key = group_by
            .iter()
            .map(|column| record.value(column).unwrap_or(Value::Null))
            .collect();
        groups.entry(key).or_default().push(record);
    }
    if group_by.is_empty() && groups.is_empty() {
        groups.insert(Vec::new(), Vec::new());
    }

    let having = having
        .map(|filter| {
            layout
                .position(&filter.column)
                .map(|position| (position, filter))
                .ok_or_else(|| Error::UnknownColumn {
                    column: filter.column.clone(),
                    table: table.name().to_string(),
                })
        })
        .transpose()?;

    let mut rows = Vec::with_capacity(groups.len());
    for members in groups.values() {
        let row = layout
            .cells
            .iter()
            .zip(&layout.columns)
            .map(|(cell, column)| match cell {
                Cell::Column => Ok(members
                    .first()
                    .and_then(|record| record.value(column))
                    .unwrap_or(Value::Null)),
                Cell::Aggregate(aggregate) => aggregate.evaluate(members),
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some((position, filter)) = &having {
            if !filter.matches(&row[*position]) {
                continue;
            }
        }
        rows.push(row);
    }
    Ok(layout.finish(rows))
}

#[derive(Debug, Clone)]
enum Cell {
    Column,
    Aggregate(Aggregate),
}

#[derive(Debug, Default)]
struct Layout {
    columns: Vec<String>,
    labels: Vec<String>,
    cells: Vec<Cell>,
    projected: usize,
}

impl Layout {
    fn push(&mut self, column: String, alias: Option<String>, cell: Cell) {
        self.labels.push(alias.unwrap_or_else(|| column.clone()));
        self.columns.push(column);
        self.cells.push(cell);
    }

    fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    fn finish(self, rows: Vec<Vec<Value>>) -> ConvertedRows {
        ConvertedRows { rows, columns: self.columns, labels: self.labels, projected: self.projected }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "count" => Some(AggregateKind::Count),
            "sum" => Some(AggregateKind::Sum),
            "avg" => Some(AggregateKind::Avg),
            "min" => Some(AggregateKind::Min),
            "max" => Some(AggregateKind::Max),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Aggregate {
    kind: AggregateKind,
    // None for `count(*)`.
    column: Option<String>,
}

impl Aggregate {
    fn new(call: &FunctionCall, table: TableKind) -> Result<Self> {
        let kind = AggregateKind::from_name(&call.name)
            .ok_or_else(|| Error::UnsupportedFunction(call.column_name()))?;
        let column = match &call.arg {
            FunctionArg::Wildcard if kind == AggregateKind::Count => None,
            FunctionArg::Wildcard => return Err(Error::UnsupportedFunction(call.column_name())),
            FunctionArg::Column(name) => Some(table.column(name)?),
        };
        Ok(Aggregate { kind, column })
    }

    fn evaluate(&self, records: &[&Record]) -> Result<Value> {
        let Some(column) = &self.column else {
            return Ok(Value::from(records.len() as u64));
        };
        let mut values = records
            .iter()
            .filter_map(|record| record.value(column))
            .filter(|value| !value.is_null());
        match self.kind {
            AggregateKind::Count => Ok(Value::from(values.count() as u64)),
            AggregateKind::Sum => values.try_fold(Value::Null, |total, value| add(column, total, value)),
            AggregateKind::Avg => {
                let (mut count, mut total) = (0u64, 0f64);
                for value in values {
                    total += value.as_f64().ok_or_else(|| non_numeric(column))?;
                    count += 1;
                }
                Ok(if count == 0 { Value::Null } else { Value::Float(total / count as f64) })
            }
            AggregateKind::Min => Ok(values.min_by(|a, b| a.total_cmp(b)).unwrap_or(Value::Null)),
            AggregateKind::Max => Ok(values.max_by(|a, b| a.total_cmp(b)).unwrap_or(Value::Null)),
        }
    }
}

fn add(column: &str, total: Value, value: Value) -> Result<Value> {
    match (total, value) {
        (_, Value::Text(_)) | (Value::Text(_), _) => Err(non_numeric(column)),
        (Value::Null, value) => Ok(value),
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(b)
            .map(Value::Integer)
            .ok_or_else(|| Error::Execution(format!("sum({}) overflowed", column))),
        (a, b) => Ok(Value::Float(a.as_f64().unwrap_or_default() + b.as_f64().unwrap_or_default())),
    }
}

fn non_numeric(column: &str) -> Error {
    Error::Execution(format!("column {} is not numeric", column))
}

/// A HAVING condition resolved against a materialized column.
#[derive(Debug, Clone, PartialEq)]
pub struct HavingFilter {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

impl HavingFilter {
    pub fn new(column: String, op: CompareOp, literal: &str) -> Self {
        HavingFilter { column, op, value: parse_literal(literal) }
    }

    fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        let ordering = value.total_cmp(&self.value);
        match self.op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }
}

fn parse_literal(literal: &str) -> Value {
    let unquoted = literal.trim_matches(|c| c == '\'' || c == '"');
    if unquoted.len() != literal.len() {
        return Value::Text(unquoted.to_string());
    }
    if let Ok(integer) = literal.parse::<u128>() {
        return Value::Integer(integer);
    }
    match literal.parse::<f64>() {
        Ok(float) => Value::Float(float),
        Err(_) => Value::Text(literal.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainql_rpc::Transaction;

    fn tx(hash: &str, gas: u64, value: u128) -> Record {
        Transaction { hash: hash.to_string(), gas, value, ..Default::default() }.into()
    }

    fn records() -> Vec<Record> {
        vec![tx("a", 21_000, 5), tx("b", 50_000, 1), tx("c", 21_000, 10), tx("d", 90_000, 2)]
    }

    fn count(column: &str) -> FunctionCall {
        FunctionCall::new("count", FunctionArg::Column(column.to_string()))
    }

    #[test]
    fn test_convert_projects_and_appends_extras() {
        let select = vec![SelectItem::column("hash").with_alias("h"), SelectItem::column("GAS")];
        let extras = vec![OrderExpr::Column("value".to_string()), OrderExpr::Column("gas".to_string())];
        let converted = convert(&records(), TableKind::Transactions, &select, &extras).unwrap();

        assert_eq!(converted.columns, vec!["hash", "gas", "value"]);
        assert_eq!(converted.labels, vec!["h", "gas", "value"]);
        assert_eq!(converted.projected, 2);
        assert_eq!(
            converted.rows[0],
            vec![Value::from("a"), Value::Integer(21_000), Value::Integer(5)]
        );
        assert_eq!(converted.column_index().get("value"), Some(&2));
    }

    #[test]
    fn test_convert_unknown_column() {
        let select = vec![SelectItem::column("miner")];
        let result = convert(&records(), TableKind::Transactions, &select, &[]);
        assert!(matches!(result, Err(Error::UnknownColumn { column, .. }) if column == "miner"));
    }

    #[test]
    fn test_grouped_counts_in_first_seen_order() {
        let select = vec![SelectItem::column("gas"), SelectItem::function(count("gas"))];
        let converted = convert_grouped(
            &records(),
            TableKind::Transactions,
            &select,
            &["gas".to_string()],
            &[],
            None,
        )
        .unwrap();

        assert_eq!(converted.columns, vec!["gas", "count(gas)"]);
        let rows: Vec<(Value, Value)> =
            converted.rows.into_iter().map(|r| (r[0].clone(), r[1].clone())).collect();
        assert_eq!(
            rows,
            vec![
                (Value::Integer(21_000), Value::Integer(2)),
                (Value::Integer(50_000), Value::Integer(1)),
                (Value::Integer(90_000), Value::Integer(1)),
            ]
        );
    }

    #[test]
    fn test_having_drops_groups() {
        let select = vec![SelectItem::column("gas"), SelectItem::function(count("gas"))];
        let having = HavingFilter::new("count(gas)".to_string(), CompareOp::Gt, "1");
        let converted = convert_grouped(
            &records(),
            TableKind::Transactions,
            &select,
            &["gas".to_string()],
            &[],
            Some(&having),
        )
        .unwrap();
        assert_eq!(converted.rows, vec![vec![Value::Integer(21_000), Value::Integer(2)]]);
    }

    #[test]
    fn test_aggregates_over_single_group() {
        let select = vec![
            SelectItem::function(FunctionCall::new("count", FunctionArg::Wildcard)),
            SelectItem::function(FunctionCall::new("sum", FunctionArg::Column("value".into()))),
            SelectItem::function(FunctionCall::new("avg", FunctionArg::Column("value".into()))),
            SelectItem::function(FunctionCall::new("min", FunctionArg::Column("gas".into()))),
            SelectItem::function(FunctionCall::new("MAX", FunctionArg::Column("hash".into()))),
        ];
        let converted =
            convert_grouped(&records(), TableKind::Transactions, &select, &[], &[], None).unwrap();
        assert_eq!(
            converted.rows,
            vec![vec![
                Value::Integer(4),
                Value::Integer(18),
                Value::Float(4.5),
                Value::Integer(21_000),
                Value::from("d"),
            ]]
        );
    }

    #[test]
    fn test_count_over_no_records_is_zero() {
        let select = vec![SelectItem::function(FunctionCall::new("count", FunctionArg::Wildcard))];
        let converted = convert_grouped(&[], TableKind::Transactions, &select, &[], &[], None).unwrap();
        assert_eq!(converted.rows, vec![vec![Value::Integer(0)]]);

        let grouped =
            convert_grouped(&[], TableKind::Transactions, &select, &["gas".into()], &[], None).unwrap();
        assert!(grouped.rows.is_empty());
    }

    #[test]
    fn test_unsupported_function() {
        let select = vec![SelectItem::function(FunctionCall::new("median", FunctionArg::Column("gas".into())))];
        let result = convert_grouped(&records(), TableKind::Transactions, &select, &[], &[], None);
        assert!(matches!(result, Err(Error::UnsupportedFunction(name)) if name == "median(gas)"));

        let star = vec![SelectItem::function(FunctionCall::new("sum", FunctionArg::Wildcard))];
        let result = convert_grouped(&records(), TableKind::Transactions, &star, &[], &[], None);
        assert!(matches!(result, Err(Error::UnsupportedFunction(_))));
    }

    #[test]
    fn test_sum_of_text_fails() {
        let select = vec![SelectItem::function(FunctionCall::new("sum", FunctionArg::Column("hash".into())))];
        let result = convert_grouped(&records(), TableKind::Transactions, &select, &[], &[], None);
        assert!(matches!(result, Err(Error::Execution(_))));
    }

    #[test]
    fn test_literal_parsing() {
        assert_eq!(parse_literal("12"), Value::Integer(12));
        assert_eq!(parse_literal("1.5"), Value::Float(1.5));
        assert_eq!(parse_literal("'12'"), Value::from("12"));
    }
}
