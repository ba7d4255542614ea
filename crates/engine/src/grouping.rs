use crate::convert::{convert_grouped, ConvertedRows, HavingFilter};
use crate::ordering::OrderSpec;
use crate::reader::PlanParts;
use crate::record::Record;
use crate::table::TableKind;
use chainql_common::{Error, Result};
use chainql_sql::{HavingClause, OrderExpr, SelectExpr, SelectItem};
use tracing::debug;

/// Validates the select list and ordering against GROUP BY, then hands the
/// records to [`convert_grouped`].
pub fn group(
    records: &[Record],
    parts: &PlanParts<'_>,
    table: TableKind,
    order: &OrderSpec,
) -> Result<ConvertedRows> {
    let group_by = parts.group_by.as_deref().unwrap_or_default();
    verify_grouped_columns(parts.select_items, group_by, table)?;
    verify_grouped_order_columns(group_by, &order.extra_columns)?;

    let mut extra_columns = order.extra_columns.clone();
    let having = match parts.having {
        Some(clause) => {
            let (filter, extra) = resolve_having(clause, parts, table)?;
            if let Some(extra) = extra {
                if !extra_columns.contains(&extra) {
                    extra_columns.push(extra);
                }
            }
            Some(filter)
        }
        None => None,
    };

    debug!(
        records = records.len(),
        group_by = ?group_by,
        extra_columns = extra_columns.len(),
        "grouping records"
    );
    convert_grouped(records, table, parts.select_items, group_by, &extra_columns, having.as_ref())
}

/// Every plain selected column, including those a `*` expands to, must be
/// a GROUP BY column.
pub fn verify_grouped_columns(
    select_items: &[SelectItem],
    group_by: &[String],
    table: TableKind,
) -> Result<()> {
    for column in group_by {
        table.column(column)?;
    }
    for item in select_items {
        match &item.expr {
            SelectExpr::Column(name) => {
                let column = table.column(name)?;
                if !group_by.contains(&column) {
                    return Err(Error::GroupByProjectionMismatch(name.clone()));
                }
            }
            SelectExpr::Wildcard => {
                if let Some(column) =
                    table.columns().iter().find(|c| !group_by.iter().any(|g| g == *c))
                {
                    return Err(Error::GroupByProjectionMismatch(column.to_string()));
                }
            }
            SelectExpr::Function(_) => {}
        }
    }
    Ok(())
}

/// Ordering columns that are not selected must be GROUP BY columns.
/// Aggregates are always computable per group.
pub fn verify_grouped_order_columns(group_by: &[String], extra_columns: &[OrderExpr]) -> Result<()> {
    for extra in extra_columns {
        if let OrderExpr::Column(column) = extra {
            if !group_by.contains(column) {
                return Err(Error::GroupByOrderMismatch(column.clone()));
            }
        }
    }
    Ok(())
}

/// Binds the HAVING target to a materialized column. Returns the filter and,
/// when the target is not selected, the expression to carry as an extra
/// column.
fn resolve_having(
    clause: &HavingClause,
    parts: &PlanParts<'_>,
    table: TableKind,
) -> Result<(HavingFilter, Option<OrderExpr>)> {
    let column = parts.resolve(&clause.target.column_name());
    let filter = HavingFilter::new(column.clone(), clause.op, &clause.value);
    if parts.selected_columns.contains(&column) {
        return Ok((filter, None));
    }
    let extra = match &clause.target {
        OrderExpr::Function(call) => OrderExpr::Function(call.clone()),
        OrderExpr::Column(_) => {
            let column = table.column(&column)?;
            let grouped = parts.group_by.as_ref().is_some_and(|g| g.contains(&column));
            if !grouped {
                return Err(Error::GroupByProjectionMismatch(column));
            }
            OrderExpr::Column(column)
        }
    };
    Ok((filter, Some(extra)))
}
