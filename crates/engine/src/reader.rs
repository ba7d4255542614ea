use crate::table::TableKind;
use chainql_common::{Error, Result};
use chainql_sql::{HavingClause, OrderItem, Predicate, Query, SelectExpr, SelectItem};
use indexmap::IndexMap;

/// Lowercased alias name to the canonical column it stands for.
pub type AliasMap = IndexMap<String, String>;

/// Everything the engine needs from a [`Query`], read once up front.
#[derive(Debug, Clone)]
pub struct PlanParts<'a> {
    pub select_items: &'a [SelectItem],
    /// Column and aggregate names of the select list, in order. Wildcards
    /// are expanded later by [`PlanParts::selected_columns_for`].
    pub selected_columns: Vec<String>,
    pub aliases: AliasMap,
    pub table_name: &'a str,
    pub selection: Option<&'a Predicate>,
    pub group_by: Option<Vec<String>>,
    pub having: Option<&'a HavingClause>,
    pub order_by: Option<&'a [OrderItem]>,
    pub limit: Option<u64>,
}

/// Walks the plan and binds aliases. Fails with `AmbiguousAlias` when two
/// select items share an alias.
pub fn read_plan(query: &Query) -> Result<PlanParts<'_>> {
    let mut selected_columns = Vec::with_capacity(query.projection.len());
    let mut aliases = AliasMap::new();

    for item in &query.projection {
        let column = match &item.expr {
            SelectExpr::Column(name) => name.to_lowercase(),
            SelectExpr::Function(call) => call.column_name(),
            SelectExpr::Wildcard => continue,
        };
        if let Some(alias) = &item.alias {
            let key = alias.to_lowercase();
            if aliases.contains_key(&key) {
                return Err(Error::AmbiguousAlias(alias.clone()));
            }
            aliases.insert(key, column.clone());
        }
        selected_columns.push(column);
    }

    Ok(PlanParts {
        select_items: &query.projection,
        selected_columns,
        aliases,
        table_name: &query.from,
        selection: query.selection.as_ref(),
        group_by: query
            .group_by
            .as_ref()
            .map(|columns| columns.iter().map(|c| c.to_lowercase()).collect()),
        having: query.having.as_ref(),
        order_by: query.order_by.as_deref(),
        limit: query.limit,
    })
}

impl PlanParts<'_> {
    /// Aggregates in the select list or an explicit GROUP BY.
    pub fn is_grouped(&self) -> bool {
        self.group_by.is_some()
            || self.select_items.iter().any(|item| matches!(item.expr, SelectExpr::Function(_)))
    }

    /// Canonical column for a name used in ORDER BY or HAVING: the aliased
    /// column if `name` is an alias, the lowercased name otherwise.
    pub fn resolve(&self, name: &str) -> String {
        resolve_name(&self.aliases, name)
    }

    /// Selected names with `*` expanded to the columns of `table`.
    pub fn selected_columns_for(&self, table: TableKind) -> Vec<String> {
        if !self.select_items.iter().any(|item| item.expr == SelectExpr::Wildcard) {
            return self.selected_columns.clone();
        }
        let mut columns = self.selected_columns.clone();
        columns.extend(table.columns().iter().map(|c| c.to_string()));
        columns
    }
}

pub(crate) fn resolve_name(aliases: &AliasMap, name: &str) -> String {
    let lowered = name.to_lowercase();
    aliases.get(&lowered).cloned().unwrap_or(lowered)
}
