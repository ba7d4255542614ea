use crate::reader::{resolve_name, AliasMap};
use chainql_sql::{FunctionCall, OrderExpr, OrderItem, OrderingDirection};
use indexmap::IndexMap;

/// Sort keys in ORDER BY order plus the columns that have to be
/// materialized only so they can be sorted on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderSpec {
    /// Canonical column name to direction.
    pub keys: IndexMap<String, OrderingDirection>,
    pub extra_columns: Vec<OrderExpr>,
}

impl OrderSpec {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn build_order_spec(
    order_items: &[OrderItem],
    selected_columns: &[String],
    aliases: &AliasMap,
) -> OrderSpec {
    let mut spec = OrderSpec::default();
    for item in order_items {
        let name = item.expr.column_name();
        let column = resolve_name(aliases, &name);
        if !selected_columns.contains(&column) && !aliases.contains_key(&name.to_lowercase()) {
            let extra = match &item.expr {
                OrderExpr::Column(_) => OrderExpr::Column(column.clone()),
                OrderExpr::Function(call) => OrderExpr::Function(FunctionCall::new(
                    call.name.to_lowercase(),
                    call.arg.clone(),
                )),
            };
            if !spec.extra_columns.contains(&extra) {
                spec.extra_columns.push(extra);
            }
        }
        spec.keys.entry(column).or_insert(item.direction);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainql_sql::FunctionArg;

    fn selected() -> Vec<String> {
        vec!["gas".to_string(), "count(gas)".to_string()]
    }

    #[test]
    fn test_selected_and_aliased_columns_are_not_extra() {
        let mut aliases = AliasMap::new();
        aliases.insert("n".to_string(), "count(gas)".to_string());
        let items = vec![
            OrderItem::desc(OrderExpr::Column("n".to_string())),
            OrderItem::asc(OrderExpr::Column("GAS".to_string())),
        ];
        let spec = build_order_spec(&items, &selected(), &aliases);

        assert!(spec.extra_columns.is_empty());
        let keys: Vec<_> = spec.keys.iter().map(|(k, d)| (k.as_str(), *d)).collect();
        assert_eq!(
            keys,
            vec![("count(gas)", OrderingDirection::Desc), ("gas", OrderingDirection::Asc)]
        );
    }

    #[test]
    fn test_unselected_columns_become_extra() {
        let items = vec![
            OrderItem::asc(OrderExpr::Column("Value".to_string())),
            OrderItem::desc(OrderExpr::Function(FunctionCall::new("MAX", FunctionArg::Column("nonce".into())))),
            OrderItem::asc(OrderExpr::Column("value".to_string())),
        ];
        let spec = build_order_spec(&items, &selected(), &AliasMap::new());

        assert_eq!(
            spec.extra_columns,
            vec![
                OrderExpr::Column("value".to_string()),
                OrderExpr::Function(FunctionCall::new("max", FunctionArg::Column("nonce".into()))),
            ]
        );
        assert_eq!(spec.keys.len(), 2);
        assert_eq!(spec.keys.get("max(nonce)"), Some(&OrderingDirection::Desc));
    }

    #[test]
    fn test_empty_order_by() {
        let spec = build_order_spec(&[], &selected(), &AliasMap::new());
        assert!(spec.is_empty());
        assert!(spec.extra_columns.is_empty());
    }
}
