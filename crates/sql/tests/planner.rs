use chainql_sql::{
    CompareOp, FunctionArg, FunctionCall, OrderExpr, OrderingDirection, Planner, PlanningError,
    Predicate, SelectExpr,
};

#[test]
fn test_simple_select() {
    let planner = Planner::new();
    let sql = "SELECT hash, gas FROM transactions WHERE blocknumber = 1652339;";
    let query = planner.sql_to_query(sql).unwrap();

    assert_eq!(query.from, "transactions");
    assert_eq!(query.projection.len(), 2);
    assert_eq!(query.projection[0].expr, SelectExpr::Column("hash".to_string()));
    assert_eq!(query.projection[1].expr, SelectExpr::Column("gas".to_string()));
    assert_eq!(query.selection, Some(Predicate::equals("blocknumber", "1652339")));
    assert_eq!(query.group_by, None);
    assert_eq!(query.order_by, None);
    assert_eq!(query.limit, None);
}

#[test]
fn test_select_with_alias() {
    let planner = Planner::new();
    let query = planner
        .sql_to_query("SELECT blocknumber AS num, count(*) AS cnt FROM blocks WHERE blocknumber = 1")
        .unwrap();

    assert_eq!(query.projection[0].alias.as_deref(), Some("num"));
    assert_eq!(query.projection[1].alias.as_deref(), Some("cnt"));
    assert_eq!(
        query.projection[1].expr,
        SelectExpr::Function(FunctionCall::new("count", FunctionArg::Wildcard))
    );
}

#[test]
fn test_string_literal_keeps_quotes() {
    let planner = Planner::new();
    let query = planner
        .sql_to_query("SELECT * FROM transactions WHERE hash = '0xabc'")
        .unwrap();

    assert_eq!(query.projection[0].expr, SelectExpr::Wildcard);
    assert_eq!(query.selection, Some(Predicate::equals("hash", "'0xabc'")));
}

#[test]
fn test_nested_and_or() {
    let planner = Planner::new();
    let query = planner
        .sql_to_query(
            "SELECT hash FROM transactions \
             WHERE (blocknumber = 1 OR blocknumber = 2) AND hash = '0x01'",
        )
        .unwrap();

    let expected = Predicate::and(
        Predicate::or(Predicate::equals("blocknumber", "1"), Predicate::equals("blocknumber", "2")),
        Predicate::equals("hash", "'0x01'"),
    );
    assert_eq!(query.selection, Some(expected));
}

#[test]
fn test_group_having_order_limit() {
    let planner = Planner::new();
    let query = planner
        .sql_to_query(
            "SELECT gas, count(gas) AS count FROM transactions \
             WHERE blocknumber = 1 OR blocknumber = 2 \
             GROUP BY gas HAVING count > 1 ORDER BY count(gas) DESC, gas LIMIT 4",
        )
        .unwrap();

    assert_eq!(query.group_by, Some(vec!["gas".to_string()]));
    let having = query.having.expect("HAVING should be planned");
    assert_eq!(having.target, OrderExpr::Column("count".to_string()));
    assert_eq!(having.op, CompareOp::Gt);
    assert_eq!(having.value, "1");

    let order_by = query.order_by.expect("ORDER BY should be planned");
    assert_eq!(order_by.len(), 2);
    assert_eq!(
        order_by[0].expr,
        OrderExpr::Function(FunctionCall::new("count", FunctionArg::Column("gas".to_string())))
    );
    assert_eq!(order_by[0].direction, OrderingDirection::Desc);
    assert_eq!(order_by[1].direction, OrderingDirection::Asc);
    assert_eq!(query.limit, Some(4));
}

#[test]
fn test_reversed_equality_operands() {
    let planner = Planner::new();
    let query = planner.sql_to_query("SELECT hash FROM transactions WHERE 7 = blocknumber").unwrap();
    assert_eq!(query.selection, Some(Predicate::equals("blocknumber", "7")));
}

#[test]
fn test_unsupported_comparison_in_where() {
    let planner = Planner::new();
    let result = planner.sql_to_query("SELECT hash FROM transactions WHERE gas > 10");
    assert!(matches!(result, Err(PlanningError::UnsupportedOperator(_))));
}

#[test]
fn test_unsupported_statement_insert() {
    let planner = Planner::new();
    let result = planner.sql_to_query("INSERT INTO blocks (hash) VALUES (1);");
    assert!(matches!(result, Err(PlanningError::UnsupportedStatement(_))));
}

#[test]
fn test_multiple_statements() {
    let planner = Planner::new();
    let result = planner.sql_to_query("SELECT hash FROM blocks; SELECT hash FROM transactions;");
    assert_eq!(result, Err(PlanningError::StatementCount(2)));
}

#[test]
fn test_no_from_clause() {
    let planner = Planner::new();
    let result = planner.sql_to_query("SELECT hash;");
    assert_eq!(result, Err(PlanningError::NoTableInFromClause));
}

#[test]
fn test_explicit_join() {
    let planner = Planner::new();
    let result = planner.sql_to_query(
        "SELECT hash FROM blocks JOIN transactions ON blocks.blockhash = transactions.blockhash",
    );
    assert!(matches!(result, Err(PlanningError::UnsupportedQuery(s)) if s.contains("JOIN")));
}

#[test]
fn test_unsupported_table_factor() {
    let planner = Planner::new();
    let result = planner.sql_to_query("SELECT hash FROM (SELECT hash FROM blocks);");
    assert!(matches!(result, Err(PlanningError::UnsupportedTableFactor(_))));
}
