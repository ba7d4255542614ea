/// A parsed SELECT over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub projection: Vec<SelectItem>,
    /// Table name exactly as written in the FROM clause.
    pub from: String,
    pub selection: Option<Predicate>,
    pub group_by: Option<Vec<String>>,
    pub having: Option<HavingClause>,
    pub order_by: Option<Vec<OrderItem>>,
    pub limit: Option<u64>,
}

impl Query {
    /// A bare `SELECT <projection> FROM <table>`.
    pub fn new(from: impl Into<String>, projection: Vec<SelectItem>) -> Self {
        Query {
            projection,
            from: from.into(),
            selection: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
        }
    }
}

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SelectExpr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn column(name: impl Into<String>) -> Self {
        SelectItem { expr: SelectExpr::Column(name.into()), alias: None }
    }

    pub fn function(call: FunctionCall) -> Self {
        SelectItem { expr: SelectExpr::Function(call), alias: None }
    }

    pub fn wildcard() -> Self {
        SelectItem { expr: SelectExpr::Wildcard, alias: None }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectExpr {
    Column(String),
    Function(FunctionCall),
    /// `*`
    Wildcard,
}

/// An aggregate call such as `count(gas)` or `count(*)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionCall {
    pub name: String,
    pub arg: FunctionArg,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionArg {
    Column(String),
    Wildcard,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arg: FunctionArg) -> Self {
        FunctionCall { name: name.into(), arg }
    }

    /// Deterministic label used as the column name of the call's result,
    /// e.g. `count(gas)`. Identifiers are case-folded.
    pub fn column_name(&self) -> String {
        let arg = match &self.arg {
            FunctionArg::Column(column) => column.to_lowercase(),
            FunctionArg::Wildcard => "*".to_string(),
        };
        format!("{}({})", self.name.to_lowercase(), arg)
    }
}

/// A WHERE tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Filter(FilterItem),
    Logical(LogicalOperation),
}

impl Predicate {
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Filter(FilterItem { column: column.into(), value: value.into() })
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::Logical(LogicalOperation {
            op: LogicalOperator::And,
            operands: vec![left, right],
        })
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Logical(LogicalOperation {
            op: LogicalOperator::Or,
            operands: vec![left, right],
        })
    }
}

/// `column = value`. The value keeps any quote characters from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterItem {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOperation {
    pub op: LogicalOperator,
    pub operands: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Column or aggregate referenced from ORDER BY and HAVING.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderExpr {
    Column(String),
    Function(FunctionCall),
}

impl OrderExpr {
    /// Name the expression is materialized under. Plain columns keep their
    /// spelling so that aliases still match.
    pub fn column_name(&self) -> String {
        match self {
            OrderExpr::Column(name) => name.clone(),
            OrderExpr::Function(call) => call.column_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub expr: OrderExpr,
    pub direction: OrderingDirection,
}

impl OrderItem {
    pub fn asc(expr: OrderExpr) -> Self {
        OrderItem { expr, direction: OrderingDirection::Asc }
    }

    pub fn desc(expr: OrderExpr) -> Self {
        OrderItem { expr, direction: OrderingDirection::Desc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderingDirection {
    #[default]
    Asc,
    Desc,
}

/// `HAVING <target> <op> <value>`.
#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    pub target: OrderExpr,
    pub op: CompareOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}
