use crate::convert::ConvertedRows;
use crate::ordering::OrderSpec;
use crate::reader::AliasMap;
use crate::table::TableKind;
use arrow::array::{ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chainql_common::{Error, Result, Value};
use chainql_sql::OrderingDirection;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// Tabular result of one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    table: TableKind,
    columns: Vec<String>,
    labels: Vec<String>,
    column_index: IndexMap<String, usize>,
    aliases: AliasMap,
    rows: Vec<Vec<Value>>,
    projected: usize,
}

impl ResultTable {
    pub fn new(table: TableKind, converted: ConvertedRows, aliases: AliasMap) -> Self {
        let column_index = converted.column_index();
        ResultTable {
            table,
            columns: converted.columns,
            labels: converted.labels,
            column_index,
            aliases,
            rows: converted.rows,
            projected: converted.projected,
        }
    }

    pub fn table(&self) -> TableKind {
        self.table
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Canonical column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column headers, aliases where bound.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn column_index(&self) -> &IndexMap<String, usize> {
        &self.column_index
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Position of a column given by alias or name. Aliases win over
    /// column names, both compared case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        let lowered = name.to_lowercase();
        match self.aliases.get(&lowered) {
            Some(column) => self.column_index.get(column).copied(),
            None => self.column_index.get(&lowered).copied(),
        }
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let position = self.resolve(name)?;
        self.rows.get(row)?.get(position)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let position = self.resolve(name)?;
        Some(self.rows.iter().map(|row| &row[position]).collect())
    }

    /// Stable sort on the order keys. Nulls sort first ascending. Keys are
    /// canonical column names and are not looked up as aliases.
    pub fn order(&mut self, spec: &OrderSpec) -> Result<()> {
        if spec.is_empty() {
            return Ok(());
        }
        let keys = spec
            .keys
            .iter()
            .map(|(column, direction)| {
                self.column_index.get(column).map(|&position| (position, *direction)).ok_or_else(
                    || Error::UnknownColumn { column: column.clone(), table: self.table.to_string() },
                )
            })
            .collect::<Result<Vec<_>>>()?;

        self.rows.sort_by(|a, b| {
            keys.iter()
                .map(|&(position, direction)| {
                    let ordering = a[position].total_cmp(&b[position]);
                    match direction {
                        OrderingDirection::Asc => ordering,
                        OrderingDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(())
    }

    pub fn limit(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Drops the columns that were only carried for ordering or HAVING.
    pub fn project(&mut self) {
        if self.projected == self.columns.len() {
            return;
        }
        self.columns.truncate(self.projected);
        self.labels.truncate(self.projected);
        for row in &mut self.rows {
            row.truncate(self.projected);
        }
        self.column_index.retain(|_, position| *position < self.projected);
    }

    pub fn to_record_batch(&self) -> std::result::Result<RecordBatch, ArrowError> {
        let mut fields = Vec::with_capacity(self.labels.len());
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(self.labels.len());
        for (position, label) in self.labels.iter().enumerate() {
            let cells: Vec<&Value> = self.rows.iter().map(|row| &row[position]).collect();
            let (data_type, array) = build_array(&cells);
            fields.push(Field::new(label, data_type, true));
            arrays.push(array);
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
    }
}

fn build_array(cells: &[&Value]) -> (DataType, ArrayRef) {
    let fits_u64 = |value: &Value| match value {
        Value::Null => true,
        Value::Integer(i) => u64::try_from(*i).is_ok(),
        _ => false,
    };
    if cells.iter().all(|v| fits_u64(v)) {
        let values: Vec<Option<u64>> = cells
            .iter()
            .map(|v| match v {
                Value::Integer(i) => u64::try_from(*i).ok(),
                _ => None,
            })
            .collect();
        return (DataType::UInt64, Arc::new(UInt64Array::from(values)));
    }
    if cells.iter().all(|v| v.is_null() || v.as_f64().is_some()) {
        let values: Vec<Option<f64>> = cells.iter().map(|v| v.as_f64()).collect();
        return (DataType::Float64, Arc::new(Float64Array::from(values)));
    }
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|v| if v.is_null() { None } else { Some(v.to_string()) })
        .collect();
    (DataType::Utf8, Arc::new(StringArray::from(values)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use chainql_sql::{FunctionArg, FunctionCall};

    fn table() -> ResultTable {
        let converted = ConvertedRows {
            rows: vec![
                vec![Value::from("a"), Value::Integer(3), Value::Integer(1)],
                vec![Value::from("b"), Value::Integer(1), Value::Integer(2)],
                vec![Value::from("c"), Value::Integer(3), Value::Integer(3)],
                vec![Value::from("d"), Value::Null, Value::Integer(4)],
            ],
            columns: vec!["hash".into(), "gas".into(), "nonce".into()],
            labels: vec!["h".into(), "gas".into(), "nonce".into()],
            projected: 2,
        };
        let mut aliases = AliasMap::new();
        aliases.insert("h".to_string(), "hash".to_string());
        ResultTable::new(TableKind::Transactions, converted, aliases)
    }

    fn spec(keys: &[(&str, OrderingDirection)]) -> OrderSpec {
        OrderSpec {
            keys: keys.iter().map(|(k, d)| (k.to_string(), *d)).collect(),
            extra_columns: vec![],
        }
    }

    fn hashes(table: &ResultTable) -> Vec<String> {
        table.column("h").unwrap().iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_lookup_by_alias_and_name() {
        let table = table();
        assert_eq!(table.resolve("h"), Some(0));
        assert_eq!(table.resolve("GAS"), Some(1));
        assert_eq!(table.value(1, "gas"), Some(&Value::Integer(1)));
        assert_eq!(table.resolve("value"), None);
    }

    #[test]
    fn test_order_desc_is_stable() {
        let mut table = table();
        table.order(&spec(&[("gas", OrderingDirection::Desc)])).unwrap();
        assert_eq!(hashes(&table), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_order_by_multiple_keys() {
        let mut table = table();
        table
            .order(&spec(&[("gas", OrderingDirection::Asc), ("nonce", OrderingDirection::Desc)]))
            .unwrap();
        assert_eq!(hashes(&table), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_order_keys_are_not_read_as_aliases() {
        let mut table = table();
        table.aliases.insert("gas".to_string(), "nonce".to_string());
        table.order(&spec(&[("nonce", OrderingDirection::Desc)])).unwrap();
        assert_eq!(hashes(&table), vec!["d", "c", "b", "a"]);
        table.order(&spec(&[("gas", OrderingDirection::Desc)])).unwrap();
        assert_eq!(hashes(&table), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_order_by_missing_column() {
        let mut table = table();
        let result = table.order(&spec(&[("value", OrderingDirection::Asc)]));
        assert!(matches!(result, Err(Error::UnknownColumn { column, .. }) if column == "value"));
    }

    #[test]
    fn test_limit_and_project() {
        let mut table = table();
        table.limit(10);
        assert_eq!(table.num_rows(), 4);
        table.limit(2);
        table.project();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.columns(), &["hash".to_string(), "gas".to_string()]);
        assert!(table.rows().iter().all(|row| row.len() == 2));
        assert_eq!(table.resolve("nonce"), None);
    }

    #[test]
    fn test_record_batch_types_and_headers() {
        let mut table = table();
        table.project();
        let batch = table.to_record_batch().unwrap();
        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), "h");
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::UInt64);
        assert_eq!(batch.num_rows(), 4);
        assert!(batch.column(1).is_null(3));

        let name = FunctionCall::new("avg", FunctionArg::Column("gas".into())).column_name();
        let converted = ConvertedRows {
            rows: vec![vec![Value::Float(1.5)], vec![Value::Integer(2)]],
            columns: vec![name.clone()],
            labels: vec![name],
            projected: 1,
        };
        let floats = ResultTable::new(TableKind::Transactions, converted, AliasMap::new());
        let batch = floats.to_record_batch().unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Float64);
    }
}
