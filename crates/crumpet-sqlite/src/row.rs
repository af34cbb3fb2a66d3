use crumpet_core::stmt::Value;
use crumpet_core::{Error, Result};

use std::sync::Arc;

/// Raw result of a query: driver-reported column names plus value rows.
#[derive(Debug)]
pub struct QueryOutput {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// One result row, addressable by column name.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl QueryOutput {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> QueryOutput {
        QueryOutput { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows named by the driver-reported column names.
    pub fn into_rows(self) -> Vec<Row> {
        let columns = Arc::new(self.columns);
        self.rows
            .into_iter()
            .map(|values| Row {
                columns: columns.clone(),
                values,
            })
            .collect()
    }

    /// Rows named by a caller-supplied column list, for statements whose
    /// selection order is known in advance.
    pub fn into_rows_named(self, columns: Arc<Vec<String>>) -> Vec<Row> {
        self.rows
            .into_iter()
            .map(|values| Row {
                columns: columns.clone(),
                values,
            })
            .collect()
    }

    pub fn into_values(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

impl Row {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Row {
        Row { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|index| &self.values[index])
    }

    /// Fetches a column that the deserializer knows must be present.
    pub fn require(&self, model: &str, column: &str) -> Result<&Value> {
        self.get(column).ok_or_else(|| {
            Error::msg(format!(
                "column `{column}` missing from row while loading model `{model}`"
            ))
        })
    }
}
