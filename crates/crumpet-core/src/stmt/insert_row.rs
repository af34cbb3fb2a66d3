use super::Value;

/// A serialized insert payload: column names paired with stored values, in
/// the order the static serializer visited them.
#[derive(Debug, Clone, Default)]
pub struct InsertRow {
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl InsertRow {
    pub fn new() -> InsertRow {
        InsertRow::default()
    }

    /// Appends a column value, converting it to its stored form.
    pub fn push(&mut self, column: &'static str, value: impl Into<Value>) {
        self.columns.push(column);
        self.values.push(value.into().into_stored());
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| *name == column)
            .map(|index| &self.values[index])
    }

    pub fn set(&mut self, column: &'static str, value: Value) {
        match self.columns.iter().position(|name| *name == column) {
            Some(index) => self.values[index] = value,
            None => {
                self.columns.push(column);
                self.values.push(value);
            }
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
