/// A table as declared to (or read back from) the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<Column>,

    /// Primary-key column names.
    pub primary_key: Vec<String>,

    /// Secondary indexes. The inline auto-increment primary key never gets
    /// a separate index entry.
    pub indexes: Vec<Index>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub auto_increment: bool,
}

/// SQLite storage classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    /// The auto-increment primary-key column, when the table has one.
    pub fn auto_increment(&self) -> Option<&Column> {
        self.columns.iter().find(|column| column.auto_increment)
    }
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }

    /// The SQL literal standing in for an absent value of this type, used
    /// when a column tightens to NOT NULL.
    pub fn zero_literal(&self) -> &'static str {
        match self {
            ColumnType::Integer => "0",
            ColumnType::Real => "0.0",
            ColumnType::Text => "''",
            ColumnType::Blob => "X''",
        }
    }

    /// Maps a declared type string from the live catalog back to a storage
    /// class, using SQLite's affinity rules as the fallback.
    pub fn from_declared(declared: &str) -> ColumnType {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnType::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnType::Text
        } else if upper.contains("BLOB") || upper.is_empty() {
            ColumnType::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

impl Index {
    /// Index names follow `idx_{table}_{col1}[_{col2}…]`, with unique
    /// variants prefixed `uidx_`.
    pub fn name_for(table: &str, columns: &[&str], unique: bool) -> String {
        let prefix = if unique { "uidx" } else { "idx" };
        format!("{}_{}_{}", prefix, table, columns.join("_"))
    }
}
