use crumpet_core::schema::db;
use crumpet_core::schema::spec::TableSpec;
use crumpet_core::stmt::{Filter, OrderBy, Value};

/// A statement the serializer can render for the embedded store.
#[derive(Debug, Clone)]
pub enum Statement {
    AddColumn(AddColumn),
    CopyTable(CopyTable),
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    DropIndex(DropIndex),
    DropTable(DropTable),
    Insert(Insert),
    RenameTable(RenameTable),
    Select(Select),
}

#[derive(Debug, Clone)]
pub struct CreateTable {
    pub table: db::Table,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone)]
pub struct CreateIndex {
    pub table: String,
    pub index: db::Index,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone)]
pub struct DropIndex {
    pub name: String,
    pub if_exists: bool,
}

#[derive(Debug, Clone)]
pub struct DropTable {
    pub name: String,
    pub if_exists: bool,
}

#[derive(Debug, Clone)]
pub struct RenameTable {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct AddColumn {
    pub table: String,
    pub column: db::Column,
}

/// `INSERT INTO to (columns…) SELECT columns… FROM from`, used by the
/// copy-through rebuild.
#[derive(Debug, Clone)]
pub struct CopyTable {
    pub from: String,
    pub to: String,
    pub columns: Vec<CopyColumn>,
}

#[derive(Debug, Clone)]
pub struct CopyColumn {
    pub name: String,

    /// SQL literal substituted for NULL source values when the target
    /// column does not accept them.
    pub fill: Option<&'static str>,
}

impl CopyColumn {
    pub fn plain(name: impl Into<String>) -> CopyColumn {
        CopyColumn {
            name: name.into(),
            fill: None,
        }
    }

    pub fn filled(name: impl Into<String>, fill: &'static str) -> CopyColumn {
        CopyColumn {
            name: name.into(),
            fill: Some(fill),
        }
    }
}

/// A parameterized multi-row insert.
#[derive(Debug, Clone)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A `SELECT` over one model's table, with the compiled filter language.
#[derive(Debug, Clone)]
pub struct Select {
    pub spec: &'static TableSpec,
    pub filter: Option<Filter>,
    pub order_by: Vec<OrderBy>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
}

impl Statement {
    pub fn create_table(table: db::Table) -> Statement {
        Statement::CreateTable(CreateTable {
            table,
            if_not_exists: true,
        })
    }

    pub fn create_index(table: impl Into<String>, index: db::Index) -> Statement {
        Statement::CreateIndex(CreateIndex {
            table: table.into(),
            index,
            if_not_exists: true,
        })
    }

    pub fn drop_index(name: impl Into<String>) -> Statement {
        Statement::DropIndex(DropIndex {
            name: name.into(),
            if_exists: true,
        })
    }

    pub fn drop_table(name: impl Into<String>) -> Statement {
        Statement::DropTable(DropTable {
            name: name.into(),
            if_exists: false,
        })
    }

    pub fn rename_table(from: impl Into<String>, to: impl Into<String>) -> Statement {
        Statement::RenameTable(RenameTable {
            from: from.into(),
            to: to.into(),
        })
    }

    pub fn add_column(table: impl Into<String>, column: db::Column) -> Statement {
        Statement::AddColumn(AddColumn {
            table: table.into(),
            column,
        })
    }

    pub fn copy_table(
        from: impl Into<String>,
        to: impl Into<String>,
        columns: Vec<CopyColumn>,
    ) -> Statement {
        Statement::CopyTable(CopyTable {
            from: from.into(),
            to: to.into(),
            columns,
        })
    }
}

impl From<Select> for Statement {
    fn from(value: Select) -> Statement {
        Statement::Select(value)
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Statement {
        Statement::Insert(value)
    }
}
