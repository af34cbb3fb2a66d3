#[macro_use]
mod fmt;
pub(crate) use fmt::{Comma, Ident, Qualified, ToSql};

mod where_clause;

use crate::stmt::{Select, Statement};

use crumpet_core::schema::db;
use crumpet_core::schema::spec::SpecLookup;
use crumpet_core::stmt::Value;
use crumpet_core::Result;

/// Serialize a statement to a SQL string, collecting `?` parameters.
pub struct Serializer<'a> {
    /// Resolves relation targets when compiling filters.
    lookup: &'a dyn SpecLookup,
}

pub(crate) struct Formatter<'a> {
    /// Where to write the serialized SQL.
    pub(crate) dst: &'a mut String,

    /// Where to store parameters.
    pub(crate) params: &'a mut Vec<Value>,

    pub(crate) lookup: &'a dyn SpecLookup,
}

impl<'a> Serializer<'a> {
    pub fn sqlite(lookup: &'a dyn SpecLookup) -> Serializer<'a> {
        Serializer { lookup }
    }

    pub fn serialize(&self, stmt: &Statement, params: &mut Vec<Value>) -> Result<String> {
        // Filters are validated up front so rendering itself is infallible.
        if let Statement::Select(select) = stmt {
            self.validate(select)?;
        }

        let mut dst = String::new();
        let mut f = Formatter {
            dst: &mut dst,
            params,
            lookup: self.lookup,
        };
        stmt.to_sql(&mut f);
        dst.push(';');
        Ok(dst)
    }

    fn validate(&self, select: &Select) -> Result<()> {
        if let Some(filter) = &select.filter {
            where_clause::validate(select.spec, self.lookup, filter)?;
        }
        where_clause::validate_order_by(select.spec, &select.order_by)
    }
}

impl ToSql for Statement {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        match self {
            Statement::AddColumn(stmt) => stmt.to_sql(f),
            Statement::CopyTable(stmt) => stmt.to_sql(f),
            Statement::CreateIndex(stmt) => stmt.to_sql(f),
            Statement::CreateTable(stmt) => stmt.to_sql(f),
            Statement::DropIndex(stmt) => stmt.to_sql(f),
            Statement::DropTable(stmt) => stmt.to_sql(f),
            Statement::Insert(stmt) => stmt.to_sql(f),
            Statement::RenameTable(stmt) => stmt.to_sql(f),
            Statement::Select(stmt) => stmt.to_sql(f),
        }
    }
}

impl ToSql for crate::stmt::CreateTable {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        let table = &self.table;
        fmt!(f, "CREATE TABLE ");
        if self.if_not_exists {
            fmt!(f, "IF NOT EXISTS ");
        }
        fmt!(f, Ident(&table.name) " (");

        let inline_pk = inline_primary_key(table);

        let mut first = true;
        for column in &table.columns {
            if !first {
                fmt!(f, ", ");
            }
            first = false;

            fmt!(f, Ident(&column.name) " " column.ty.as_sql());

            if inline_pk == Some(column.name.as_str()) {
                fmt!(f, " PRIMARY KEY AUTOINCREMENT");
            } else if !column.nullable && !table.primary_key.contains(&column.name) {
                fmt!(f, " NOT NULL");
            }
        }

        if inline_pk.is_none() && !table.primary_key.is_empty() {
            fmt!(f, ", PRIMARY KEY (" Comma(table.primary_key.iter().map(|name| Ident(name))) ")");
        }

        fmt!(f, ")");
    }
}

/// The auto-increment primary key is declared inline on its column; no
/// separate primary-key clause or index is emitted for it.
fn inline_primary_key(table: &db::Table) -> Option<&str> {
    match &table.primary_key[..] {
        [only] => {
            let column = table.column(only)?;
            (column.auto_increment && column.ty == db::ColumnType::Integer)
                .then_some(column.name.as_str())
        }
        _ => None,
    }
}

impl ToSql for crate::stmt::CreateIndex {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(f, "CREATE ");
        if self.index.unique {
            fmt!(f, "UNIQUE ");
        }
        fmt!(f, "INDEX ");
        if self.if_not_exists {
            fmt!(f, "IF NOT EXISTS ");
        }
        fmt!(
            f,
            Ident(&self.index.name)
            " ON " Ident(&self.table)
            " (" Comma(self.index.columns.iter().map(|name| Ident(name))) ")"
        );
    }
}

impl ToSql for crate::stmt::DropIndex {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(f, "DROP INDEX ");
        if self.if_exists {
            fmt!(f, "IF EXISTS ");
        }
        fmt!(f, Ident(&self.name));
    }
}

impl ToSql for crate::stmt::DropTable {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(f, "DROP TABLE ");
        if self.if_exists {
            fmt!(f, "IF EXISTS ");
        }
        fmt!(f, Ident(&self.name));
    }
}

impl ToSql for crate::stmt::RenameTable {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(f, "ALTER TABLE " Ident(&self.from) " RENAME TO " Ident(&self.to));
    }
}

impl ToSql for crate::stmt::AddColumn {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(
            f,
            "ALTER TABLE " Ident(&self.table)
            " ADD COLUMN " Ident(&self.column.name) " " self.column.ty.as_sql()
        );
        if !self.column.nullable {
            // SQLite rejects adding a NOT NULL column without a default;
            // existing rows take the type's zero value.
            fmt!(f, " NOT NULL DEFAULT " self.column.ty.zero_literal());
        }
    }
}

impl ToSql for crate::stmt::CopyTable {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(
            f,
            "INSERT INTO " Ident(&self.to)
            " (" Comma(self.columns.iter().map(|column| Ident(&column.name))) ")"
            " SELECT "
        );

        let mut first = true;
        for column in &self.columns {
            if !first {
                fmt!(f, ", ");
            }
            first = false;
            match column.fill {
                // NULLs from the source take the target's zero value when
                // the new shape no longer accepts them.
                Some(fill) => fmt!(f, "COALESCE(" Ident(&column.name) ", " fill ")"),
                None => fmt!(f, Ident(&column.name)),
            }
        }

        fmt!(f, " FROM " Ident(&self.from));
    }
}

impl ToSql for crate::stmt::Insert {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        fmt!(
            f,
            "INSERT INTO " Ident(&self.table)
            " (" Comma(self.columns.iter().map(|name| Ident(name))) ") VALUES "
        );

        let mut first_row = true;
        for row in &self.rows {
            if !first_row {
                fmt!(f, ", ");
            }
            first_row = false;

            fmt!(f, "(");
            let mut first = true;
            for value in row {
                if !first {
                    fmt!(f, ", ");
                }
                first = false;
                f.param(value);
            }
            fmt!(f, ")");
        }
    }
}

impl ToSql for Select {
    fn to_sql(&self, f: &mut Formatter<'_>) {
        let table = self.spec.table;
        fmt!(
            f,
            "SELECT " Comma(self.spec.column_names().map(|name| Qualified(table, name)))
            " FROM " Ident(table)
        );

        if let Some(filter) = &self.filter {
            fmt!(f, " WHERE ");
            where_clause::render(self.spec, filter, f);
        }

        if !self.order_by.is_empty() {
            fmt!(f, " ORDER BY ");
            let mut first = true;
            for order in &self.order_by {
                if !first {
                    fmt!(f, ", ");
                }
                first = false;
                fmt!(f, Qualified(table, order.column.as_str()) " " order.direction.as_sql());
            }
        }

        match (self.take, self.skip) {
            (Some(take), Some(skip)) => fmt!(f, " LIMIT " take " OFFSET " skip),
            (Some(take), None) => fmt!(f, " LIMIT " take),
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(skip)) => fmt!(f, " LIMIT -1 OFFSET " skip),
            (None, None) => {}
        }
    }
}
