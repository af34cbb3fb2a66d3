//! Live-catalog introspection: reconstructs a table's database shape from
//! `sqlite_master` and the table/index pragmas.

use crate::Connection;

use crumpet_core::schema::db::{Column, ColumnType, Index, Table};
use crumpet_core::stmt::Value;
use crumpet_core::Result;

/// Reads the live shape of a table, or `None` when it does not exist.
pub fn live_table(connection: &Connection, name: &str) -> Result<Option<Table>> {
    let master = connection.query(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        &[Value::from(name)],
    )?;
    let Some(create_sql) = master
        .into_values()
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next())
    else {
        return Ok(None);
    };
    let create_sql = create_sql.to_text_opt()?.unwrap_or_default();
    let has_autoincrement = create_sql.to_ascii_uppercase().contains("AUTOINCREMENT");

    let info = connection.query(&format!("PRAGMA table_info(\"{name}\")"), &[])?;

    let mut columns = Vec::new();
    let mut pk_ordered: Vec<(i64, String)> = Vec::new();

    for row in info.into_values() {
        // cid, name, type, notnull, dflt_value, pk
        let column_name = row[1].to_text()?;
        let declared = row[2].to_text()?;
        let not_null = row[3].to_i64()? != 0;
        let pk_ordinal = row[5].to_i64()?;

        if pk_ordinal > 0 {
            pk_ordered.push((pk_ordinal, column_name.clone()));
        }

        columns.push(Column {
            name: column_name,
            ty: ColumnType::from_declared(&declared),
            // Primary-key members are keys whether or not the catalog
            // carries an explicit NOT NULL for them.
            nullable: !not_null && pk_ordinal == 0,
            auto_increment: false,
        });
    }

    pk_ordered.sort();
    let primary_key: Vec<String> = pk_ordered.into_iter().map(|(_, name)| name).collect();

    if has_autoincrement && primary_key.len() == 1 {
        if let Some(column) = columns
            .iter_mut()
            .find(|column| column.name == primary_key[0])
        {
            if column.ty == ColumnType::Integer {
                column.auto_increment = true;
            }
        }
    }

    let indexes = live_indexes(connection, name)?;

    Ok(Some(Table {
        name: name.to_owned(),
        columns,
        primary_key,
        indexes,
    }))
}

fn live_indexes(connection: &Connection, table: &str) -> Result<Vec<Index>> {
    let list = connection.query(&format!("PRAGMA index_list(\"{table}\")"), &[])?;

    let mut indexes = Vec::new();
    for row in list.into_values() {
        // seq, name, unique, origin, partial
        let index_name = row[1].to_text()?;
        if is_system_index(&index_name) {
            continue;
        }
        let unique = row[2].to_i64()? != 0;

        let info = connection.query(&format!("PRAGMA index_info(\"{index_name}\")"), &[])?;
        let mut columns: Vec<(i64, String)> = Vec::new();
        for info_row in info.into_values() {
            // seqno, cid, name
            columns.push((info_row[0].to_i64()?, info_row[2].to_text()?));
        }
        columns.sort();

        indexes.push(Index {
            name: index_name,
            columns: columns.into_iter().map(|(_, name)| name).collect(),
            unique,
        });
    }

    // index_list reports newest-first; declaration order reads better in
    // diffs.
    indexes.reverse();
    Ok(indexes)
}

/// Indexes SQLite creates for itself are never dropped by a push.
pub fn is_system_index(name: &str) -> bool {
    name.starts_with("sqlite_")
}
