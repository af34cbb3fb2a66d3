//! Schema push: diff the declared shape against the live catalog and
//! apply the difference, rebuilding tables when a change is not
//! expressible as an in-place alteration.

use crumpet_core::schema::app;
use crumpet_core::schema::db::{self, SchemaDiff, TableDiff};
use crumpet_core::{Error, Result};
use crumpet_sql::stmt::{CopyColumn, CreateTable};
use crumpet_sql::{Serializer, Statement};
use crumpet_sqlite::{catalog, Connection};

/// How a push treats destructive changes and stray indexes.
#[derive(Default)]
pub struct PushOptions<'a> {
    /// Consulted before a copy-through rebuild; absent or returning false
    /// aborts with `RebuildRejected`.
    pub confirm_rebuild: Option<&'a dyn Fn(&TableDiff) -> bool>,

    /// Drop live indexes that are not in the declared set.
    pub sync_indexes: bool,
}

/// Reconciles one datasource's models with the live database.
///
/// A second push against an already-matching schema is a no-op returning
/// an empty diff.
pub fn push(
    connection: &Connection,
    schema: &app::Schema,
    data_source: &str,
    options: &PushOptions<'_>,
) -> Result<SchemaDiff> {
    let ds = schema
        .data_sources
        .iter()
        .find(|ds| ds.key == data_source)
        .ok_or_else(|| Error::msg(format!("unknown datasource `{data_source}`")))?;

    if ds.provider != "sqlite" {
        return Err(Error::unsupported_provider(ds.provider.clone()));
    }

    let declared = db::lower(schema, ds.id)?;
    let mut out = SchemaDiff::default();

    for table in &declared.tables {
        match catalog::live_table(connection, &table.name)? {
            None => {
                create_table(connection, table)?;
                out.push(TableDiff {
                    table: table.name.clone(),
                    created: true,
                    added_indexes: table.indexes.clone(),
                    ..TableDiff::default()
                });
            }
            Some(live) => {
                let diff = db::diff_table(table, &live, options.sync_indexes);
                if diff.is_empty() {
                    out.push(diff);
                    continue;
                }

                if diff.requires_rebuild {
                    let confirmed = options
                        .confirm_rebuild
                        .map(|confirm| confirm(&diff))
                        .unwrap_or(false);
                    if !confirmed {
                        return Err(Error::rebuild_rejected(table.name.clone()));
                    }
                    rebuild(connection, table, &live)?;
                } else {
                    for column in &diff.added_columns {
                        apply(
                            connection,
                            &Statement::add_column(table.name.clone(), column.clone()),
                        )?;
                    }
                    for name in &diff.removed_indexes {
                        if !catalog::is_system_index(name) {
                            apply(connection, &Statement::drop_index(name.clone()))?;
                        }
                    }
                    for index in &diff.added_indexes {
                        apply(
                            connection,
                            &Statement::create_index(table.name.clone(), index.clone()),
                        )?;
                    }
                }

                out.push(diff);
            }
        }
    }

    Ok(out)
}

fn create_table(connection: &Connection, table: &db::Table) -> Result<()> {
    apply(connection, &Statement::create_table(table.clone()))?;
    for index in &table.indexes {
        apply(
            connection,
            &Statement::create_index(table.name.clone(), index.clone()),
        )?;
    }
    Ok(())
}

/// The copy-through rebuild: inside an exclusive write transaction, create
/// the new shape under a scratch name, copy the surviving columns, drop
/// the original, rename, and re-create the declared indexes.
fn rebuild(connection: &Connection, declared: &db::Table, live: &db::Table) -> Result<()> {
    let scratch = format!("_crumpet_new_{}", declared.name);

    let mut scratch_table = declared.clone();
    scratch_table.name = scratch.clone();

    let surviving: Vec<CopyColumn> = declared
        .columns
        .iter()
        .filter(|column| live.column(&column.name).is_some())
        .map(|column| {
            if column.nullable {
                CopyColumn::plain(column.name.clone())
            } else {
                CopyColumn::filled(column.name.clone(), column.ty.zero_literal())
            }
        })
        .collect();

    connection.execute_batch("BEGIN IMMEDIATE")?;

    let result = (|| {
        apply(
            connection,
            &Statement::CreateTable(CreateTable {
                table: scratch_table,
                if_not_exists: false,
            }),
        )?;
        if !surviving.is_empty() {
            apply(
                connection,
                &Statement::copy_table(declared.name.clone(), scratch.clone(), surviving),
            )?;
        }
        apply(connection, &Statement::drop_table(declared.name.clone()))?;
        apply(
            connection,
            &Statement::rename_table(scratch.clone(), declared.name.clone()),
        )?;
        for index in &declared.indexes {
            apply(
                connection,
                &Statement::create_index(declared.name.clone(), index.clone()),
            )?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => connection.execute_batch("COMMIT"),
        Err(err) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(err)
        }
    }
}

fn apply(connection: &Connection, stmt: &Statement) -> Result<()> {
    // Schema statements never reference other models.
    static NO_SPECS: &[&crumpet_core::schema::spec::TableSpec] = &[];

    let mut params = Vec::new();
    let sql = Serializer::sqlite(&NO_SPECS).serialize(stmt, &mut params)?;
    debug_assert!(params.is_empty());

    tracing::info!(target: "crumpet::push", sql = %sql, "applying schema statement");
    connection.execute(&sql, &params)?;
    Ok(())
}
