use super::{Column, ColumnType, Index, Schema, Table};
use crate::schema::app;
use crate::stmt::Type;
use crate::{Error, Result};

/// Lowers the models of one datasource into their database shape.
pub fn lower(schema: &app::Schema, data_source: app::DataSourceId) -> Result<Schema> {
    let mut tables = Vec::new();

    for model in &schema.models {
        if model.data_source != data_source {
            continue;
        }
        tables.push(lower_model(model)?);
    }

    Ok(Schema { tables })
}

fn lower_model(model: &app::Model) -> Result<Table> {
    let mut columns = Vec::new();

    for field in model.columns() {
        let column = field.expect_column();
        let ty = match &column.storage_hint {
            Some(hint) => hinted_type(&model.name, &field.name, hint)?,
            None => storage_type(&model.name, &field.name, column.ty)?,
        };
        columns.push(Column {
            name: field.name.clone(),
            ty,
            nullable: column.nullable,
            auto_increment: column.auto_increment,
        });
    }

    let mut indexes = Vec::new();
    for index in &model.indexes {
        let names: Vec<&str> = index
            .fields
            .iter()
            .map(|i| model.fields[*i].name.as_str())
            .collect();
        indexes.push(Index {
            name: Index::name_for(&model.table_name, &names, index.unique),
            columns: names.iter().map(|s| s.to_string()).collect(),
            unique: index.unique,
        });
    }

    Ok(Table {
        name: model.table_name.clone(),
        columns,
        primary_key: model
            .primary_key_columns()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        indexes,
    })
}

/// The column type inference rules: integers and booleans map to INTEGER,
/// floats to REAL, text and date-time kinds to TEXT, bytes to BLOB, enums
/// to the storage type of their discriminant.
pub fn storage_type(model: &str, column: &str, ty: Type) -> Result<ColumnType> {
    match ty {
        Type::I64 | Type::Bool | Type::Enum(_) => Ok(ColumnType::Integer),
        Type::F64 => Ok(ColumnType::Real),
        Type::String | Type::DateTime | Type::Date | Type::Time => Ok(ColumnType::Text),
        Type::Bytes => Ok(ColumnType::Blob),
    }
}

/// A storage hint must name one of the SQLite storage classes exactly.
fn hinted_type(model: &str, column: &str, hint: &str) -> Result<ColumnType> {
    match hint.to_ascii_uppercase().as_str() {
        "INTEGER" => Ok(ColumnType::Integer),
        "REAL" => Ok(ColumnType::Real),
        "TEXT" => Ok(ColumnType::Text),
        "BLOB" => Ok(ColumnType::Blob),
        _ => Err(Error::schema_inference(model, column, hint)),
    }
}
