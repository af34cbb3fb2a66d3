//! Conversions between the runtime value model and the driver's types.

use crumpet_core::stmt::Value;
use crumpet_core::{Error, Result};

use rusqlite::types::{ToSqlOutput, Value as SqliteValue, ValueRef};

/// Borrowing adapter so runtime values can bind as statement parameters.
pub(crate) struct SqlValue<'a>(pub(crate) &'a Value);

impl rusqlite::ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Bool(value) => ToSqlOutput::Owned(SqliteValue::Integer(*value as i64)),
            Value::I64(value) => ToSqlOutput::Owned(SqliteValue::Integer(*value)),
            Value::F64(value) => ToSqlOutput::Owned(SqliteValue::Real(*value)),
            Value::String(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            Value::Bytes(value) => ToSqlOutput::Borrowed(ValueRef::Blob(value)),
            // Chrono values normally reach the driver already rendered to
            // ISO-8601 text; these delegate to the driver's encoding when
            // one slips through unrendered.
            Value::DateTime(value) => value.to_sql()?,
            Value::Date(value) => value.to_sql()?,
            Value::Time(value) => value.to_sql()?,
        })
    }
}

/// Reads a result cell into the runtime value model. Typed reinterpretation
/// (dates, booleans, enums) is the static deserializers' concern.
pub(crate) fn from_sql(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(value) => Value::I64(value),
        ValueRef::Real(value) => Value::F64(value),
        ValueRef::Text(bytes) => Value::String(
            std::str::from_utf8(bytes)
                .map_err(|_| Error::type_conversion("String", "invalid utf-8 text"))?
                .to_owned(),
        ),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}
