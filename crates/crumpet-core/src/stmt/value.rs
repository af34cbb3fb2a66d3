use crate::{Error, Result};

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// A scalar value crossing the boundary between models and the store.
///
/// Date and time values travel as their chrono types inside the runtime and
/// are rendered to ISO-8601 text at the driver boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion errors.
    pub fn ty_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::I64(_) => "I64",
            Value::F64(_) => "F64",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::DateTime(_) => "DateTime",
            Value::Date(_) => "Date",
            Value::Time(_) => "Time",
        }
    }

    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Value::I64(v) => Ok(*v),
            other => Err(Error::type_conversion("i64", other.ty_name())),
        }
    }

    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Value::F64(v) => Ok(*v),
            Value::I64(v) => Ok(*v as f64),
            other => Err(Error::type_conversion("f64", other.ty_name())),
        }
    }

    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            Value::I64(v) => Ok(*v != 0),
            other => Err(Error::type_conversion("bool", other.ty_name())),
        }
    }

    pub fn to_text(&self) -> Result<String> {
        match self {
            Value::String(v) => Ok(v.clone()),
            other => Err(Error::type_conversion("String", other.ty_name())),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(Error::type_conversion("Vec<u8>", other.ty_name())),
        }
    }

    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        match self {
            Value::DateTime(v) => Ok(*v),
            Value::String(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| Error::type_conversion("DateTime<Utc>", text.clone())),
            other => Err(Error::type_conversion("DateTime<Utc>", other.ty_name())),
        }
    }

    pub fn to_date(&self) -> Result<NaiveDate> {
        match self {
            Value::Date(v) => Ok(*v),
            Value::String(text) => text
                .parse()
                .map_err(|_| Error::type_conversion("NaiveDate", text.clone())),
            other => Err(Error::type_conversion("NaiveDate", other.ty_name())),
        }
    }

    pub fn to_time(&self) -> Result<NaiveTime> {
        match self {
            Value::Time(v) => Ok(*v),
            Value::String(text) => text
                .parse()
                .map_err(|_| Error::type_conversion("NaiveTime", text.clone())),
            other => Err(Error::type_conversion("NaiveTime", other.ty_name())),
        }
    }

    pub fn to_i64_opt(&self) -> Result<Option<i64>> {
        self.opt(Value::to_i64)
    }

    pub fn to_f64_opt(&self) -> Result<Option<f64>> {
        self.opt(Value::to_f64)
    }

    pub fn to_bool_opt(&self) -> Result<Option<bool>> {
        self.opt(Value::to_bool)
    }

    pub fn to_text_opt(&self) -> Result<Option<String>> {
        self.opt(Value::to_text)
    }

    pub fn to_bytes_opt(&self) -> Result<Option<Vec<u8>>> {
        self.opt(Value::to_bytes)
    }

    pub fn to_datetime_opt(&self) -> Result<Option<DateTime<Utc>>> {
        self.opt(Value::to_datetime)
    }

    pub fn to_date_opt(&self) -> Result<Option<NaiveDate>> {
        self.opt(Value::to_date)
    }

    pub fn to_time_opt(&self) -> Result<Option<NaiveTime>> {
        self.opt(Value::to_time)
    }

    fn opt<T>(&self, convert: impl FnOnce(&Value) -> Result<T>) -> Result<Option<T>> {
        if self.is_null() {
            Ok(None)
        } else {
            convert(self).map(Some)
        }
    }

    /// Renders the value the way it is stored: chrono types become ISO-8601
    /// text, booleans become integers.
    pub fn into_stored(self) -> Value {
        match self {
            Value::Bool(v) => Value::I64(v as i64),
            Value::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Date(d) => Value::String(d.to_string()),
            Value::Time(t) => Value::String(t.to_string()),
            other => other,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::F64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Value {
        Value::Bytes(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Value {
        Value::DateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Value {
        Value::Date(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Value {
        Value::Time(value)
    }
}

impl<T> From<Option<T>> for Value
where
    Value: From<T>,
{
    fn from(value: Option<T>) -> Value {
        match value {
            Some(value) => Value::from(value),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;

    #[test]
    fn datetime_round_trips_through_stored_text() {
        let dt: DateTime<Utc> = "2025-03-01T10:30:00Z".parse().unwrap();
        let stored = Value::from(dt).into_stored();
        assert!(matches!(&stored, Value::String(_)));
        assert_eq!(stored.to_datetime().unwrap(), dt);
    }

    #[test]
    fn bool_stored_as_integer() {
        assert_eq!(Value::from(true).into_stored(), Value::I64(1));
        assert_eq!(Value::I64(0).to_bool().unwrap(), false);
    }

    #[test]
    fn null_opt_conversions() {
        assert_eq!(Value::Null.to_text_opt().unwrap(), None);
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
    }

    #[test]
    fn conversion_mismatch_is_categorized() {
        let err = Value::String("x".into()).to_i64().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TypeConversion);
    }
}
