//! Errors raised while executing queries at runtime.

use super::{Error, ErrorKind};

use std::fmt;

#[derive(Debug)]
pub(super) struct InvalidFilter {
    model: String,
    key: String,
    detail: String,
}

impl Error {
    /// A filter map contains a key the model does not recognize, or an
    /// operator applied to the wrong kind of key.
    pub fn invalid_filter(
        model: impl Into<String>,
        key: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        ErrorKind::InvalidFilter(InvalidFilter {
            model: model.into(),
            key: key.into(),
            detail: detail.into(),
        })
        .into()
    }
}

impl InvalidFilter {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("key", self.key.clone()),
            ("detail", self.detail.clone()),
        ]
    }
}

impl fmt::Display for InvalidFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid filter on `{}`: key `{}`: {}",
            self.model, self.key, self.detail
        )
    }
}

#[derive(Debug)]
pub(super) struct IntegrityViolation {
    table: String,
    detail: String,
}

impl Error {
    /// The store rejected a write for violating a unique constraint.
    pub fn integrity_violation(table: impl Into<String>, detail: impl Into<String>) -> Error {
        ErrorKind::IntegrityViolation(IntegrityViolation {
            table: table.into(),
            detail: detail.into(),
        })
        .into()
    }
}

impl IntegrityViolation {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("table", self.table.clone()),
            ("detail", self.detail.clone()),
        ]
    }
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integrity violation on table `{}`: {}",
            self.table, self.detail
        )
    }
}

#[derive(Debug)]
pub(super) struct NoSuchTable {
    table: String,
}

impl Error {
    /// The live database has no table of the expected name (schema drift).
    pub fn no_such_table(table: impl Into<String>) -> Error {
        ErrorKind::NoSuchTable(NoSuchTable {
            table: table.into(),
        })
        .into()
    }
}

impl NoSuchTable {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("table", self.table.clone())]
    }
}

impl fmt::Display for NoSuchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no such table: `{}`", self.table)
    }
}

#[derive(Debug)]
pub(super) struct RelationUnresolvable {
    model: String,
    relation: String,
}

impl Error {
    /// Lazily resolving a relation found no target to load.
    pub fn relation_unresolvable(model: impl Into<String>, relation: impl Into<String>) -> Error {
        ErrorKind::RelationUnresolvable(RelationUnresolvable {
            model: model.into(),
            relation: relation.into(),
        })
        .into()
    }
}

impl RelationUnresolvable {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("relation", self.relation.clone()),
        ]
    }
}

impl fmt::Display for RelationUnresolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "relation `{}.{}` could not be resolved",
            self.model, self.relation
        )
    }
}

#[derive(Debug)]
pub(super) struct ConnectionUsage {
    detail: String,
}

impl Error {
    /// A single-connection backend was touched from a foreign thread.
    pub fn connection_usage(detail: impl Into<String>) -> Error {
        ErrorKind::ConnectionUsage(ConnectionUsage {
            detail: detail.into(),
        })
        .into()
    }
}

impl ConnectionUsage {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("detail", self.detail.clone())]
    }
}

impl fmt::Display for ConnectionUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection usage error: {}", self.detail)
    }
}

#[derive(Debug)]
pub(super) struct ConnectionClosed;

impl Error {
    /// The underlying connection was closed while an operation needed it.
    pub fn connection_closed() -> Error {
        ErrorKind::ConnectionClosed(ConnectionClosed).into()
    }
}

impl ConnectionClosed {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![]
    }
}

impl fmt::Display for ConnectionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection closed")
    }
}

#[derive(Debug)]
pub(super) struct TypeConversion {
    expected: &'static str,
    actual: String,
}

impl Error {
    /// A stored value could not be converted to the expected column type.
    pub fn type_conversion(expected: &'static str, actual: impl Into<String>) -> Error {
        ErrorKind::TypeConversion(TypeConversion {
            expected,
            actual: actual.into(),
        })
        .into()
    }
}

impl TypeConversion {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("expected", self.expected.to_string()),
            ("actual", self.actual.clone()),
        ]
    }
}

impl fmt::Display for TypeConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot convert {} to {}", self.actual, self.expected)
    }
}

pub(super) struct Driver {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl Error {
    /// Wraps an error reported by the storage driver.
    pub fn driver(source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Error {
        ErrorKind::Driver(Driver {
            source: source.into(),
        })
        .into()
    }
}

impl Driver {
    pub(super) fn source(&self) -> &(dyn std::error::Error + 'static) {
        &*self.source
    }

    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("source", self.source.to_string())]
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver operation failed: {}", self.source)
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Driver({:?})", self.source)
    }
}
