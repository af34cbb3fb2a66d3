mod adhoc;
mod model;
mod query;
mod schema;

use adhoc::Message;
use model::{
    AmbiguousForeignKey, DuplicateTable, MissingPrimaryKey, ModelParse, Probe, UnknownModelReference,
    UnresolvedRelation,
};
use query::{
    ConnectionClosed, ConnectionUsage, Driver, IntegrityViolation, InvalidFilter, NoSuchTable,
    RelationUnresolvable, TypeConversion,
};
use schema::{RebuildRejected, SchemaInference, UnsupportedProvider};

use std::sync::Arc;

/// An error raised by any crumpet subsystem.
///
/// Every error belongs to exactly one [`ErrorCategory`] that callers can
/// pattern-match on, carries a human-readable message naming the model or
/// column involved, and exposes its structured details via
/// [`Error::context_map`].
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

#[derive(Debug)]
enum ErrorKind {
    // Model-time
    UnknownModelReference(UnknownModelReference),
    AmbiguousForeignKey(AmbiguousForeignKey),
    MissingPrimaryKey(MissingPrimaryKey),
    DuplicateTable(DuplicateTable),
    Probe(Probe),
    UnresolvedRelation(UnresolvedRelation),
    ModelParse(ModelParse),
    // Schema-time
    SchemaInference(SchemaInference),
    RebuildRejected(RebuildRejected),
    UnsupportedProvider(UnsupportedProvider),
    // Query-time
    InvalidFilter(InvalidFilter),
    IntegrityViolation(IntegrityViolation),
    NoSuchTable(NoSuchTable),
    RelationUnresolvable(RelationUnresolvable),
    ConnectionUsage(ConnectionUsage),
    ConnectionClosed(ConnectionClosed),
    TypeConversion(TypeConversion),
    Driver(Driver),
    // Wrapping
    Message(Message),
}

/// Discriminant for [`Error`], one value per error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    UnknownModelReference,
    AmbiguousForeignKey,
    MissingPrimaryKey,
    DuplicateTable,
    Probe,
    UnresolvedRelation,
    ModelParse,
    SchemaInference,
    RebuildRejected,
    UnsupportedProvider,
    InvalidFilter,
    IntegrityViolation,
    NoSuchTable,
    RelationUnresolvable,
    ConnectionUsage,
    ConnectionClosed,
    TypeConversion,
    Driver,
    Message,
}

impl Error {
    /// The category of the outermost error in the chain.
    pub fn category(&self) -> ErrorCategory {
        use ErrorKind::*;

        match &self.inner.kind {
            UnknownModelReference(_) => ErrorCategory::UnknownModelReference,
            AmbiguousForeignKey(_) => ErrorCategory::AmbiguousForeignKey,
            MissingPrimaryKey(_) => ErrorCategory::MissingPrimaryKey,
            DuplicateTable(_) => ErrorCategory::DuplicateTable,
            Probe(_) => ErrorCategory::Probe,
            UnresolvedRelation(_) => ErrorCategory::UnresolvedRelation,
            ModelParse(_) => ErrorCategory::ModelParse,
            SchemaInference(_) => ErrorCategory::SchemaInference,
            RebuildRejected(_) => ErrorCategory::RebuildRejected,
            UnsupportedProvider(_) => ErrorCategory::UnsupportedProvider,
            InvalidFilter(_) => ErrorCategory::InvalidFilter,
            IntegrityViolation(_) => ErrorCategory::IntegrityViolation,
            NoSuchTable(_) => ErrorCategory::NoSuchTable,
            RelationUnresolvable(_) => ErrorCategory::RelationUnresolvable,
            ConnectionUsage(_) => ErrorCategory::ConnectionUsage,
            ConnectionClosed(_) => ErrorCategory::ConnectionClosed,
            TypeConversion(_) => ErrorCategory::TypeConversion,
            Driver(_) => ErrorCategory::Driver,
            Message(_) => ErrorCategory::Message,
        }
    }

    /// Structured details of the outermost error as key/value pairs.
    pub fn context_map(&self) -> Vec<(&'static str, String)> {
        use ErrorKind::*;

        match &self.inner.kind {
            UnknownModelReference(err) => err.context_map(),
            AmbiguousForeignKey(err) => err.context_map(),
            MissingPrimaryKey(err) => err.context_map(),
            DuplicateTable(err) => err.context_map(),
            Probe(err) => err.context_map(),
            UnresolvedRelation(err) => err.context_map(),
            ModelParse(err) => err.context_map(),
            SchemaInference(err) => err.context_map(),
            RebuildRejected(err) => err.context_map(),
            UnsupportedProvider(err) => err.context_map(),
            InvalidFilter(err) => err.context_map(),
            IntegrityViolation(err) => err.context_map(),
            NoSuchTable(err) => err.context_map(),
            RelationUnresolvable(err) => err.context_map(),
            ConnectionUsage(err) => err.context_map(),
            ConnectionClosed(err) => err.context_map(),
            TypeConversion(err) => err.context_map(),
            Driver(err) => err.context_map(),
            Message(err) => err.context_map(),
        }
    }

    /// Wraps this error with an outer contextual message.
    ///
    /// The chain displays outermost first, ending with the root cause.
    pub fn context(self, message: impl Into<String>) -> Error {
        Error {
            inner: Arc::new(ErrorInner {
                kind: ErrorKind::Message(Message::new(message)),
                cause: Some(self),
            }),
        }
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        std::iter::once(err).chain(std::iter::from_fn(move || {
            err = err.inner.cause.as_ref()?;
            Some(err)
        }))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.inner.kind {
            ErrorKind::Driver(err) => Some(err.source()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            std::fmt::Display::fmt(&err.inner.kind, f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !f.alternate() {
            std::fmt::Display::fmt(self, f)
        } else {
            f.debug_struct("Error")
                .field("kind", &self.inner.kind)
                .field("cause", &self.inner.cause)
                .finish()
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorKind::*;

        match self {
            UnknownModelReference(err) => err.fmt(f),
            AmbiguousForeignKey(err) => err.fmt(f),
            MissingPrimaryKey(err) => err.fmt(f),
            DuplicateTable(err) => err.fmt(f),
            Probe(err) => err.fmt(f),
            UnresolvedRelation(err) => err.fmt(f),
            ModelParse(err) => err.fmt(f),
            SchemaInference(err) => err.fmt(f),
            RebuildRejected(err) => err.fmt(f),
            UnsupportedProvider(err) => err.fmt(f),
            InvalidFilter(err) => err.fmt(f),
            IntegrityViolation(err) => err.fmt(f),
            NoSuchTable(err) => err.fmt(f),
            RelationUnresolvable(err) => err.fmt(f),
            ConnectionUsage(err) => err.fmt(f),
            ConnectionClosed(err) => err.fmt(f),
            TypeConversion(err) => err.fmt(f),
            Driver(err) => err.fmt(f),
            Message(err) => err.fmt(f),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Arc::new(ErrorInner { kind, cause: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_is_one_word() {
        assert_eq!(
            std::mem::size_of::<Error>(),
            std::mem::size_of::<usize>()
        );
    }

    #[test]
    fn category_matches_kind() {
        let err = Error::missing_primary_key("Ledger");
        assert_eq!(err.category(), ErrorCategory::MissingPrimaryKey);
        assert_eq!(err.to_string(), "missing primary key: model `Ledger` has no auto-increment column and no `primary_key` method");
    }

    #[test]
    fn context_chain_display() {
        let err = Error::no_such_table("user").context("push aborted");
        assert_eq!(err.to_string(), "push aborted: no such table: `user`");
        // The outer wrapper owns the category.
        assert_eq!(err.category(), ErrorCategory::Message);
    }

    #[test]
    fn context_map_names_the_parts() {
        let err = Error::invalid_filter("User", "nme", "unknown column or relation");
        let map = err.context_map();
        assert!(map.contains(&("model", "User".to_string())));
        assert!(map.contains(&("key", "nme".to_string())));
    }

    #[test]
    fn probe_error_names_method() {
        let err = Error::probe("Address", "foreign_key", "unsupported expression");
        assert_eq!(
            err.to_string(),
            "probe failed: Address::foreign_key: unsupported expression"
        );
    }
}
