use super::ModelId;
use crate::schema::Cardinality;
use crate::stmt::{self, Value};

use std::fmt;

#[derive(Debug, Clone)]
pub struct Field {
    /// Uniquely identifies the field within the containing model.
    pub id: FieldId,

    /// The field name.
    pub name: String,

    /// Column or relation.
    pub ty: FieldTy,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldId {
    pub model: ModelId,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub enum FieldTy {
    Column(Column),
    Relation(Relation),
}

/// A persisted scalar field.
#[derive(Debug, Clone)]
pub struct Column {
    pub ty: stmt::Type,

    /// True if the annotation was `Option<T>`.
    pub nullable: bool,

    /// Declared default, when present.
    pub default: Option<DefaultValue>,

    /// True iff the column is the sole, implicit, integer `id` primary key.
    pub auto_increment: bool,

    /// Storage type named by a `#[storage("…")]` annotation, overriding
    /// the inferred type.
    pub storage_hint: Option<String>,
}

/// A declared field default.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    Literal(Value),
    /// The factory form: the current timestamp at construction.
    Now,
}

/// A non-scalar field referencing another model.
#[derive(Debug, Clone)]
pub struct Relation {
    pub target: ModelId,
    pub cardinality: Cardinality,

    /// Index into the owning model's `foreign_keys` when this side holds
    /// the scalar link columns.
    pub local_fk: Option<usize>,

    /// `(remote model, fk index on it)` when the link lives on the remote
    /// side and this attribute is its backref.
    pub remote_fk: Option<(ModelId, usize)>,
}

impl Field {
    pub fn is_column(&self) -> bool {
        matches!(self.ty, FieldTy::Column(_))
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.ty, FieldTy::Relation(_))
    }

    pub fn as_column(&self) -> Option<&Column> {
        match &self.ty {
            FieldTy::Column(column) => Some(column),
            FieldTy::Relation(_) => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation> {
        match &self.ty {
            FieldTy::Relation(relation) => Some(relation),
            FieldTy::Column(_) => None,
        }
    }

    #[track_caller]
    pub fn expect_column(&self) -> &Column {
        match &self.ty {
            FieldTy::Column(column) => column,
            FieldTy::Relation(_) => panic!("expected column field, but `{}` is a relation", self.name),
        }
    }

    #[track_caller]
    pub fn expect_relation(&self) -> &Relation {
        match &self.ty {
            FieldTy::Relation(relation) => relation,
            FieldTy::Column(_) => panic!("expected relation field, but `{}` is a column", self.name),
        }
    }
}

impl DefaultValue {
    /// True for defaults produced by a factory rather than a stored literal.
    pub fn is_factory(&self) -> bool {
        matches!(self, DefaultValue::Now)
    }
}

impl fmt::Debug for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({}/{})", self.model.0, self.index)
    }
}
