//! Typed filter building blocks for generated `{Model}Where` structs.

use crumpet_core::stmt::{Filter, RelationOp, ScalarOp, Value};

/// Lowers a typed where-struct into the dynamic filter tree.
pub trait IntoFilter {
    fn into_filter(self) -> Filter;
}

/// A condition on one scalar column. `From<T>` gives the equality
/// shorthand: `name: Some("Alice".into())`.
#[derive(Debug, Clone)]
pub enum ScalarFilter<T> {
    Eq(T),
    Ne(T),
    Lt(T),
    Lte(T),
    Gt(T),
    Gte(T),
    In(Vec<T>),
    NotIn(Vec<T>),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    IsNull(bool),
}

impl<T: Into<Value>> ScalarFilter<T> {
    pub fn into_filter(self, column: &'static str) -> Filter {
        let op = match self {
            ScalarFilter::Eq(value) => ScalarOp::Eq(value.into()),
            ScalarFilter::Ne(value) => ScalarOp::Ne(value.into()),
            ScalarFilter::Lt(value) => ScalarOp::Lt(value.into()),
            ScalarFilter::Lte(value) => ScalarOp::Lte(value.into()),
            ScalarFilter::Gt(value) => ScalarOp::Gt(value.into()),
            ScalarFilter::Gte(value) => ScalarOp::Gte(value.into()),
            ScalarFilter::In(values) => {
                ScalarOp::In(values.into_iter().map(Into::into).collect())
            }
            ScalarFilter::NotIn(values) => {
                ScalarOp::NotIn(values.into_iter().map(Into::into).collect())
            }
            ScalarFilter::Contains(text) => ScalarOp::Contains(text),
            ScalarFilter::StartsWith(text) => ScalarOp::StartsWith(text),
            ScalarFilter::EndsWith(text) => ScalarOp::EndsWith(text),
            ScalarFilter::IsNull(null) => ScalarOp::IsNull(null),
        };
        Filter::Scalar {
            column: column.to_owned(),
            op,
        }
    }
}

impl<T> From<T> for ScalarFilter<T> {
    fn from(value: T) -> ScalarFilter<T> {
        ScalarFilter::Eq(value)
    }
}

/// A condition on a related model.
#[derive(Debug, Clone)]
pub enum RelationFilter<W> {
    /// A related row exists and satisfies the filter (to-one).
    Is(W),
    IsNot(W),
    /// At least one related row satisfies the filter (to-many).
    Some(W),
    /// No related row satisfies the filter.
    None(W),
    /// Every related row satisfies the filter; vacuously true when the
    /// relation is empty.
    Every(W),
}

impl<W: IntoFilter> RelationFilter<W> {
    pub fn into_filter(self, attr: &'static str) -> Filter {
        let (op, nested) = match self {
            RelationFilter::Is(nested) => (RelationOp::Is, nested),
            RelationFilter::IsNot(nested) => (RelationOp::IsNot, nested),
            RelationFilter::Some(nested) => (RelationOp::Some, nested),
            RelationFilter::None(nested) => (RelationOp::None, nested),
            RelationFilter::Every(nested) => (RelationOp::Every, nested),
        };
        Filter::relation(attr, op, nested.into_filter())
    }
}
