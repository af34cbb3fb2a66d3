//! Errors raised while building or pushing database schemas.

use super::{Error, ErrorKind};

use std::fmt;

#[derive(Debug)]
pub(super) struct SchemaInference {
    model: String,
    column: String,
    ty: String,
}

impl Error {
    /// No storage mapping exists for a column's annotation.
    pub fn schema_inference(
        model: impl Into<String>,
        column: impl Into<String>,
        ty: impl Into<String>,
    ) -> Error {
        ErrorKind::SchemaInference(SchemaInference {
            model: model.into(),
            column: column.into(),
            ty: ty.into(),
        })
        .into()
    }
}

impl SchemaInference {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("column", self.column.clone()),
            ("type", self.ty.clone()),
        ]
    }
}

impl fmt::Display for SchemaInference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no storage type for `{}.{}` with annotation `{}`",
            self.model, self.column, self.ty
        )
    }
}

#[derive(Debug)]
pub(super) struct RebuildRejected {
    table: String,
}

impl Error {
    /// A destructive table rebuild was required but not confirmed.
    pub fn rebuild_rejected(table: impl Into<String>) -> Error {
        ErrorKind::RebuildRejected(RebuildRejected {
            table: table.into(),
        })
        .into()
    }
}

impl RebuildRejected {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("table", self.table.clone())]
    }
}

impl fmt::Display for RebuildRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rebuild rejected: table `{}` requires a destructive rebuild that was not confirmed",
            self.table
        )
    }
}

#[derive(Debug)]
pub(super) struct UnsupportedProvider {
    provider: String,
}

impl Error {
    /// The datasource names a provider other than the embedded store.
    pub fn unsupported_provider(provider: impl Into<String>) -> Error {
        ErrorKind::UnsupportedProvider(UnsupportedProvider {
            provider: provider.into(),
        })
        .into()
    }
}

impl UnsupportedProvider {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("provider", self.provider.clone())]
    }
}

impl fmt::Display for UnsupportedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported provider: `{}`", self.provider)
    }
}
