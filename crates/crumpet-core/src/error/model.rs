//! Errors raised while inspecting record definitions.

use super::{Error, ErrorKind};

use std::fmt;

#[derive(Debug)]
pub(super) struct UnknownModelReference {
    model: String,
    reference: String,
}

impl Error {
    /// A relation or foreign key names a record that was not passed to the
    /// inspector.
    pub fn unknown_model_reference(
        model: impl Into<String>,
        reference: impl Into<String>,
    ) -> Error {
        ErrorKind::UnknownModelReference(UnknownModelReference {
            model: model.into(),
            reference: reference.into(),
        })
        .into()
    }
}

impl UnknownModelReference {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("reference", self.reference.clone()),
        ]
    }
}

impl fmt::Display for UnknownModelReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown model reference: `{}` referenced by model `{}`",
            self.reference, self.model
        )
    }
}

#[derive(Debug)]
pub(super) struct AmbiguousForeignKey {
    model: String,
    columns: Vec<String>,
}

impl Error {
    /// Multiple `foreign_key` yields name overlapping columns without a
    /// disambiguating remote relation.
    pub fn ambiguous_foreign_key(model: impl Into<String>, columns: Vec<String>) -> Error {
        ErrorKind::AmbiguousForeignKey(AmbiguousForeignKey {
            model: model.into(),
            columns,
        })
        .into()
    }
}

impl AmbiguousForeignKey {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("columns", self.columns.join(", ")),
        ]
    }
}

impl fmt::Display for AmbiguousForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ambiguous foreign key: model `{}` maps columns [{}] through more than one foreign key",
            self.model,
            self.columns.join(", ")
        )
    }
}

#[derive(Debug)]
pub(super) struct MissingPrimaryKey {
    model: String,
}

impl Error {
    /// Neither the auto-increment rule nor an explicit `primary_key` method
    /// applies to the model.
    pub fn missing_primary_key(model: impl Into<String>) -> Error {
        ErrorKind::MissingPrimaryKey(MissingPrimaryKey {
            model: model.into(),
        })
        .into()
    }
}

impl MissingPrimaryKey {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("model", self.model.clone())]
    }
}

impl fmt::Display for MissingPrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing primary key: model `{}` has no auto-increment column and no `primary_key` method",
            self.model
        )
    }
}

#[derive(Debug)]
pub(super) struct DuplicateTable {
    table: String,
    data_source: String,
}

impl Error {
    /// Two models map to the same table within one datasource.
    pub fn duplicate_table(table: impl Into<String>, data_source: impl Into<String>) -> Error {
        ErrorKind::DuplicateTable(DuplicateTable {
            table: table.into(),
            data_source: data_source.into(),
        })
        .into()
    }
}

impl DuplicateTable {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("table", self.table.clone()),
            ("data_source", self.data_source.clone()),
        ]
    }
}

impl fmt::Display for DuplicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicate table: `{}` is declared twice in datasource `{}`",
            self.table, self.data_source
        )
    }
}

#[derive(Debug)]
pub(super) struct Probe {
    model: String,
    method: String,
    detail: String,
}

impl Error {
    /// A key method yielded something the sentinel receiver cannot interpret.
    pub fn probe(
        model: impl Into<String>,
        method: impl Into<String>,
        detail: impl Into<String>,
    ) -> Error {
        ErrorKind::Probe(Probe {
            model: model.into(),
            method: method.into(),
            detail: detail.into(),
        })
        .into()
    }
}

impl Probe {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("method", self.method.clone()),
            ("detail", self.detail.clone()),
        ]
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "probe failed: {}::{}: {}",
            self.model, self.method, self.detail
        )
    }
}

#[derive(Debug)]
pub(super) struct UnresolvedRelation {
    model: String,
    relation: String,
}

impl Error {
    /// A relation attribute has no foreign key binding either side of it.
    pub fn unresolved_relation(model: impl Into<String>, relation: impl Into<String>) -> Error {
        ErrorKind::UnresolvedRelation(UnresolvedRelation {
            model: model.into(),
            relation: relation.into(),
        })
        .into()
    }
}

impl UnresolvedRelation {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model", self.model.clone()),
            ("relation", self.relation.clone()),
        ]
    }
}

impl fmt::Display for UnresolvedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved relation: `{}.{}` has no foreign key on either side",
            self.model, self.relation
        )
    }
}

#[derive(Debug)]
pub(super) struct ModelParse {
    detail: String,
}

impl Error {
    /// The model source file is not parseable.
    pub fn model_parse(detail: impl Into<String>) -> Error {
        ErrorKind::ModelParse(ModelParse {
            detail: detail.into(),
        })
        .into()
    }
}

impl ModelParse {
    pub(super) fn context_map(&self) -> Vec<(&'static str, String)> {
        vec![("detail", self.detail.clone())]
    }
}

impl fmt::Display for ModelParse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model source failed to parse: {}", self.detail)
    }
}
