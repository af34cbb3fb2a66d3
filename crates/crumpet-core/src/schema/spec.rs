//! `'static`-friendly runtime mirrors of the inspected schema.
//!
//! Generated client modules embed these as statics; the runtime engine and
//! the where compiler consult them instead of the full app schema.

/// How many related rows a relation attribute can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    OptionalOne,
    Many,
}

/// One datasource declared by a model module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSourceConfig {
    pub key: &'static str,
    pub provider: &'static str,
    pub url: &'static str,
}

/// Runtime description of one model's table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub model: &'static str,
    pub table: &'static str,
    pub data_source: &'static str,
    /// Scalar columns, in declaration order.
    pub columns: &'static [ColumnSpec],
    pub primary_key: &'static [&'static str],
    /// Name of the auto-increment primary-key column, when one exists.
    pub auto_increment: Option<&'static str>,
    pub indexes: &'static [IndexSpec],
    pub foreign_keys: &'static [ForeignKeySpec],
    pub relations: &'static [RelationSpec],
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub nullable: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub columns: &'static [&'static str],
    pub unique: bool,
}

/// A virtual foreign key viewed from the owning (source) model.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeySpec {
    pub columns: &'static [&'static str],
    pub target_model: &'static str,
    pub target_columns: &'static [&'static str],
    /// Relation attribute on the owning model viewing this link.
    pub local_attr: Option<&'static str>,
    /// Relation attribute on the target model viewing it back.
    pub remote_attr: Option<&'static str>,
}

/// A relation attribute with its join predicate precomputed from the
/// foreign-key spec, viewed from the owning model.
#[derive(Debug, Clone, Copy)]
pub struct RelationSpec {
    pub name: &'static str,
    pub target: &'static str,
    pub cardinality: Cardinality,
    /// `(own column, remote column)` pairs joining the two tables.
    pub join: &'static [(&'static str, &'static str)],
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationSpec> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + Clone + '_ {
        self.columns.iter().map(|column| column.name)
    }
}

/// Resolves model names to their table specs.
///
/// Implemented by the runtime registry; the where compiler uses it to reach
/// the specs of relation targets.
pub trait SpecLookup {
    fn spec(&self, model: &str) -> Option<&'static TableSpec>;
}

impl SpecLookup for &[&'static TableSpec] {
    fn spec(&self, model: &str) -> Option<&'static TableSpec> {
        self.iter().find(|spec| spec.model == model).copied()
    }
}
