use super::{Field, FieldTy, ForeignKey, Index, PrimaryKey};
use crate::schema::app::{DataSourceId, Relation};

use std::fmt;

#[derive(Debug, Clone)]
pub struct Model {
    /// Uniquely identifies the model within the schema.
    pub id: ModelId,

    /// The record name as written by the author.
    pub name: String,

    /// The record name lower-cased.
    pub table_name: String,

    /// Datasource the model belongs to.
    pub data_source: DataSourceId,

    /// Columns and relations, in declaration order.
    pub fields: Vec<Field>,

    pub primary_key: PrimaryKey,

    /// Secondary indexes, in yield order.
    pub indexes: Vec<Index>,

    /// Virtual foreign keys declared by this model.
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

impl Model {
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.is_column())
    }

    /// Relation fields ordered own-table-first, then by declaration.
    ///
    /// Locality first keeps the generated include unions stable regardless
    /// of where the author interleaves columns and relations.
    pub fn relations_ordered(&self) -> Vec<(&Field, &Relation)> {
        let mut relations: Vec<(&Field, &Relation)> = self
            .fields
            .iter()
            .filter_map(|field| match &field.ty {
                FieldTy::Relation(relation) => Some((field, relation)),
                FieldTy::Column(_) => None,
            })
            .collect();
        relations.sort_by_key(|(field, relation)| (relation.local_fk.is_none(), field.id.index));
        relations
    }

    pub fn primary_key_fields(&self) -> impl Iterator<Item = &Field> {
        self.primary_key.fields.iter().map(|index| &self.fields[*index])
    }

    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.primary_key_fields()
            .map(|field| field.name.as_str())
            .collect()
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}
