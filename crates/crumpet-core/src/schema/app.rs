//! The inspected model graph, produced once per `generate` or push
//! invocation and immutable afterwards.

mod field;
pub use field::{Column, DefaultValue, Field, FieldId, FieldTy, Relation};

mod fk;
pub use fk::{ForeignKey, ForeignKeyPair};

mod index;
pub use index::Index;

mod model;
pub use model::{Model, ModelId};

mod pk;
pub use pk::PrimaryKey;

use crate::stmt::EnumId;

use indexmap::IndexMap;

/// Everything the inspector learned from a set of model sources.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub models: Vec<Model>,
    pub enums: Vec<EnumDef>,
    pub data_sources: Vec<DataSource>,
}

/// An enum column type with its member-to-scalar mapping.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub id: EnumId,
    pub name: String,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: String,
    /// The scalar stored in the column for this member.
    pub discriminant: i64,
}

/// A datasource descriptor taken from a model module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub id: DataSourceId,
    pub key: String,
    pub provider: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataSourceId(pub usize);

impl Schema {
    pub fn model(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.models[id.model.0].fields[id.index]
    }

    pub fn enum_def(&self, id: EnumId) -> &EnumDef {
        &self.enums[id.0]
    }

    pub fn enum_by_name(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|def| def.name == name)
    }

    pub fn data_source(&self, id: DataSourceId) -> &DataSource {
        &self.data_sources[id.0]
    }

    /// Models grouped by datasource key, preserving declaration order.
    pub fn models_by_data_source(&self) -> IndexMap<&str, Vec<&Model>> {
        let mut grouped: IndexMap<&str, Vec<&Model>> = IndexMap::new();
        for model in &self.models {
            let key = self.data_source(model.data_source).key.as_str();
            grouped.entry(key).or_default().push(model);
        }
        grouped
    }
}
