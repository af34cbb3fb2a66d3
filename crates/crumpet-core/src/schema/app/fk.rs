use super::{Field, FieldId, ModelId};
use crate::schema::app::Schema;

/// A virtual foreign key: column pairs linking two models, plus the
/// relation attributes viewing the link from each side. The storage engine
/// never enforces it; it exists for query planning only.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub pairs: Vec<ForeignKeyPair>,

    /// The model the key points at.
    pub target: ModelId,

    /// Field index of the relation attribute on the owning model.
    pub local_attr: Option<usize>,

    /// Name of the backref relation attribute on the target model.
    pub remote_attr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ForeignKeyPair {
    /// The scalar column on the owning model.
    pub source: FieldId,

    /// The column it maps to on the target model.
    pub target: FieldId,
}

impl ForeignKey {
    pub fn source_columns<'a>(&self, schema: &'a Schema) -> Vec<&'a str> {
        self.pairs
            .iter()
            .map(|pair| pair.source(schema).name.as_str())
            .collect()
    }

    pub fn target_columns<'a>(&self, schema: &'a Schema) -> Vec<&'a str> {
        self.pairs
            .iter()
            .map(|pair| pair.target(schema).name.as_str())
            .collect()
    }
}

impl ForeignKeyPair {
    pub fn source<'a>(&self, schema: &'a Schema) -> &'a Field {
        schema.field(self.source)
    }

    pub fn target<'a>(&self, schema: &'a Schema) -> &'a Field {
        schema.field(self.target)
    }
}
