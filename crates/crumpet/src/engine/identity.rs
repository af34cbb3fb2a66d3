//! The per-batch identity map: at most one live instance per
//! `(model, primary key)` within a single query batch.

use crate::engine::ErasedRecord;

use crumpet_core::stmt::Value;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Primary-key values in stored form, usable as a map key.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IdentityKey(Vec<Value>);

impl IdentityKey {
    pub(crate) fn new(values: Vec<Value>) -> IdentityKey {
        IdentityKey(values)
    }
}

impl Eq for IdentityKey {}

impl Hash for IdentityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            std::mem::discriminant(value).hash(state);
            match value {
                Value::Null => {}
                Value::Bool(v) => v.hash(state),
                Value::I64(v) => v.hash(state),
                Value::F64(v) => v.to_bits().hash(state),
                Value::String(v) => v.hash(state),
                Value::Bytes(v) => v.hash(state),
                Value::DateTime(v) => v.hash(state),
                Value::Date(v) => v.hash(state),
                Value::Time(v) => v.hash(state),
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct IdentityMap {
    records: HashMap<(&'static str, IdentityKey), ErasedRecord>,
}

impl IdentityMap {
    pub(crate) fn new() -> IdentityMap {
        IdentityMap::default()
    }

    pub(crate) fn get(&self, model: &'static str, key: &IdentityKey) -> Option<ErasedRecord> {
        self.records.get(&(model, key.clone())).cloned()
    }

    pub(crate) fn insert(&mut self, model: &'static str, key: IdentityKey, record: ErasedRecord) {
        self.records.insert((model, key), record);
    }
}
