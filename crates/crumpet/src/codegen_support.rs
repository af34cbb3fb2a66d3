//! Everything a generated client module needs, re-exported under one
//! glob-importable path.

pub use crate::client::{BackendSet, ClientOptions};
pub use crate::engine::{
    AttachCx, Attachment, Backend, ErasedRecord, ModelVtable, QueryArgs, Record,
};
pub use crate::filter::{IntoFilter, RelationFilter, ScalarFilter};
pub use crate::relation::{BelongsTo, HasMany, HasOne};

pub use crumpet_core::schema::spec::{
    Cardinality, ColumnSpec, DataSourceConfig, ForeignKeySpec, IndexSpec, RelationSpec, TableSpec,
};
pub use crumpet_core::stmt::{Direction, Filter, InsertRow, OrderBy, Value};
pub use crumpet_core::{Error, Result};

pub use crumpet_sqlite::{Connection, ConnectionSource, Row};

pub use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

pub use std::sync::Arc;
