//! crumpet — a typed ORM client generator and runtime for SQLite.
//!
//! A model module (plain record structs whose key methods yield references
//! to their own attributes) is inspected into a schema graph; [`generate`]
//! renders a statically typed client module from it, and [`push`]
//! reconciles a live database with the declared shape. The runtime
//! executes typed CRUD with eager and lazy relation loading.

mod client;
pub use client::{BackendSet, ClientOptions};

mod engine;
pub use engine::{
    AttachCx, Attachment, Backend, ErasedRecord, ModelVtable, QueryArgs, Record,
};

mod filter;
pub use filter::{IntoFilter, RelationFilter, ScalarFilter};

mod push;
pub use push::{push, PushOptions};

mod relation;
pub use relation::{BelongsTo, HasMany, HasOne, Link};

pub mod codegen_support;

pub use crumpet_codegen::{generate, inspect, GeneratedModule};
pub use crumpet_core::{Error, ErrorCategory, Result};
pub use crumpet_sqlite::{Connection, ConnectionSource, Row, Sqlite};

pub use crumpet_core::schema;
pub use crumpet_core::stmt;
