//! The runtime engine: typed CRUD over the untyped executor, with a
//! per-batch identity map, eager prefetch, and lazy relation links.

mod identity;
pub(crate) use identity::IdentityKey;
use identity::IdentityMap;

use crate::relation::Link;

use crumpet_core::schema::spec::{DataSourceConfig, RelationSpec, SpecLookup, TableSpec};
use crumpet_core::stmt::{Filter, InsertRow, OrderBy, ScalarOp, Value};
use crumpet_core::{Error, Result};
use crumpet_sql::stmt::{Insert, Select};
use crumpet_sql::{Serializer, Statement};
use crumpet_sqlite::{ConnectionSource, Executor, Row};

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A materialized record with its concrete type erased, shared through the
/// identity map.
pub type ErasedRecord = Arc<dyn Any + Send + Sync>;

/// A generated record type.
pub trait Record: Send + Sync + Sized + 'static {
    const VTABLE: &'static ModelVtable;

    fn spec() -> &'static TableSpec {
        Self::VTABLE.spec
    }
}

/// Static entry points the engine uses to materialize one model without
/// reflection.
pub struct ModelVtable {
    pub spec: &'static TableSpec,
    pub deserialize: fn(&Row) -> Result<ErasedRecord>,
    pub attach: fn(&ErasedRecord, &AttachCx<'_>) -> Result<()>,
}

/// Options of a `find_many`/`find_first` call, lowered from the generated
/// query structs.
#[derive(Default)]
pub struct QueryArgs {
    pub filter: Option<Filter>,
    /// Related type names to prefetch.
    pub include: Vec<&'static str>,
    pub order_by: Vec<OrderBy>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
}

/// What a relation handle receives when its owner is materialized.
pub enum Attachment {
    /// Prefetched related records, already shared through the batch's
    /// identity map.
    Resolved(Vec<ErasedRecord>),
    /// Resolution deferred to first access.
    Link(Link),
}

/// Passed to a generated `attach` function while its instance is wired.
pub struct AttachCx<'a> {
    spec: &'static TableSpec,
    prefetched: &'a HashMap<&'static str, HashMap<IdentityKey, Vec<ErasedRecord>>>,
    lazy: &'a HashMap<&'static str, Arc<LazyGroup>>,
}

impl AttachCx<'_> {
    /// Resolves one relation attribute: prefetched rows when the relation
    /// was included, a lazy link into the batch's shared state otherwise.
    pub fn relation(&self, name: &'static str, own_values: Vec<Value>) -> Result<Attachment> {
        let non_null = own_values.iter().all(|value| !value.is_null());
        let key = IdentityKey::new(own_values.into_iter().map(Value::into_stored).collect());

        if let Some(groups) = self.prefetched.get(name) {
            return Ok(Attachment::Resolved(
                groups.get(&key).cloned().unwrap_or_default(),
            ));
        }

        let group = self.lazy.get(name).ok_or_else(|| {
            Error::msg(format!(
                "model `{}` has no relation `{name}`",
                self.spec.model
            ))
        })?;

        Ok(Attachment::Link(Link {
            group: group.clone(),
            // A null link column can never join to a row.
            key: non_null.then_some(key),
        }))
    }
}

/// Lazy-relation state shared by every instance of one batch: the first
/// access loads the related rows of **all** parents in a single query;
/// later accesses, on any sibling, read from the loaded groups.
pub(crate) struct LazyGroup {
    backend: Arc<Backend>,
    source_model: &'static str,
    relation: &'static str,
    target: &'static str,
    join: &'static [(&'static str, &'static str)],
    /// Join-column values of every parent in the batch.
    keys: Vec<Vec<Value>>,
    loaded: std::sync::Mutex<Option<HashMap<IdentityKey, Vec<ErasedRecord>>>>,
}

impl LazyGroup {
    pub(crate) fn fetch(&self, key: Option<&IdentityKey>) -> Result<Vec<ErasedRecord>> {
        let Some(key) = key else {
            return Ok(Vec::new());
        };

        let mut loaded = self.loaded.lock().unwrap();
        if loaded.is_none() {
            let vtable = self.backend.vtable(self.target).ok_or_else(|| {
                Error::relation_unresolvable(self.source_model, self.relation)
            })?;
            let mut batch = IdentityMap::new();
            let groups =
                self.backend
                    .fetch_related_groups(vtable, self.join, &self.keys, &mut batch)?;
            // Only a successful load resolves the state; an error leaves it
            // unresolved for the next attempt.
            *loaded = Some(groups);
        }

        Ok(loaded
            .as_ref()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }
}

/// One datasource's runtime: an executor plus the vtables of every model
/// stored there.
pub struct Backend {
    executor: Executor,
    registry: Vec<&'static ModelVtable>,
    data_source: DataSourceConfig,
}

impl SpecLookup for Backend {
    fn spec(&self, model: &str) -> Option<&'static TableSpec> {
        self.vtable(model).map(|vtable| vtable.spec)
    }
}

impl Backend {
    pub fn new(
        data_source: DataSourceConfig,
        registry: Vec<&'static ModelVtable>,
        source: ConnectionSource,
        echo_sql: bool,
    ) -> Arc<Backend> {
        Arc::new(Backend {
            executor: Executor::new(source, echo_sql),
            registry,
            data_source,
        })
    }

    pub fn data_source(&self) -> &DataSourceConfig {
        &self.data_source
    }

    fn vtable(&self, model: &str) -> Option<&'static ModelVtable> {
        self.registry
            .iter()
            .find(|vtable| vtable.spec.model == model)
            .copied()
    }

    pub fn find_many<R: Record>(self: &Arc<Self>, args: QueryArgs) -> Result<Vec<Arc<R>>> {
        let mut batch = IdentityMap::new();
        let records = self.select_into(
            R::VTABLE,
            args.filter,
            args.order_by,
            args.take,
            args.skip,
            &args.include,
            &mut batch,
        )?;
        records.into_iter().map(downcast_record::<R>).collect()
    }

    pub fn find_first<R: Record>(self: &Arc<Self>, mut args: QueryArgs) -> Result<Option<Arc<R>>> {
        args.take = Some(1);
        Ok(self.find_many::<R>(args)?.into_iter().next())
    }

    pub fn insert<R: Record>(self: &Arc<Self>, row: InsertRow) -> Result<Arc<R>> {
        self.insert_rows::<R>(vec![row], None)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::msg("inserted row could not be reloaded"))
    }

    pub fn insert_many<R: Record>(
        self: &Arc<Self>,
        rows: Vec<InsertRow>,
        batch_size: Option<usize>,
    ) -> Result<Vec<Arc<R>>> {
        self.insert_rows::<R>(rows, batch_size)
    }

    pub fn query_raw(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        Ok(self.executor.query(sql, params)?.into_rows())
    }

    pub fn execute_raw(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.executor.execute(sql, params)
    }

    pub fn close(&self) {
        self.executor.close();
    }

    #[allow(clippy::too_many_arguments)]
    fn select_into(
        self: &Arc<Self>,
        vtable: &'static ModelVtable,
        filter: Option<Filter>,
        order_by: Vec<OrderBy>,
        take: Option<u64>,
        skip: Option<u64>,
        include: &[&'static str],
        batch: &mut IdentityMap,
    ) -> Result<Vec<ErasedRecord>> {
        let spec = vtable.spec;
        let stmt = Statement::Select(Select {
            spec,
            filter,
            order_by,
            take,
            skip,
        });

        let mut params = Vec::new();
        let sql = Serializer::sqlite(self.as_lookup()).serialize(&stmt, &mut params)?;

        let columns = Arc::new(
            spec.column_names()
                .map(|name| name.to_owned())
                .collect::<Vec<_>>(),
        );
        let rows = self
            .executor
            .query(&sql, &params)?
            .into_rows_named(columns);

        self.materialize(vtable, rows, include, batch)
    }

    /// Builds instances for the rows, deduplicating through the batch's
    /// identity map, prefetching included relations, and wiring relation
    /// handles on every freshly created instance.
    fn materialize(
        self: &Arc<Self>,
        vtable: &'static ModelVtable,
        rows: Vec<Row>,
        include: &[&'static str],
        batch: &mut IdentityMap,
    ) -> Result<Vec<ErasedRecord>> {
        let spec = vtable.spec;

        let mut records = Vec::with_capacity(rows.len());
        let mut fresh = Vec::new();

        for row in &rows {
            let key = identity_key(spec, row);
            if let Some(key) = &key {
                if let Some(existing) = batch.get(spec.model, key) {
                    records.push(existing);
                    continue;
                }
            }

            let record = (vtable.deserialize)(row)?;
            if let Some(key) = key {
                batch.insert(spec.model, key, record.clone());
            }
            fresh.push(record.clone());
            records.push(record);
        }

        let mut prefetched: HashMap<&'static str, HashMap<IdentityKey, Vec<ErasedRecord>>> =
            HashMap::new();
        let mut lazy: HashMap<&'static str, Arc<LazyGroup>> = HashMap::new();

        for relation in spec.relations {
            let keys = parent_keys(relation, &rows);
            if include.contains(&relation.target) {
                let vtable = self.vtable(relation.target).ok_or_else(|| {
                    Error::relation_unresolvable(spec.model, relation.name)
                })?;
                let groups = self.fetch_related_groups(vtable, relation.join, &keys, batch)?;
                prefetched.insert(relation.name, groups);
            } else {
                lazy.insert(
                    relation.name,
                    Arc::new(LazyGroup {
                        backend: self.clone(),
                        source_model: spec.model,
                        relation: relation.name,
                        target: relation.target,
                        join: relation.join,
                        keys,
                        loaded: std::sync::Mutex::new(None),
                    }),
                );
            }
        }

        let cx = AttachCx {
            spec,
            prefetched: &prefetched,
            lazy: &lazy,
        };
        for record in &fresh {
            (vtable.attach)(record, &cx)?;
        }

        Ok(records)
    }

    /// Loads the related rows joining any of the given key tuples in one
    /// query, and groups them by their join-column values.
    fn fetch_related_groups(
        self: &Arc<Self>,
        vtable: &'static ModelVtable,
        join: &'static [(&'static str, &'static str)],
        keys: &[Vec<Value>],
        batch: &mut IdentityMap,
    ) -> Result<HashMap<IdentityKey, Vec<ErasedRecord>>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let filter = if join.len() == 1 {
            let (_, remote) = join[0];
            Filter::Scalar {
                column: remote.to_owned(),
                op: ScalarOp::In(keys.iter().map(|values| values[0].clone()).collect()),
            }
        } else {
            Filter::Or(
                keys.iter()
                    .map(|values| {
                        Filter::And(
                            join.iter()
                                .zip(values)
                                .map(|(&(_, remote), value)| Filter::eq(remote, value.clone()))
                                .collect(),
                        )
                    })
                    .collect(),
            )
        };

        let stmt = Statement::Select(Select {
            spec: vtable.spec,
            filter: Some(filter),
            order_by: Vec::new(),
            take: None,
            skip: None,
        });
        let mut params = Vec::new();
        let sql = Serializer::sqlite(self.as_lookup()).serialize(&stmt, &mut params)?;
        let columns = Arc::new(
            vtable
                .spec
                .column_names()
                .map(|name| name.to_owned())
                .collect::<Vec<_>>(),
        );
        let child_rows = self
            .executor
            .query(&sql, &params)?
            .into_rows_named(columns);

        let children = self.materialize(vtable, child_rows.clone(), &[], batch)?;

        let mut groups: HashMap<IdentityKey, Vec<ErasedRecord>> = HashMap::new();
        for (row, child) in child_rows.iter().zip(children) {
            let Some(values) = remote_join_values(join, row) else {
                continue;
            };
            groups.entry(IdentityKey::new(values)).or_default().push(child);
        }

        Ok(groups)
    }

    fn insert_rows<R: Record>(
        self: &Arc<Self>,
        rows: Vec<InsertRow>,
        batch_size: Option<usize>,
    ) -> Result<Vec<Arc<R>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let spec = R::VTABLE.spec;
        if rows[0].is_empty() {
            return Err(Error::msg(format!(
                "insert payload for `{}` cannot be empty",
                spec.model
            )));
        }

        // The first payload fixes the column list; later payloads fill
        // missing columns with NULL.
        let columns: Vec<&'static str> = rows[0].columns().to_vec();

        let step = batch_size.filter(|step| *step > 0).unwrap_or(rows.len());
        let mut key_sets: Vec<Vec<Value>> = Vec::with_capacity(rows.len());

        for chunk in rows.chunks(step) {
            let values: Vec<Vec<Value>> = chunk
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect();

            let stmt = Statement::Insert(Insert {
                table: spec.table.to_owned(),
                columns: columns.iter().map(|column| column.to_string()).collect(),
                rows: values,
            });
            let mut params = Vec::new();
            let sql = Serializer::sqlite(self.as_lookup()).serialize(&stmt, &mut params)?;
            let (_, last_rowid) = self.executor.execute_returning_rowid(&sql, &params)?;

            // Generated keys of a single multi-row insert are contiguous
            // ending at the last rowid.
            let generated_start = spec
                .auto_increment
                .map(|_| last_rowid - chunk.len() as i64 + 1);

            for (offset, row) in chunk.iter().enumerate() {
                let mut key = Vec::with_capacity(spec.primary_key.len());
                for pk in spec.primary_key {
                    let value = match row.get(pk) {
                        Some(value) if !value.is_null() => value.clone(),
                        _ => match (spec.auto_increment, generated_start) {
                            (Some(auto), Some(start)) if auto == *pk => {
                                Value::I64(start + offset as i64)
                            }
                            _ => {
                                return Err(Error::msg(format!(
                                    "primary key column `{pk}` of `{}` requires a value",
                                    spec.model
                                )))
                            }
                        },
                    };
                    key.push(value);
                }
                key_sets.push(key);
            }
        }

        self.reselect::<R>(spec, key_sets)
    }

    /// Reads inserted rows back in payload order.
    fn reselect<R: Record>(
        self: &Arc<Self>,
        spec: &'static TableSpec,
        key_sets: Vec<Vec<Value>>,
    ) -> Result<Vec<Arc<R>>> {
        let mut batch = IdentityMap::new();

        if spec.primary_key.len() == 1 {
            let filter = Filter::Scalar {
                column: spec.primary_key[0].to_owned(),
                op: ScalarOp::In(key_sets.iter().map(|key| key[0].clone()).collect()),
            };
            self.select_into(R::VTABLE, Some(filter), Vec::new(), None, None, &[], &mut batch)?;
        } else {
            for key in &key_sets {
                let filter = Filter::And(
                    spec.primary_key
                        .iter()
                        .zip(key)
                        .map(|(column, value)| Filter::eq(*column, value.clone()))
                        .collect(),
                );
                self.select_into(R::VTABLE, Some(filter), Vec::new(), None, None, &[], &mut batch)?;
            }
        }

        // Output follows payload order regardless of select order; the
        // identity map carries every reloaded instance.
        let mut results = Vec::with_capacity(key_sets.len());
        for key in key_sets {
            let key = IdentityKey::new(key.into_iter().map(Value::into_stored).collect());
            let record = batch
                .get(spec.model, &key)
                .ok_or_else(|| Error::msg("inserted row could not be reloaded"))?;
            results.push(downcast_record::<R>(record)?);
        }

        Ok(results)
    }

    fn as_lookup(&self) -> &dyn SpecLookup {
        self
    }
}

fn downcast_record<R: Record>(record: ErasedRecord) -> Result<Arc<R>> {
    record
        .downcast::<R>()
        .map_err(|_| Error::msg("registry returned a record of the wrong type"))
}

/// Primary-key identity of a result row; `None` when any key column is
/// null.
fn identity_key(spec: &TableSpec, row: &Row) -> Option<IdentityKey> {
    let mut values = Vec::with_capacity(spec.primary_key.len());
    for column in spec.primary_key {
        let value = row.get(column)?;
        if value.is_null() {
            return None;
        }
        values.push(value.clone());
    }
    Some(IdentityKey::new(values))
}

/// Distinct non-null join-key tuples of the batch's parents, in row order.
fn parent_keys(relation: &RelationSpec, rows: &[Row]) -> Vec<Vec<Value>> {
    let mut keys: Vec<Vec<Value>> = Vec::new();
    for row in rows {
        let Some(values) = side_values(relation.join, row, |&(own, _)| own) else {
            continue;
        };
        if !keys.contains(&values) {
            keys.push(values);
        }
    }
    keys
}

fn remote_join_values(
    join: &'static [(&'static str, &'static str)],
    row: &Row,
) -> Option<Vec<Value>> {
    side_values(join, row, |&(_, remote)| remote)
}

fn side_values(
    join: &[(&'static str, &'static str)],
    row: &Row,
    side: impl Fn(&(&'static str, &'static str)) -> &'static str,
) -> Option<Vec<Value>> {
    let mut values = Vec::with_capacity(join.len());
    for pair in join {
        let value = row.get(side(pair))?;
        if value.is_null() {
            return None;
        }
        values.push(value.clone());
    }
    Some(values)
}
