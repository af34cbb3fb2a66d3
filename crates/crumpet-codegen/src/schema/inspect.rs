//! Builds the app schema from parsed model sources: field resolution,
//! auto-increment detection, key-method probing, forward-reference
//! resolution, and foreign-key binding.

use super::parse::{self, RawDefault, RawRecord, RawSource};
use super::probe::{self, ProbeValue};
use super::ty::{self, ResolvedTy, TypeContext};

use crumpet_core::schema::app::{
    Column, DataSource, DataSourceId, DefaultValue, EnumDef, EnumVariant, Field, FieldId, FieldTy,
    ForeignKey, ForeignKeyPair, Index, Model, ModelId, PrimaryKey, Relation, Schema,
};
use crumpet_core::schema::Cardinality;
use crumpet_core::stmt::{EnumId, Type, Value};
use crumpet_core::{Error, Result};

use std::collections::{HashMap, HashSet};

/// Inspects a set of model sources (one per module) into the schema graph.
pub fn inspect(sources: &[&str]) -> Result<Schema> {
    let raws: Vec<RawSource> = sources
        .iter()
        .map(|source| parse::parse(source))
        .collect::<Result<_>>()?;

    let data_sources = collect_data_sources(&raws)?;
    let (enums, enum_ids) = collect_enums(&raws)?;

    // Flatten records, remembering which module each came from so
    // references prefer local models.
    let mut records: Vec<(usize, &RawRecord)> = Vec::new();
    for (source_index, raw) in raws.iter().enumerate() {
        for record in &raw.records {
            records.push((source_index, record));
        }
    }

    let model_names: Vec<String> = records
        .iter()
        .map(|(_, record)| record.name.clone())
        .collect();

    check_duplicate_tables(&records, &raws, &data_sources)?;

    let type_context = TypeContext {
        models: &model_names,
        enums: &enum_ids,
    };

    // Skeletons: columns resolved, relation targets still names.
    let mut models = Vec::new();
    let mut pending: Vec<HashMap<usize, String>> = Vec::new();

    for (model_index, (source_index, record)) in records.iter().enumerate() {
        let id = ModelId(model_index);
        let data_source = data_source_of(&raws[*source_index], &data_sources);
        let (model, targets) = build_skeleton(id, record, data_source, &type_context)?;
        models.push(model);
        pending.push(targets);
    }

    // Keys and indexes only touch the model's own columns.
    for (model_index, (_, record)) in records.iter().enumerate() {
        apply_keys(&mut models[model_index], record)?;
    }

    // Second pass: forward references resolve against the full model set.
    resolve_relation_targets(&mut models, &pending, &records)?;

    // Foreign keys read remote models, so they bind after resolution.
    let foreign_keys = collect_foreign_keys(&models, &records)?;
    for (model_index, fks) in foreign_keys {
        models[model_index].foreign_keys = fks;
    }

    bind_relations(&mut models)?;

    Ok(Schema {
        models,
        enums,
        data_sources,
    })
}

fn collect_data_sources(raws: &[RawSource]) -> Result<Vec<DataSource>> {
    let mut data_sources: Vec<DataSource> = Vec::new();

    for raw in raws {
        let key = raw
            .data_source
            .name
            .clone()
            .unwrap_or_else(|| raw.data_source.provider.clone());

        match data_sources.iter().find(|existing| existing.key == key) {
            Some(existing) => {
                if existing.provider != raw.data_source.provider
                    || existing.url != raw.data_source.url
                {
                    return Err(Error::model_parse(format!(
                        "datasource `{key}` is declared twice with different settings"
                    )));
                }
            }
            None => {
                data_sources.push(DataSource {
                    id: DataSourceId(data_sources.len()),
                    key,
                    provider: raw.data_source.provider.clone(),
                    url: raw.data_source.url.clone(),
                });
            }
        }
    }

    Ok(data_sources)
}

fn data_source_of(raw: &RawSource, data_sources: &[DataSource]) -> DataSourceId {
    let key = raw
        .data_source
        .name
        .clone()
        .unwrap_or_else(|| raw.data_source.provider.clone());
    data_sources
        .iter()
        .find(|ds| ds.key == key)
        .map(|ds| ds.id)
        .unwrap_or(DataSourceId(0))
}

fn collect_enums(raws: &[RawSource]) -> Result<(Vec<EnumDef>, HashMap<String, EnumId>)> {
    let mut enums = Vec::new();
    let mut ids = HashMap::new();

    for raw in raws {
        for raw_enum in &raw.enums {
            if ids.contains_key(&raw_enum.name) {
                return Err(Error::model_parse(format!(
                    "enum `{}` is declared twice",
                    raw_enum.name
                )));
            }
            let id = EnumId(enums.len());
            ids.insert(raw_enum.name.clone(), id);
            enums.push(EnumDef {
                id,
                name: raw_enum.name.clone(),
                variants: raw_enum
                    .variants
                    .iter()
                    .map(|(name, discriminant)| EnumVariant {
                        name: name.clone(),
                        discriminant: *discriminant,
                    })
                    .collect(),
            });
        }
    }

    Ok((enums, ids))
}

/// Two models with the same table name within one datasource are a hard
/// error; across datasources tables are keyed `(datasource, table)`.
fn check_duplicate_tables(
    records: &[(usize, &RawRecord)],
    raws: &[RawSource],
    data_sources: &[DataSource],
) -> Result<()> {
    let mut seen: HashSet<(DataSourceId, String)> = HashSet::new();
    for (source_index, record) in records {
        let ds = data_source_of(&raws[*source_index], data_sources);
        let table = record.name.to_lowercase();
        if !seen.insert((ds, table.clone())) {
            let key = &data_sources[ds.0].key;
            return Err(Error::duplicate_table(table, key.clone()));
        }
    }
    Ok(())
}

fn build_skeleton(
    id: ModelId,
    record: &RawRecord,
    data_source: DataSourceId,
    type_context: &TypeContext<'_>,
) -> Result<(Model, HashMap<usize, String>)> {
    let mut fields = Vec::new();
    let mut targets = HashMap::new();

    for (index, raw_field) in record.fields.iter().enumerate() {
        let field_id = FieldId { model: id, index };
        let ty = match ty::resolve(type_context, &record.name, &raw_field.name, &raw_field.ty)? {
            ResolvedTy::Column { ty, nullable } => FieldTy::Column(Column {
                ty,
                nullable,
                default: convert_default(&record.name, &raw_field.name, ty, raw_field.default.as_ref())?,
                auto_increment: false,
                storage_hint: raw_field.storage.clone(),
            }),
            ResolvedTy::Relation {
                target,
                cardinality,
            } => {
                targets.insert(index, target);
                FieldTy::Relation(Relation {
                    // Placeholder until the second resolution pass.
                    target: ModelId(usize::MAX),
                    cardinality,
                    local_fk: None,
                    remote_fk: None,
                })
            }
        };
        fields.push(Field {
            id: field_id,
            name: raw_field.name.clone(),
            ty,
        });
    }

    let model = Model {
        id,
        name: record.name.clone(),
        table_name: record.name.to_lowercase(),
        data_source,
        fields,
        primary_key: PrimaryKey {
            fields: Vec::new(),
            auto_increment: false,
        },
        indexes: Vec::new(),
        foreign_keys: Vec::new(),
    };

    Ok((model, targets))
}

fn convert_default(
    model: &str,
    field: &str,
    ty: Type,
    default: Option<&RawDefault>,
) -> Result<Option<DefaultValue>> {
    let Some(default) = default else {
        return Ok(None);
    };
    // `now` is only a timestamp factory, and enum members have no literal
    // spelling in the module the defaults are emitted into.
    if matches!(default, RawDefault::Now) != matches!(ty, Type::DateTime)
        || matches!(ty, Type::Enum(_))
    {
        return Err(bad_default(model, field));
    }
    let value = match default {
        RawDefault::Now => return Ok(Some(DefaultValue::Now)),
        RawDefault::Literal(syn::Lit::Int(lit)) => Value::I64(
            lit.base10_parse()
                .map_err(|_| bad_default(model, field))?,
        ),
        RawDefault::Literal(syn::Lit::Float(lit)) => Value::F64(
            lit.base10_parse()
                .map_err(|_| bad_default(model, field))?,
        ),
        RawDefault::Literal(syn::Lit::Str(lit)) => Value::String(lit.value()),
        RawDefault::Literal(syn::Lit::Bool(lit)) => Value::Bool(lit.value),
        RawDefault::Literal(_) => return Err(bad_default(model, field)),
    };
    Ok(Some(DefaultValue::Literal(value)))
}

fn bad_default(model: &str, field: &str) -> Error {
    Error::model_parse(format!(
        "record `{model}` field `{field}` has an unsupported default literal"
    ))
}

/// Applies `primary_key`, `index`, and `unique` methods, falling back to
/// the auto-increment rule: a sole integer column named `id` with no
/// explicit `primary_key` method.
fn apply_keys(model: &mut Model, record: &RawRecord) -> Result<()> {
    match record.methods.get("primary_key") {
        Some(method) => {
            let value = probe::eval_method(&model.name, method)?;
            let columns = flatten_columns(&model.name, "primary_key", &value)?;
            model.primary_key = PrimaryKey {
                fields: column_indexes(model, "primary_key", &columns)?,
                auto_increment: false,
            };
        }
        None => {
            let auto = model.fields.iter().position(|field| {
                field.name == "id"
                    && field
                        .as_column()
                        .map(|column| column.ty == Type::I64)
                        .unwrap_or(false)
            });
            match auto {
                Some(index) => {
                    model.primary_key = PrimaryKey {
                        fields: vec![index],
                        auto_increment: true,
                    };
                    if let FieldTy::Column(column) = &mut model.fields[index].ty {
                        column.auto_increment = true;
                    }
                }
                None => return Err(Error::missing_primary_key(&model.name)),
            }
        }
    }

    for (method_name, unique) in [("index", false), ("unique", true)] {
        let Some(method) = record.methods.get(method_name) else {
            continue;
        };
        let value = probe::eval_method(&model.name, method)?;
        for entry in index_entries(&value) {
            let columns = flatten_columns(&model.name, method_name, entry)?;
            let fields = column_indexes(model, method_name, &columns)?;
            model.indexes.push(Index { fields, unique });
        }
    }

    Ok(())
}

/// An `index`/`unique` body is one column ref, one tuple (composite), or
/// an array of either (multiple indexes).
fn index_entries(value: &ProbeValue) -> Vec<&ProbeValue> {
    match value {
        ProbeValue::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

/// A column set is a single `self.col` or a tuple of them.
fn flatten_columns(model: &str, method: &str, value: &ProbeValue) -> Result<Vec<String>> {
    let single = |value: &ProbeValue| -> Result<String> {
        match value {
            ProbeValue::Col(path) if path.len() == 1 => Ok(path[0].clone()),
            _ => Err(Error::probe(
                model,
                method,
                "expected a reference to one of the record's own columns",
            )),
        }
    };

    match value {
        ProbeValue::Tuple(items) => items.iter().map(single).collect(),
        other => Ok(vec![single(other)?]),
    }
}

fn column_indexes(model: &Model, method: &str, columns: &[String]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| {
            model
                .fields
                .iter()
                .position(|field| &field.name == name && field.is_column())
                .ok_or_else(|| {
                    Error::probe(
                        &model.name,
                        method,
                        format!("`{name}` is not a declared column"),
                    )
                })
        })
        .collect()
}

/// Resolves each relation's target name against the full model set,
/// preferring a model from the same module.
fn resolve_relation_targets(
    models: &mut [Model],
    pending: &[HashMap<usize, String>],
    records: &[(usize, &RawRecord)],
) -> Result<()> {
    let names: Vec<(usize, String)> = records
        .iter()
        .map(|(source, record)| (*source, record.name.clone()))
        .collect();

    for model_index in 0..models.len() {
        let own_source = names[model_index].0;
        for (field_index, target_name) in &pending[model_index] {
            let candidates: Vec<usize> = names
                .iter()
                .enumerate()
                .filter(|(_, (_, name))| name == target_name)
                .map(|(index, _)| index)
                .collect();

            let target = match candidates.len() {
                0 => {
                    return Err(Error::unknown_model_reference(
                        models[model_index].name.clone(),
                        target_name.clone(),
                    ))
                }
                1 => candidates[0],
                _ => match candidates
                    .iter()
                    .find(|candidate| names[**candidate].0 == own_source)
                {
                    Some(local) => *local,
                    None => {
                        return Err(Error::unknown_model_reference(
                            models[model_index].name.clone(),
                            format!("{target_name} (ambiguous across datasources)"),
                        ))
                    }
                },
            };

            if let FieldTy::Relation(relation) = &mut models[model_index].fields[*field_index].ty {
                relation.target = ModelId(target);
            }
        }
    }

    Ok(())
}

/// Interprets `foreign_key` yields into bound foreign keys.
fn collect_foreign_keys(
    models: &[Model],
    records: &[(usize, &RawRecord)],
) -> Result<Vec<(usize, Vec<ForeignKey>)>> {
    let mut out = Vec::new();

    for (model_index, (_, record)) in records.iter().enumerate() {
        let Some(method) = record.methods.get("foreign_key") else {
            continue;
        };
        let model = &models[model_index];
        let value = probe::eval_method(&model.name, method)?;

        // Group comparison pairs by the local relation attribute they
        // travel through; several pairs through one attribute form a
        // composite key.
        let mut groups: Vec<(usize, ForeignKey)> = Vec::new();

        for yielded in fk_yields(&model.name, &value)? {
            let (comparison, remote_attr) = yielded;
            let bound = bind_comparison(models, model, comparison)?;

            if let Some((remote_model, attr)) = &remote_attr {
                let target = &models[bound.target.0];
                if remote_model != &target.name {
                    return Err(Error::probe(
                        &model.name,
                        "foreign_key",
                        format!(
                            "backref names `{remote_model}` but the comparison joins `{}`",
                            target.name
                        ),
                    ));
                }
                let valid = target
                    .field_by_name(attr)
                    .and_then(Field::as_relation)
                    .map(|relation| relation.target == model.id)
                    .unwrap_or(false);
                if !valid {
                    return Err(Error::unknown_model_reference(
                        model.name.clone(),
                        format!("{remote_model}::{attr}"),
                    ));
                }
            }

            match groups
                .iter_mut()
                .find(|(attr_index, _)| *attr_index == bound.local_attr)
            {
                Some((_, fk)) => {
                    let attr = remote_attr.map(|(_, attr)| attr);
                    if fk.remote_attr != attr && attr.is_some() && fk.remote_attr.is_some() {
                        return Err(Error::ambiguous_foreign_key(
                            model.name.clone(),
                            source_columns_owned(fk, models),
                        ));
                    }
                    if fk.remote_attr.is_none() {
                        fk.remote_attr = attr;
                    }
                    fk.pairs.push(bound.pair);
                }
                None => {
                    groups.push((
                        bound.local_attr,
                        ForeignKey {
                            pairs: vec![bound.pair],
                            target: bound.target,
                            local_attr: Some(bound.local_attr),
                            remote_attr: remote_attr.map(|(_, attr)| attr),
                        },
                    ));
                }
            }
        }

        let fks: Vec<ForeignKey> = groups.into_iter().map(|(_, fk)| fk).collect();
        check_overlapping(model, models, &fks)?;
        out.push((model_index, fks));
    }

    Ok(out)
}

fn source_columns_owned(fk: &ForeignKey, models: &[Model]) -> Vec<String> {
    fk.pairs
        .iter()
        .map(|pair| models[pair.source.model.0].fields[pair.source.index].name.clone())
        .collect()
}

/// Two keys mapping overlapping local columns are ambiguous unless both
/// name distinct remote relations.
fn check_overlapping(model: &Model, models: &[Model], fks: &[ForeignKey]) -> Result<()> {
    for (i, a) in fks.iter().enumerate() {
        for b in &fks[i + 1..] {
            let a_cols: HashSet<usize> = a.pairs.iter().map(|pair| pair.source.index).collect();
            let overlaps = b
                .pairs
                .iter()
                .any(|pair| a_cols.contains(&pair.source.index));
            if !overlaps {
                continue;
            }
            let disambiguated = a.remote_attr.is_some()
                && b.remote_attr.is_some()
                && a.remote_attr != b.remote_attr;
            if !disambiguated {
                let mut columns = source_columns_owned(a, models);
                columns.extend(source_columns_owned(b, models));
                columns.dedup();
                return Err(Error::ambiguous_foreign_key(model.name.clone(), columns));
            }
        }
    }
    Ok(())
}

/// Normalizes the probed body into `(comparison, backref?)` entries.
fn fk_yields<'v>(
    model: &str,
    value: &'v ProbeValue,
) -> Result<Vec<(&'v ProbeValue, Option<(String, String)>)>> {
    let entry = |value: &'v ProbeValue| -> Result<(&'v ProbeValue, Option<(String, String)>)> {
        match value {
            ProbeValue::Cmp { .. } => Ok((value, None)),
            ProbeValue::Tuple(items) => match &items[..] {
                [cmp @ ProbeValue::Cmp { .. }, ProbeValue::RemoteAttr { model: m, attr }] => {
                    Ok((cmp, Some((m.clone(), attr.clone()))))
                }
                _ => Err(Error::probe(
                    model,
                    "foreign_key",
                    "expected `(self.rel.col == self.col, Remote::attr)`",
                )),
            },
            _ => Err(Error::probe(
                model,
                "foreign_key",
                "expected comparison pairs",
            )),
        }
    };

    match value {
        ProbeValue::Array(items) => items.iter().map(entry).collect(),
        other => Ok(vec![entry(other)?]),
    }
}

struct BoundComparison {
    /// Field index of the local relation attribute the pair travels
    /// through.
    local_attr: usize,
    target: ModelId,
    pair: ForeignKeyPair,
}

fn bind_comparison(
    models: &[Model],
    model: &Model,
    comparison: &ProbeValue,
) -> Result<BoundComparison> {
    let ProbeValue::Cmp { left, right } = comparison else {
        return Err(Error::probe(model.name.clone(), "foreign_key", "expected a comparison"));
    };

    let (relation_path, local_path) = match (left.len(), right.len()) {
        (2, 1) => (left, right),
        (1, 2) => (right, left),
        _ => {
            return Err(Error::probe(
                model.name.clone(),
                "foreign_key",
                "a comparison must relate `self.<relation>.<column>` to `self.<column>`",
            ))
        }
    };

    let relation_field = model
        .field_by_name(&relation_path[0])
        .filter(|field| field.is_relation())
        .ok_or_else(|| {
            Error::probe(
                model.name.clone(),
                "foreign_key",
                format!("`{}` is not a relation attribute", relation_path[0]),
            )
        })?;
    let target_id = relation_field.expect_relation().target;
    let target = &models[target_id.0];

    let remote_index = target
        .fields
        .iter()
        .position(|field| field.name == relation_path[1] && field.is_column())
        .ok_or_else(|| {
            Error::probe(
                model.name.clone(),
                "foreign_key",
                format!("`{}` is not a column of `{}`", relation_path[1], target.name),
            )
        })?;

    let local_index = model
        .fields
        .iter()
        .position(|field| field.name == local_path[0] && field.is_column())
        .ok_or_else(|| {
            Error::probe(
                model.name.clone(),
                "foreign_key",
                format!("`{}` is not a declared column", local_path[0]),
            )
        })?;

    Ok(BoundComparison {
        local_attr: relation_field.id.index,
        target: target_id,
        pair: ForeignKeyPair {
            source: FieldId {
                model: model.id,
                index: local_index,
            },
            target: FieldId {
                model: target_id,
                index: remote_index,
            },
        },
    })
}

/// Wires every relation attribute to the foreign key serving it.
fn bind_relations(models: &mut [Model]) -> Result<()> {
    enum Binding {
        Local(usize),
        Remote(ModelId, usize),
    }

    let mut bindings: Vec<(usize, usize, Binding)> = Vec::new();

    for (model_index, model) in models.iter().enumerate() {
        for field in &model.fields {
            let Some(relation) = field.as_relation() else {
                continue;
            };

            let local = model
                .foreign_keys
                .iter()
                .position(|fk| fk.local_attr == Some(field.id.index));

            if let Some(fk_index) = local {
                if relation.cardinality == Cardinality::Many {
                    return Err(Error::probe(
                        model.name.clone(),
                        "foreign_key",
                        format!(
                            "relation `{}` is a sequence but owns the foreign key",
                            field.name
                        ),
                    ));
                }
                bindings.push((model_index, field.id.index, Binding::Local(fk_index)));
                continue;
            }

            let target = &models[relation.target.0];
            let remote = target.foreign_keys.iter().position(|fk| {
                fk.target == model.id && fk.remote_attr.as_deref() == Some(field.name.as_str())
            });

            match remote {
                Some(fk_index) => bindings.push((
                    model_index,
                    field.id.index,
                    Binding::Remote(relation.target, fk_index),
                )),
                None => {
                    return Err(Error::unresolved_relation(
                        model.name.clone(),
                        field.name.clone(),
                    ))
                }
            }
        }
    }

    for (model_index, field_index, binding) in bindings {
        if let FieldTy::Relation(relation) = &mut models[model_index].fields[field_index].ty {
            match binding {
                Binding::Local(fk) => relation.local_fk = Some(fk),
                Binding::Remote(target, fk) => relation.remote_fk = Some((target, fk)),
            }
        }
    }

    Ok(())
}
