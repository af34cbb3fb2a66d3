//! Renders the client module from the inspected schema.
//!
//! Models are emitted in name order and every construct is derived
//! deterministically from the schema graph, so identical inspection output
//! yields byte-identical module text.

mod client;
mod filters;
mod insert;
mod record;
mod serde;
mod spec;
mod types;

use crumpet_core::schema::app::{Field, Model, Relation, Schema};
use crumpet_core::schema::Cardinality;
use crumpet_core::stmt::Type;

use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(crate) fn module(schema: &Schema) -> TokenStream {
    let mut models: Vec<&Model> = schema.models.iter().collect();
    models.sort_by(|a, b| a.name.cmp(&b.name));

    let enums = types::enum_defs(schema);
    let bodies: Vec<TokenStream> = models
        .iter()
        .map(|model| Expand { schema, model: *model }.expand())
        .collect();
    let client = client::expand(schema, &models);

    quote! {
        use crumpet::codegen_support::*;

        #enums
        #(#bodies)*
        #client
    }
}

/// Emission context for one model.
struct Expand<'a> {
    schema: &'a Schema,
    model: &'a Model,
}

impl Expand<'_> {
    fn expand(&self) -> TokenStream {
        let spec = spec::expand(self);
        let record = record::expand(self);
        let types = types::expand(self);
        let insert = insert::expand(self);
        let filters = filters::expand(self);
        let serde = serde::expand(self);
        let table = record::expand_table(self);

        quote! {
            #spec
            #record
            #types
            #insert
            #filters
            #serde
            #table
        }
    }

    fn ident(&self) -> syn::Ident {
        ident(&self.model.name)
    }

    fn suffixed(&self, suffix: &str) -> syn::Ident {
        format_ident!("{}{}", self.model.name, suffix)
    }

    fn shouty(&self, suffix: &str) -> syn::Ident {
        format_ident!("{}_{}", self.model.name.to_shouty_snake_case(), suffix)
    }

    fn snake(&self) -> String {
        self.model.name.to_snake_case()
    }

    /// Relation attributes in emission order: own-table first, then
    /// declaration order.
    fn relations(&self) -> Vec<(&Field, &Relation)> {
        self.model.relations_ordered()
    }

    /// Distinct related type names, sorted, driving the include surface.
    fn include_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .relations()
            .iter()
            .map(|(_, relation)| self.schema.model(relation.target).name.clone())
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }
}

pub(crate) fn ident(name: &str) -> syn::Ident {
    format_ident!("{}", name)
}

pub(crate) fn variant_ident(column: &str) -> syn::Ident {
    format_ident!("{}", column.to_upper_camel_case())
}

/// The Rust type of a column, before `Option` wrapping.
fn base_ty(schema: &Schema, ty: Type) -> TokenStream {
    match ty {
        Type::Bool => quote!(bool),
        Type::I64 => quote!(i64),
        Type::F64 => quote!(f64),
        Type::String => quote!(String),
        Type::Bytes => quote!(Vec<u8>),
        Type::DateTime => quote!(DateTime<Utc>),
        Type::Date => quote!(NaiveDate),
        Type::Time => quote!(NaiveTime),
        Type::Enum(id) => {
            let name = ident(&schema.enum_def(id).name);
            quote!(#name)
        }
    }
}

fn column_ty(schema: &Schema, ty: Type, nullable: bool) -> TokenStream {
    let base = base_ty(schema, ty);
    if nullable {
        quote!(Option<#base>)
    } else {
        quote!(#base)
    }
}

/// Whether field access can move the value without a clone.
fn is_copy(ty: Type) -> bool {
    !matches!(ty, Type::String | Type::Bytes)
}

/// An expression converting `#owner.#field` into a [`Value`].
fn value_expr(
    schema: &Schema,
    owner: TokenStream,
    field: &syn::Ident,
    ty: Type,
    nullable: bool,
) -> TokenStream {
    match ty {
        Type::Enum(id) => {
            let enum_ident = ident(&schema.enum_def(id).name);
            if nullable {
                quote!(Value::from(#owner.#field.map(#enum_ident::to_stored)))
            } else {
                quote!(Value::I64(#owner.#field.to_stored()))
            }
        }
        _ if is_copy(ty) => quote!(Value::from(#owner.#field)),
        _ => quote!(Value::from(#owner.#field.clone())),
    }
}

/// An expression reading one column of `row` back into its field type.
fn read_expr(
    schema: &Schema,
    model: &str,
    column: &str,
    ty: Type,
    nullable: bool,
) -> TokenStream {
    let fetch = quote!(row.require(#model, #column)?);
    let convert = |method: syn::Ident| {
        if nullable {
            let method = format_ident!("{}_opt", method);
            quote!(#fetch.#method()?)
        } else {
            quote!(#fetch.#method()?)
        }
    };

    match ty {
        Type::Bool => convert(format_ident!("to_bool")),
        Type::I64 => convert(format_ident!("to_i64")),
        Type::F64 => convert(format_ident!("to_f64")),
        Type::String => convert(format_ident!("to_text")),
        Type::Bytes => convert(format_ident!("to_bytes")),
        Type::DateTime => convert(format_ident!("to_datetime")),
        Type::Date => convert(format_ident!("to_date")),
        Type::Time => convert(format_ident!("to_time")),
        Type::Enum(id) => {
            let enum_ident = ident(&schema.enum_def(id).name);
            if nullable {
                quote! {
                    match #fetch.to_i64_opt()? {
                        Some(raw) => Some(#enum_ident::from_stored(raw)?),
                        None => None,
                    }
                }
            } else {
                quote!(#enum_ident::from_stored(#fetch.to_i64()?)?)
            }
        }
    }
}

/// `(own column, remote column)` join pairs of a relation, read off the
/// foreign key that serves it.
fn join_pairs<'a>(
    schema: &'a Schema,
    model: &'a Model,
    relation: &Relation,
) -> Vec<(&'a str, &'a str)> {
    match (relation.local_fk, relation.remote_fk) {
        (Some(fk), _) => model.foreign_keys[fk]
            .pairs
            .iter()
            .map(|pair| {
                (
                    schema.field(pair.source).name.as_str(),
                    schema.field(pair.target).name.as_str(),
                )
            })
            .collect(),
        (None, Some((target, fk))) => schema.model(target).foreign_keys[fk]
            .pairs
            .iter()
            .map(|pair| {
                (
                    schema.field(pair.target).name.as_str(),
                    schema.field(pair.source).name.as_str(),
                )
            })
            .collect(),
        (None, None) => Vec::new(),
    }
}

/// The relation handle type and accessor shape for a relation field.
fn relation_kind(relation: &Relation) -> RelationKind {
    match relation.cardinality {
        Cardinality::Many => RelationKind::Many,
        _ if relation.local_fk.is_some() => RelationKind::BelongsTo,
        _ => RelationKind::HasOne,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RelationKind {
    Many,
    BelongsTo,
    HasOne,
}
