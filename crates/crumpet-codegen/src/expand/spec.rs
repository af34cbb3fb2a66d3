//! Emits the `TableSpec` and `ModelVtable` statics for one model.

use super::{join_pairs, Expand};

use crumpet_core::schema::Cardinality;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn expand(cx: &Expand<'_>) -> TokenStream {
    let model = cx.model;
    let spec_ident = cx.shouty("SPEC");
    let vtable_ident = cx.shouty("VTABLE");
    let deserialize = format_ident!("deserialize_{}_erased", cx.snake());
    let attach = format_ident!("attach_{}", cx.snake());

    let model_name = &model.name;
    let table_name = &model.table_name;
    let data_source = &cx.schema.data_source(model.data_source).key;

    let columns = model.columns().map(|field| {
        let name = &field.name;
        let nullable = field.expect_column().nullable;
        quote!(ColumnSpec { name: #name, nullable: #nullable })
    });

    let primary_key = model.primary_key_columns();
    let auto_increment = match model.primary_key.auto_increment {
        true => {
            let name = primary_key[0];
            quote!(Some(#name))
        }
        false => quote!(None),
    };
    let primary_key = primary_key.iter();

    let indexes = model.indexes.iter().map(|index| {
        let columns = index.fields.iter().map(|i| &model.fields[*i].name);
        let unique = index.unique;
        quote!(IndexSpec { columns: &[#(#columns),*], unique: #unique })
    });

    let foreign_keys = model.foreign_keys.iter().map(|fk| {
        let columns = fk.source_columns(cx.schema);
        let target_columns = fk.target_columns(cx.schema);
        let target_model = &cx.schema.model(fk.target).name;
        let local_attr = option_str(fk.local_attr.map(|index| model.fields[index].name.as_str()));
        let remote_attr = option_str(fk.remote_attr.as_deref());
        quote! {
            ForeignKeySpec {
                columns: &[#(#columns),*],
                target_model: #target_model,
                target_columns: &[#(#target_columns),*],
                local_attr: #local_attr,
                remote_attr: #remote_attr,
            }
        }
    });

    let relations = cx.relations().into_iter().map(|(field, relation)| {
        let name = &field.name;
        let target = &cx.schema.model(relation.target).name;
        let cardinality = match relation.cardinality {
            Cardinality::One => quote!(Cardinality::One),
            Cardinality::OptionalOne => quote!(Cardinality::OptionalOne),
            Cardinality::Many => quote!(Cardinality::Many),
        };
        let join = join_pairs(cx.schema, model, relation)
            .into_iter()
            .map(|(own, remote)| quote!((#own, #remote)));
        quote! {
            RelationSpec {
                name: #name,
                target: #target,
                cardinality: #cardinality,
                join: &[#(#join),*],
            }
        }
    });

    let record_ident = cx.ident();

    quote! {
        pub static #spec_ident: TableSpec = TableSpec {
            model: #model_name,
            table: #table_name,
            data_source: #data_source,
            columns: &[#(#columns),*],
            primary_key: &[#(#primary_key),*],
            auto_increment: #auto_increment,
            indexes: &[#(#indexes),*],
            foreign_keys: &[#(#foreign_keys),*],
            relations: &[#(#relations),*],
        };

        pub static #vtable_ident: ModelVtable = ModelVtable {
            spec: &#spec_ident,
            deserialize: #deserialize,
            attach: #attach,
        };

        impl Record for #record_ident {
            const VTABLE: &'static ModelVtable = &#vtable_ident;
        }
    }
}

fn option_str(value: Option<&str>) -> TokenStream {
    match value {
        Some(value) => quote!(Some(#value)),
        None => quote!(None),
    }
}
