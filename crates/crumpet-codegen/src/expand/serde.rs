//! Emits the static serializer and deserializer for one model.
//!
//! These are top-level functions so a row costs one struct construction —
//! no reflection on the hot path. Enum values are unwrapped to and from
//! their stored scalar here.

use super::{ident, read_expr, record, relation_kind, value_expr, Expand, RelationKind};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn expand(cx: &Expand<'_>) -> TokenStream {
    let record_ident = cx.ident();
    let insert_ident = cx.suffixed("Insert");
    let serialize = format_ident!("serialize_{}", cx.snake());
    let deserialize = format_ident!("deserialize_{}", cx.snake());
    let model_name = &cx.model.name;

    let writes = cx.model.columns().map(|field| {
        let field_ident = ident(&field.name);
        let column_name = &field.name;
        let column = field.expect_column();

        if column.auto_increment {
            // Absent auto-increment keys are generated by the store.
            return quote! {
                if let Some(value) = data.#field_ident {
                    row.push(#column_name, Value::from(value));
                }
            };
        }

        let value = value_expr(
            cx.schema,
            quote!(data),
            &field_ident,
            column.ty,
            column.nullable,
        );
        quote!(row.push(#column_name, #value);)
    });

    let reads = cx.model.fields.iter().map(|field| {
        let field_ident = ident(&field.name);
        match &field.ty {
            crumpet_core::schema::app::FieldTy::Column(column) => {
                let expr = read_expr(cx.schema, model_name, &field.name, column.ty, column.nullable);
                quote!(#field_ident: #expr,)
            }
            crumpet_core::schema::app::FieldTy::Relation(relation) => {
                let target = ident(&cx.schema.model(relation.target).name);
                let handle = match relation_kind(relation) {
                    RelationKind::Many => quote!(HasMany::<#target>::unlinked()),
                    RelationKind::BelongsTo => quote!(BelongsTo::<#target>::unlinked()),
                    RelationKind::HasOne => quote!(HasOne::<#target>::unlinked()),
                };
                quote!(#field_ident: #handle,)
            }
        }
    });

    let vtable_fns = record::expand_vtable_fns(cx);

    quote! {
        pub fn #serialize(data: &#insert_ident) -> InsertRow {
            let mut row = InsertRow::new();
            #(#writes)*
            row
        }

        pub fn #deserialize(row: &Row) -> Result<#record_ident> {
            Ok(#record_ident {
                #(#reads)*
            })
        }

        #vtable_fns
    }
}
