//! Emits the `{Model}Insert` record and its payload wrapper.
//!
//! The insert record mirrors the model but types the auto-increment
//! primary key as optional: a pre-insert payload must not require it,
//! while every persisted row has one.

use super::{column_ty, ident, Expand};

use crumpet_core::schema::app::{Column, DefaultValue};
use crumpet_core::stmt::Value;

use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn expand(cx: &Expand<'_>) -> TokenStream {
    let insert_ident = cx.suffixed("Insert");
    let payload_ident = cx.suffixed("InsertPayload");
    let serialize = quote::format_ident!("serialize_{}", cx.snake());

    let fields = cx.model.columns().map(|field| {
        let field_ident = ident(&field.name);
        let column = field.expect_column();
        let ty = if column.auto_increment {
            let base = column_ty(cx.schema, column.ty, false);
            quote!(Option<#base>)
        } else {
            column_ty(cx.schema, column.ty, column.nullable)
        };
        quote!(pub #field_ident: #ty,)
    });

    let parameters = cx.model.columns().filter_map(|field| {
        let column = field.expect_column();
        if column.auto_increment || column.default.is_some() {
            return None;
        }
        let field_ident = ident(&field.name);
        let ty = column_ty(cx.schema, column.ty, column.nullable);
        Some(quote!(#field_ident: #ty))
    });

    let initializers = cx.model.columns().map(|field| {
        let field_ident = ident(&field.name);
        let column = field.expect_column();
        if column.auto_increment {
            return quote!(#field_ident: None,);
        }
        match &column.default {
            None => quote!(#field_ident,),
            Some(default) => {
                let value = default_expr(column, default);
                quote!(#field_ident: #value,)
            }
        }
    });

    quote! {
        #[derive(Debug, Clone)]
        pub struct #insert_ident {
            #(#fields)*
        }

        impl #insert_ident {
            /// Builds a payload from the required fields, filling declared
            /// defaults.
            pub fn new(#(#parameters),*) -> #insert_ident {
                #insert_ident {
                    #(#initializers)*
                }
            }
        }

        #[derive(Debug)]
        pub enum #payload_ident {
            Insert(#insert_ident),
            Row(InsertRow),
        }

        impl From<#insert_ident> for #payload_ident {
            fn from(value: #insert_ident) -> #payload_ident {
                #payload_ident::Insert(value)
            }
        }

        impl From<InsertRow> for #payload_ident {
            fn from(value: InsertRow) -> #payload_ident {
                #payload_ident::Row(value)
            }
        }

        impl #payload_ident {
            fn into_row(self) -> InsertRow {
                match self {
                    #payload_ident::Insert(data) => #serialize(&data),
                    #payload_ident::Row(row) => row,
                }
            }
        }
    }
}

fn default_expr(column: &Column, default: &DefaultValue) -> TokenStream {
    let literal = match default {
        DefaultValue::Now => quote!(Utc::now()),
        DefaultValue::Literal(value) => match value {
            Value::I64(v) => {
                let lit = proc_macro2::Literal::i64_suffixed(*v);
                quote!(#lit)
            }
            Value::F64(v) => {
                let lit = proc_macro2::Literal::f64_suffixed(*v);
                quote!(#lit)
            }
            Value::Bool(v) => quote!(#v),
            Value::String(v) => quote!(#v.to_owned()),
            _ => quote!(Default::default()),
        },
    };

    if column.nullable {
        quote!(Some(#literal))
    } else {
        literal
    }
}
