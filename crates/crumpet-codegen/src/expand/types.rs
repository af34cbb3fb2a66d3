//! Emits enum column definitions and the per-model literal unions
//! (include and sortable column enums).

use super::{ident, variant_ident, Expand};

use crumpet_core::schema::app::Schema;

use proc_macro2::TokenStream;
use quote::quote;

/// Enum columns are re-emitted into the client module with their stored
/// scalar mapping; member values, not names, are what the store sees.
pub(super) fn enum_defs(schema: &Schema) -> TokenStream {
    let defs = schema.enums.iter().map(|def| {
        let enum_ident = ident(&def.name);
        let name = &def.name;

        let variants = def.variants.iter().map(|variant| {
            let variant_ident = ident(&variant.name);
            let discriminant = proc_macro2::Literal::i64_unsuffixed(variant.discriminant);
            quote!(#variant_ident = #discriminant,)
        });

        let arms = def.variants.iter().map(|variant| {
            let variant_ident = ident(&variant.name);
            let discriminant = proc_macro2::Literal::i64_unsuffixed(variant.discriminant);
            quote!(#discriminant => Ok(#enum_ident::#variant_ident),)
        });

        quote! {
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub enum #enum_ident {
                #(#variants)*
            }

            impl #enum_ident {
                pub fn to_stored(self) -> i64 {
                    self as i64
                }

                pub fn from_stored(value: i64) -> Result<#enum_ident> {
                    match value {
                        #(#arms)*
                        other => Err(Error::type_conversion(#name, other.to_string())),
                    }
                }
            }

            impl From<#enum_ident> for Value {
                fn from(value: #enum_ident) -> Value {
                    Value::I64(value.to_stored())
                }
            }
        }
    });

    quote!(#(#defs)*)
}

pub(super) fn expand(cx: &Expand<'_>) -> TokenStream {
    let include_col_ident = cx.suffixed("IncludeCol");
    let sortable_col_ident = cx.suffixed("SortableCol");

    let include_targets = cx.include_targets();
    let include_variants = include_targets.iter().map(|target| ident(target));
    let include_arms = include_targets.iter().map(|target| {
        let variant = ident(target);
        quote!(#include_col_ident::#variant => #target,)
    });

    let columns: Vec<&str> = cx.model.columns().map(|field| field.name.as_str()).collect();
    let sortable_variants = columns.iter().map(|column| variant_ident(column));
    let sortable_arms = columns.iter().map(|column| {
        let variant = variant_ident(column);
        quote!(#sortable_col_ident::#variant => #column,)
    });

    let include_as_str = if include_targets.is_empty() {
        // An empty union still compiles; its `as_str` is unreachable.
        quote! {
            pub fn as_str(self) -> &'static str {
                match self {}
            }
        }
    } else {
        quote! {
            pub fn as_str(self) -> &'static str {
                match self {
                    #(#include_arms)*
                }
            }
        }
    };

    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum #include_col_ident {
            #(#include_variants,)*
        }

        impl #include_col_ident {
            #include_as_str
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum #sortable_col_ident {
            #(#sortable_variants,)*
        }

        impl #sortable_col_ident {
            pub fn as_str(self) -> &'static str {
                match self {
                    #(#sortable_arms)*
                }
            }
        }
    }
}
