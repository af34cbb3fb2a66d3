//! Emits the partial filter struct and the include struct for one model.

use super::{base_ty, ident, Expand};

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn expand(cx: &Expand<'_>) -> TokenStream {
    let where_struct = expand_where(cx);
    let include_struct = expand_include(cx);

    quote! {
        #where_struct
        #include_struct
    }
}

/// Every key of the filter struct is optional; sibling keys conjoin
/// implicitly, `or` requires the explicit field.
fn expand_where(cx: &Expand<'_>) -> TokenStream {
    let where_ident = cx.suffixed("Where");

    let column_fields = cx.model.columns().map(|field| {
        let field_ident = ident(&field.name);
        let ty = base_ty(cx.schema, field.expect_column().ty);
        quote!(pub #field_ident: Option<ScalarFilter<#ty>>,)
    });

    let relation_fields = cx.relations().into_iter().map(|(field, relation)| {
        let field_ident = ident(&field.name);
        let target_where = ident(&format!(
            "{}Where",
            cx.schema.model(relation.target).name
        ));
        quote!(pub #field_ident: Option<RelationFilter<#target_where>>,)
    });

    let column_lowerings = cx.model.columns().map(|field| {
        let field_ident = ident(&field.name);
        let column = &field.name;
        quote! {
            if let Some(filter) = self.#field_ident {
                operands.push(filter.into_filter(#column));
            }
        }
    });

    let relation_lowerings = cx.relations().into_iter().map(|(field, _)| {
        let field_ident = ident(&field.name);
        let attr = &field.name;
        quote! {
            if let Some(filter) = self.#field_ident {
                operands.push(filter.into_filter(#attr));
            }
        }
    });

    quote! {
        #[derive(Debug, Clone, Default)]
        pub struct #where_ident {
            #(#column_fields)*
            pub and: Option<Vec<#where_ident>>,
            pub or: Option<Vec<#where_ident>>,
            pub not: Option<Box<#where_ident>>,
            #(#relation_fields)*
        }

        impl IntoFilter for #where_ident {
            fn into_filter(self) -> Filter {
                let mut operands = Vec::new();
                #(#column_lowerings)*
                if let Some(filters) = self.and {
                    operands.push(Filter::And(
                        filters.into_iter().map(IntoFilter::into_filter).collect(),
                    ));
                }
                if let Some(filters) = self.or {
                    operands.push(Filter::Or(
                        filters.into_iter().map(IntoFilter::into_filter).collect(),
                    ));
                }
                if let Some(filter) = self.not {
                    operands.push(Filter::Not(Box::new(filter.into_filter())));
                }
                #(#relation_lowerings)*
                Filter::and_from_vec(operands)
            }
        }
    }
}

/// One boolean per related type name; truthy fields are prefetched.
fn expand_include(cx: &Expand<'_>) -> TokenStream {
    let include_ident = cx.suffixed("Include");
    let targets = cx.include_targets();

    let fields = targets.iter().map(|target| {
        let field_ident = ident(&target.to_snake_case());
        quote!(pub #field_ident: bool,)
    });

    let pushes = targets.iter().map(|target| {
        let field_ident = ident(&target.to_snake_case());
        quote! {
            if self.#field_ident {
                names.push(#target);
            }
        }
    });

    quote! {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct #include_ident {
            #(#fields)*
        }

        impl #include_ident {
            fn names(self) -> Vec<&'static str> {
                let mut names = Vec::new();
                #(#pushes)*
                names
            }
        }
    }
}
