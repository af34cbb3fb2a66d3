//! Emits the record struct, its relation accessors, and the table handle.

use super::{
    column_ty, ident, join_pairs, relation_kind, value_expr, Expand, RelationKind,
};

use crumpet_core::schema::app::FieldTy;
use crumpet_core::schema::Cardinality;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn expand(cx: &Expand<'_>) -> TokenStream {
    let record_ident = cx.ident();

    let fields = cx.model.fields.iter().map(|field| {
        let field_ident = ident(&field.name);
        match &field.ty {
            FieldTy::Column(column) => {
                let ty = column_ty(cx.schema, column.ty, column.nullable);
                quote!(pub #field_ident: #ty,)
            }
            FieldTy::Relation(relation) => {
                let target = ident(&cx.schema.model(relation.target).name);
                let handle = match relation_kind(relation) {
                    RelationKind::Many => quote!(HasMany<#target>),
                    RelationKind::BelongsTo => quote!(BelongsTo<#target>),
                    RelationKind::HasOne => quote!(HasOne<#target>),
                };
                quote!(#field_ident: #handle,)
            }
        }
    });

    let accessors = cx.relations().into_iter().map(|(field, relation)| {
        let field_ident = ident(&field.name);
        let target = ident(&cx.schema.model(relation.target).name);
        let what = format!("{}.{}", cx.model.name, field.name);

        match (relation_kind(relation), relation.cardinality) {
            (RelationKind::Many, _) => quote! {
                pub fn #field_ident(&self) -> Result<Vec<Arc<#target>>> {
                    self.#field_ident.load(#what)
                }
            },
            (_, Cardinality::One) => quote! {
                pub fn #field_ident(&self) -> Result<Arc<#target>> {
                    self.#field_ident.load_required(#what)
                }
            },
            _ => quote! {
                pub fn #field_ident(&self) -> Result<Option<Arc<#target>>> {
                    self.#field_ident.load_optional(#what)
                }
            },
        }
    });

    quote! {
        #[derive(Debug)]
        pub struct #record_ident {
            #(#fields)*
        }

        impl #record_ident {
            #(#accessors)*
        }
    }
}

pub(super) fn expand_table(cx: &Expand<'_>) -> TokenStream {
    let record_ident = cx.ident();
    let table_ident = cx.suffixed("Table");
    let query_ident = cx.suffixed("Query");
    let payload_ident = cx.suffixed("InsertPayload");
    let sortable_ident = cx.suffixed("SortableCol");
    let where_ident = cx.suffixed("Where");
    let include_ident = cx.suffixed("Include");

    let columns = cx.model.columns().map(|field| &field.name);
    let primary_key = cx.model.primary_key_columns();
    let primary_key = primary_key.iter();

    quote! {
        #[derive(Debug, Default)]
        pub struct #query_ident {
            pub r#where: Option<#where_ident>,
            pub include: #include_ident,
            pub order_by: Vec<(#sortable_ident, Direction)>,
            pub take: Option<u64>,
            pub skip: Option<u64>,
        }

        impl #query_ident {
            fn into_args(self) -> QueryArgs {
                QueryArgs {
                    filter: self.r#where.map(IntoFilter::into_filter),
                    include: self.include.names(),
                    order_by: self
                        .order_by
                        .into_iter()
                        .map(|(column, direction)| OrderBy {
                            column: column.as_str().to_owned(),
                            direction,
                        })
                        .collect(),
                    take: self.take,
                    skip: self.skip,
                }
            }
        }

        pub struct #table_ident {
            backend: Arc<Backend>,
        }

        impl #table_ident {
            pub const COLUMNS: &'static [&'static str] = &[#(#columns),*];
            pub const PRIMARY_KEY: &'static [&'static str] = &[#(#primary_key),*];

            pub fn new(backend: Arc<Backend>) -> #table_ident {
                #table_ident { backend }
            }

            pub fn insert(&self, data: impl Into<#payload_ident>) -> Result<Arc<#record_ident>> {
                self.backend.insert::<#record_ident>(data.into().into_row())
            }

            pub fn insert_many<P: Into<#payload_ident>>(
                &self,
                data: Vec<P>,
            ) -> Result<Vec<Arc<#record_ident>>> {
                let rows = data.into_iter().map(|item| item.into().into_row()).collect();
                self.backend.insert_many::<#record_ident>(rows, None)
            }

            pub fn insert_many_batched<P: Into<#payload_ident>>(
                &self,
                data: Vec<P>,
                batch_size: usize,
            ) -> Result<Vec<Arc<#record_ident>>> {
                let rows = data.into_iter().map(|item| item.into().into_row()).collect();
                self.backend.insert_many::<#record_ident>(rows, Some(batch_size))
            }

            pub fn find_many(&self, query: #query_ident) -> Result<Vec<Arc<#record_ident>>> {
                self.backend.find_many::<#record_ident>(query.into_args())
            }

            pub fn find_first(&self, query: #query_ident) -> Result<Option<Arc<#record_ident>>> {
                self.backend.find_first::<#record_ident>(query.into_args())
            }
        }
    }
}

/// Emits the erased deserializer and the relation wiring entry point the
/// vtable points at.
pub(super) fn expand_vtable_fns(cx: &Expand<'_>) -> TokenStream {
    let record_ident = cx.ident();
    let deserialize = format_ident!("deserialize_{}", cx.snake());
    let deserialize_erased = format_ident!("deserialize_{}_erased", cx.snake());
    let attach = format_ident!("attach_{}", cx.snake());
    let mismatch = format!("attach received a record that is not `{}`", cx.model.name);

    let wires = cx.relations().into_iter().map(|(field, relation)| {
        let field_ident = ident(&field.name);
        let name = &field.name;

        let own_values = join_pairs(cx.schema, cx.model, relation)
            .into_iter()
            .map(|(own, _)| {
                let own_field = cx
                    .model
                    .field_by_name(own)
                    .expect("join column is a declared field");
                let own_ident = ident(own);
                let column = own_field.expect_column();
                value_expr(
                    cx.schema,
                    quote!(record),
                    &own_ident,
                    column.ty,
                    column.nullable,
                )
            });

        quote! {
            record
                .#field_ident
                .attach(cx.relation(#name, vec![#(#own_values),*])?)?;
        }
    });

    quote! {
        fn #deserialize_erased(row: &Row) -> Result<ErasedRecord> {
            let record: ErasedRecord = Arc::new(#deserialize(row)?);
            Ok(record)
        }

        fn #attach(record: &ErasedRecord, cx: &AttachCx<'_>) -> Result<()> {
            let record = record
                .downcast_ref::<#record_ident>()
                .ok_or_else(|| Error::msg(#mismatch))?;
            #(#wires)*
            Ok(())
        }
    }
}
