//! Emits the datasource statics, the vtable registry, and the aggregate
//! `Client`.

use super::{ident, Expand};

use crumpet_core::schema::app::{Model, Schema};

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub(super) fn expand(schema: &Schema, models: &[&Model]) -> TokenStream {
    let mut data_sources = schema.data_sources.clone();
    data_sources.sort_by(|a, b| a.key.cmp(&b.key));

    let data_source_entries = data_sources.iter().map(|ds| {
        let key = &ds.key;
        let provider = &ds.provider;
        let url = &ds.url;
        quote!(DataSourceConfig { key: #key, provider: #provider, url: #url },)
    });

    let vtable_entries = models.iter().map(|model| {
        let vtable = Expand { schema, model: *model }.shouty("VTABLE");
        quote!(&#vtable,)
    });

    let table_fields = models.iter().map(|model| {
        let field_ident = ident(&model.name.to_snake_case());
        let table_ident = format_ident!("{}Table", model.name);
        quote!(pub #field_ident: #table_ident,)
    });

    let table_inits = models.iter().map(|model| {
        let field_ident = ident(&model.name.to_snake_case());
        let table_ident = format_ident!("{}Table", model.name);
        let key = &schema.data_source(model.data_source).key;
        quote!(#field_ident: #table_ident::new(backends.get(#key)?),)
    });

    quote! {
        pub static DATA_SOURCES: &[DataSourceConfig] = &[
            #(#data_source_entries)*
        ];

        pub static MODEL_VTABLES: &[&ModelVtable] = &[
            #(#vtable_entries)*
        ];

        pub struct Client {
            #(#table_fields)*
            backends: BackendSet,
        }

        impl Client {
            pub fn new(options: ClientOptions) -> Result<Client> {
                let backends = BackendSet::build(DATA_SOURCES, MODEL_VTABLES, options)?;
                Ok(Client {
                    #(#table_inits)*
                    backends,
                })
            }

            pub fn query_raw(
                &self,
                data_source: &str,
                sql: &str,
                params: &[Value],
            ) -> Result<Vec<Row>> {
                self.backends.get(data_source)?.query_raw(sql, params)
            }

            pub fn execute_raw(
                &self,
                data_source: &str,
                sql: &str,
                params: &[Value],
            ) -> Result<usize> {
                self.backends.get(data_source)?.execute_raw(sql, params)
            }

            /// Closes every held connection.
            pub fn close(&self) {
                self.backends.close();
            }
        }
    }
}
