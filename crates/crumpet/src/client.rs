//! Construction support for generated `Client` types.

use crate::engine::{Backend, ModelVtable};

use crumpet_core::schema::spec::DataSourceConfig;
use crumpet_core::{Error, Result};
use crumpet_sqlite::ConnectionSource;

use std::collections::HashMap;
use std::sync::Arc;

/// Init parameters of a generated client: one connection (or factory) per
/// datasource key, plus the SQL echo switch.
#[derive(Default)]
pub struct ClientOptions {
    connections: HashMap<String, ConnectionSource>,
    echo_sql: bool,
}

impl ClientOptions {
    pub fn new() -> ClientOptions {
        ClientOptions::default()
    }

    pub fn connection(
        mut self,
        data_source: impl Into<String>,
        source: impl Into<ConnectionSource>,
    ) -> ClientOptions {
        self.connections.insert(data_source.into(), source.into());
        self
    }

    /// When set, every statement is reported to the process-level logging
    /// sink before execution.
    pub fn echo_sql(mut self, echo_sql: bool) -> ClientOptions {
        self.echo_sql = echo_sql;
        self
    }
}

/// The backends of one generated client, keyed by datasource.
pub struct BackendSet {
    backends: Vec<(&'static str, Arc<Backend>)>,
}

impl BackendSet {
    /// Builds one backend per declared datasource, registering the vtables
    /// of the models stored there.
    pub fn build(
        data_sources: &'static [DataSourceConfig],
        vtables: &'static [&'static ModelVtable],
        options: ClientOptions,
    ) -> Result<BackendSet> {
        let ClientOptions {
            mut connections,
            echo_sql,
        } = options;

        let mut backends = Vec::with_capacity(data_sources.len());
        for data_source in data_sources {
            let source = connections.remove(data_source.key).ok_or_else(|| {
                Error::msg(format!(
                    "datasource `{}` is missing a connection",
                    data_source.key
                ))
            })?;

            let registry: Vec<&'static ModelVtable> = vtables
                .iter()
                .filter(|vtable| vtable.spec.data_source == data_source.key)
                .copied()
                .collect();

            backends.push((
                data_source.key,
                Backend::new(*data_source, registry, source, echo_sql),
            ));
        }

        Ok(BackendSet { backends })
    }

    pub fn get(&self, data_source: &str) -> Result<Arc<Backend>> {
        self.backends
            .iter()
            .find(|(key, _)| *key == data_source)
            .map(|(_, backend)| backend.clone())
            .ok_or_else(|| Error::msg(format!("unknown datasource `{data_source}`")))
    }

    /// Closes every held connection.
    pub fn close(&self) {
        for (_, backend) in &self.backends {
            backend.close();
        }
    }
}
