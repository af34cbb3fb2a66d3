use crate::{Connection, QueryOutput};

use crumpet_core::stmt::Value;
use crumpet_core::{Error, Result};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

/// What a backend was constructed from: one connection owned outright, or a
/// factory that opens connections on demand.
pub enum ConnectionSource {
    Connection(Connection),
    Factory(Box<dyn Fn() -> Result<Connection> + Send + Sync>),
}

impl ConnectionSource {
    /// A single connection opened from a datasource URL.
    pub fn from_url(url: impl AsRef<str>) -> Result<ConnectionSource> {
        Ok(ConnectionSource::Connection(Connection::from_url(url)?))
    }

    /// A factory opening one connection per thread from a datasource URL.
    pub fn factory_from_url(url: impl Into<String>) -> ConnectionSource {
        let url = url.into();
        ConnectionSource::Factory(Box::new(move || Connection::from_url(&url)))
    }
}

impl From<Connection> for ConnectionSource {
    fn from(value: Connection) -> ConnectionSource {
        ConnectionSource::Connection(value)
    }
}

/// Executes statements against a connection source.
///
/// A single connection stays pinned to the thread that created the
/// executor; touching it from another thread is a usage error. A factory
/// keeps at most one connection per thread.
pub struct Executor {
    source: Source,
    echo_sql: bool,
}

enum Source {
    Single {
        owner: ThreadId,
        connection: Mutex<Option<Connection>>,
    },
    Factory {
        factory: Box<dyn Fn() -> Result<Connection> + Send + Sync>,
        connections: Mutex<HashMap<ThreadId, Connection>>,
        closed: AtomicBool,
    },
}

impl Executor {
    pub fn new(source: ConnectionSource, echo_sql: bool) -> Executor {
        let source = match source {
            ConnectionSource::Connection(connection) => Source::Single {
                owner: thread::current().id(),
                connection: Mutex::new(Some(connection)),
            },
            ConnectionSource::Factory(factory) => Source::Factory {
                factory,
                connections: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            },
        };
        Executor { source, echo_sql }
    }

    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<usize> {
        self.echo(sql, params);
        self.with_connection(|connection| connection.execute(sql, params))
    }

    /// Executes an insert and reads the generated rowid on the same
    /// connection.
    pub fn execute_returning_rowid(&self, sql: &str, params: &[Value]) -> Result<(usize, i64)> {
        self.echo(sql, params);
        self.with_connection(|connection| {
            let count = connection.execute(sql, params)?;
            Ok((count, connection.last_insert_rowid()))
        })
    }

    pub fn query(&self, sql: &str, params: &[Value]) -> Result<QueryOutput> {
        self.echo(sql, params);
        self.with_connection(|connection| connection.query(sql, params))
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.echo(sql, &[]);
        self.with_connection(|connection| connection.execute_batch(sql))
    }

    /// Closes every held connection. Later operations fail with
    /// `ConnectionClosed`.
    pub fn close(&self) {
        match &self.source {
            Source::Single { connection, .. } => {
                connection.lock().unwrap().take();
            }
            Source::Factory {
                connections,
                closed,
                ..
            } => {
                closed.store(true, Ordering::SeqCst);
                connections.lock().unwrap().clear();
            }
        }
    }

    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match &self.source {
            Source::Single { owner, connection } => {
                if thread::current().id() != *owner {
                    return Err(Error::connection_usage(
                        "a single-connection backend was used from a thread other than its owner; construct the client with a connection factory to share it",
                    ));
                }
                let guard = connection.lock().unwrap();
                let connection = guard.as_ref().ok_or_else(Error::connection_closed)?;
                f(connection)
            }
            Source::Factory {
                factory,
                connections,
                closed,
            } => {
                if closed.load(Ordering::SeqCst) {
                    return Err(Error::connection_closed());
                }
                let mut guard = connections.lock().unwrap();
                let id = thread::current().id();
                if !guard.contains_key(&id) {
                    let connection = factory()?;
                    guard.insert(id, connection);
                }
                f(&guard[&id])
            }
        }
    }

    fn echo(&self, sql: &str, params: &[Value]) {
        if self.echo_sql {
            tracing::debug!(target: "crumpet::sql", sql = %sql, params = ?params, "executing statement");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumpet_core::ErrorCategory;

    #[test]
    fn closed_single_connection_errors() {
        let executor = Executor::new(
            ConnectionSource::Connection(Connection::open_in_memory().unwrap()),
            false,
        );
        executor.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        executor.close();
        let err = executor.query("SELECT * FROM t", &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ConnectionClosed);
    }

    #[test]
    fn single_connection_rejects_foreign_threads() {
        let executor = std::sync::Arc::new(Executor::new(
            ConnectionSource::Connection(Connection::open_in_memory().unwrap()),
            false,
        ));
        let shared = executor.clone();
        let err = std::thread::spawn(move || shared.query("SELECT 1", &[]).unwrap_err())
            .join()
            .unwrap();
        assert_eq!(err.category(), ErrorCategory::ConnectionUsage);
    }

    #[test]
    fn factory_opens_one_connection_per_thread() {
        let executor = std::sync::Arc::new(Executor::new(
            ConnectionSource::factory_from_url("sqlite:///:memory:"),
            false,
        ));
        executor.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();

        // A second thread gets its own (fresh, empty) in-memory database
        // rather than an error.
        let shared = executor.clone();
        std::thread::spawn(move || shared.execute_batch("CREATE TABLE t (id INTEGER)").unwrap())
            .join()
            .unwrap();
    }
}
