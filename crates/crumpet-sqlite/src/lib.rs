pub mod catalog;

mod executor;
pub use executor::{ConnectionSource, Executor};

mod row;
pub use row::{QueryOutput, Row};

mod value;

use crumpet_core::{Error, Result};

use std::path::{Path, PathBuf};

use url::Url;

/// A SQLite datasource: a file path or the in-memory marker, parsed from a
/// `sqlite:///...` URL.
#[derive(Debug, Clone)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    pub fn new(url: impl AsRef<str>) -> Result<Sqlite> {
        let url_str = url.as_ref();
        let url = Url::parse(url_str).map_err(Error::driver)?;

        if url.scheme() != "sqlite" {
            return Err(Error::unsupported_provider(url.scheme()));
        }

        let path = url.path();
        if path == ":memory:" || path == "/:memory:" || path.is_empty() {
            Ok(Sqlite::InMemory)
        } else {
            Ok(Sqlite::File(PathBuf::from(path)))
        }
    }

    pub fn in_memory() -> Sqlite {
        Sqlite::InMemory
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Sqlite {
        Sqlite::File(path.as_ref().to_path_buf())
    }

    pub fn connect(&self) -> Result<Connection> {
        match self {
            Sqlite::File(path) => Connection::open(path),
            Sqlite::InMemory => Connection::open_in_memory(),
        }
    }
}

/// A single open connection to the embedded store.
#[derive(Debug)]
pub struct Connection {
    inner: rusqlite::Connection,
}

impl Connection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
        let inner = rusqlite::Connection::open(path).map_err(translate)?;
        Ok(Connection { inner })
    }

    pub fn open_in_memory() -> Result<Connection> {
        let inner = rusqlite::Connection::open_in_memory().map_err(translate)?;
        Ok(Connection { inner })
    }

    /// Opens a connection for a datasource URL.
    pub fn from_url(url: impl AsRef<str>) -> Result<Connection> {
        Sqlite::new(url)?.connect()
    }

    pub fn execute(&self, sql: &str, params: &[crumpet_core::stmt::Value]) -> Result<usize> {
        let mut stmt = self.inner.prepare_cached(sql).map_err(translate)?;
        stmt.execute(rusqlite::params_from_iter(
            params.iter().map(value::SqlValue),
        ))
        .map_err(translate)
    }

    pub fn query(&self, sql: &str, params: &[crumpet_core::stmt::Value]) -> Result<QueryOutput> {
        let mut stmt = self.inner.prepare_cached(sql).map_err(translate)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(
                params.iter().map(value::SqlValue),
            ))
            .map_err(translate)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(translate)? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value = row.get_ref(index).map_err(translate)?;
                values.push(value::from_sql(value)?);
            }
            out.push(values);
        }

        Ok(QueryOutput::new(columns, out))
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.inner.execute_batch(sql).map_err(translate)
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.inner.last_insert_rowid()
    }
}

/// Maps driver failures onto the error categories callers match on.
pub(crate) fn translate(err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            // "UNIQUE constraint failed: user.email"
            let table = message
                .rsplit(": ")
                .next()
                .and_then(|target| target.split('.').next())
                .unwrap_or_default()
                .to_owned();
            return Error::integrity_violation(table, message.clone());
        }
        if let Some(table) = message.strip_prefix("no such table: ") {
            return Error::no_such_table(table.trim());
        }
    }
    Error::driver(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumpet_core::ErrorCategory;

    #[test]
    fn url_forms() {
        assert!(matches!(Sqlite::new("sqlite:///:memory:").unwrap(), Sqlite::InMemory));
        assert!(matches!(
            Sqlite::new("sqlite:///tmp/app.db").unwrap(),
            Sqlite::File(_)
        ));
        let err = Sqlite::new("postgres://localhost/app").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedProvider);
    }

    #[test]
    fn constraint_errors_become_integrity_violations() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, email TEXT); \
             CREATE UNIQUE INDEX uidx_t_email ON t (email); \
             INSERT INTO t (email) VALUES ('a@example.com');",
        )
        .unwrap();

        let err = conn
            .execute(
                "INSERT INTO t (email) VALUES (?)",
                &[crumpet_core::stmt::Value::from("a@example.com")],
            )
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IntegrityViolation);
    }

    #[test]
    fn missing_table_is_categorized() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.query("SELECT * FROM missing", &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NoSuchTable);
    }
}
