//! Database collaborator used by the sink.
//!
//! The sink only needs three primitives: run a statement without a result,
//! read the column names of a query that returns no rows, and execute a
//! statement with named parameters. [`SqlClient`] captures exactly those so
//! that connection handling stays with the caller.

use std::path::Path;

use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{ToSql, Value};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::errors::DbError;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Named parameter (`:name`) and the value bound to it.
pub type NamedValue = (String, Value);

pub trait SqlClient {
    /// Run one or more statements, discarding any result.
    fn execute(&self, sql: &str) -> Result<(), DbError>;

    /// Column names reported for `sql`, in result order. Callers pass a
    /// query that yields no rows.
    fn column_names(&self, sql: &str) -> Result<Vec<String>, DbError>;

    /// Execute `sql` with `params` bound by name; returns affected rows.
    fn execute_named(&self, sql: &str, params: &[NamedValue]) -> Result<usize, DbError>;
}

impl SqlClient for Connection {
    fn execute(&self, sql: &str) -> Result<(), DbError> {
        self.execute_batch(sql)?;
        Ok(())
    }

    fn column_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        let stmt = self.prepare(sql)?;
        Ok(stmt.column_names().into_iter().map(String::from).collect())
    }

    fn execute_named(&self, sql: &str, params: &[NamedValue]) -> Result<usize, DbError> {
        let mut stmt = self.prepare_cached(sql)?;
        let bound: Vec<(&str, &dyn ToSql)> = params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect();
        Ok(stmt.execute(bound.as_slice())?)
    }
}

impl SqlClient for PooledConnection<SqliteConnectionManager> {
    fn execute(&self, sql: &str) -> Result<(), DbError> {
        SqlClient::execute(&**self, sql)
    }

    fn column_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        SqlClient::column_names(&**self, sql)
    }

    fn execute_named(&self, sql: &str, params: &[NamedValue]) -> Result<usize, DbError> {
        SqlClient::execute_named(&**self, sql, params)
    }
}

/// Checks out a connection per call.
impl SqlClient for DbPool {
    fn execute(&self, sql: &str) -> Result<(), DbError> {
        SqlClient::execute(&self.get()?, sql)
    }

    fn column_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        self.get()?.column_names(sql)
    }

    fn execute_named(&self, sql: &str, params: &[NamedValue]) -> Result<usize, DbError> {
        self.get()?.execute_named(sql, params)
    }
}

impl<T: SqlClient + ?Sized> SqlClient for &T {
    fn execute(&self, sql: &str) -> Result<(), DbError> {
        SqlClient::execute(*self, sql)
    }

    fn column_names(&self, sql: &str) -> Result<Vec<String>, DbError> {
        (**self).column_names(sql)
    }

    fn execute_named(&self, sql: &str, params: &[NamedValue]) -> Result<usize, DbError> {
        (**self).execute_named(sql, params)
    }
}

/// SQL flavour used when generating DDL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Mysql,
}

impl Dialect {
    /// Quote an identifier that already passed
    /// [`crate::columns::validate_identifier`].
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::Sqlite => format!("\"{ident}\""),
            Self::Mysql => format!("`{ident}`"),
        }
    }
}

/// Open (creating if needed) a SQLite file and wrap it in a pool.
pub fn init_pool(db_path: &Path, size: u32) -> Result<DbPool> {
    if let Some(dir) = db_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }
    let mgr = SqliteConnectionManager::file(db_path);
    let pool = Pool::builder()
        .max_size(size)
        .build(mgr)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_come_from_an_empty_query() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT, b INTEGER, c TEXT);")
            .unwrap();
        let names = conn.column_names("SELECT * FROM t LIMIT 0").unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn named_parameters_bind_by_name() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT, b INTEGER);").unwrap();
        let params = vec![
            (":b".to_string(), Value::Integer(7)),
            (":a".to_string(), Value::Text("x".into())),
        ];
        let n = SqlClient::execute_named(&conn, "INSERT INTO t (a, b) VALUES (:a, :b)", &params)
            .unwrap();
        assert_eq!(n, 1);
        let (a, b): (String, i64) = conn
            .query_row("SELECT a, b FROM t", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert_eq!((a.as_str(), b), ("x", 7));
    }

    #[test]
    fn pool_backed_client_checks_out_connections() {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .unwrap();
        SqlClient::execute(&pool, "CREATE TABLE t (a TEXT);").unwrap();
        assert_eq!(pool.column_names("SELECT * FROM t LIMIT 0").unwrap(), vec!["a"]);
    }

    #[test]
    fn quoting_depends_on_dialect() {
        assert_eq!(Dialect::Sqlite.quote("logs"), "\"logs\"");
        assert_eq!(Dialect::Mysql.quote("logs"), "`logs`");
    }
}
