//! INSERT statements built from a projection's column list.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::columns::ID;
use crate::db::{Dialect, NamedValue};
use crate::projector::Projection;

/// An INSERT bound to one ordered list of columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedInsert {
    columns: Vec<String>,
    sql: String,
}

impl PreparedInsert {
    pub fn new(dialect: Dialect, table: &str, columns: &[&str]) -> Self {
        let columns: Vec<String> = columns
            .iter()
            .filter(|c| **c != ID)
            .map(|c| c.to_string())
            .collect();
        let names = columns
            .iter()
            .map(|c| dialect.quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = columns
            .iter()
            .map(|c| format!(":{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            dialect.quote(table)
        );
        Self { columns, sql }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn matches(&self, projection: &Projection) -> bool {
        self.columns.len() == projection.len()
            && self.columns.iter().zip(projection.columns()).all(|(a, b)| a == b)
    }

    /// Named parameters for `projection`, in statement column order.
    pub fn bind(&self, projection: &Projection) -> Vec<NamedValue> {
        projection
            .values()
            .iter()
            .filter(|(column, _)| column != ID)
            .map(|(column, value)| (format!(":{column}"), to_sql_value(value)))
            .collect()
    }
}

/// Scalars map onto native SQL types; arrays and objects are stored as JSON
/// text.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else if n.is_u64() {
                // beyond i64: keep every digit
                SqlValue::Text(n.to_string())
            } else {
                n.as_f64().map_or_else(|| SqlValue::Text(n.to_string()), SqlValue::Real)
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Keeps the last statement and rebuilds it only when the column list of
/// the projection differs.
#[derive(Debug)]
pub struct StatementBuilder {
    dialect: Dialect,
    table: String,
    cached: Option<PreparedInsert>,
}

impl StatementBuilder {
    pub fn new(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
            cached: None,
        }
    }

    pub fn build(&mut self, projection: &Projection) -> &PreparedInsert {
        let stmt = match self.cached.take() {
            Some(stmt) if stmt.matches(projection) => stmt,
            _ => {
                let columns: Vec<&str> = projection.columns().collect();
                let stmt = PreparedInsert::new(self.dialect, &self.table, &columns);
                log::debug!("rebuilt insert for {}: {}", self.table, stmt.sql());
                stmt
            }
        };
        self.cached.insert(stmt)
    }
}
