//! Sink configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//! a `logs` table with only the baseline columns, accepting every level.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::columns::{self, ColumnSet};
use crate::db::Dialect;
use crate::errors::SinkError;
use crate::record::Level;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub table: String,
    pub additional_fields: Vec<String>,
    /// Minimum severity handled by [`crate::sink::DynamicSqlLogSink::handle`].
    pub level: i64,
    /// Whether handled records should still reach the next handler.
    pub bubble: bool,
    /// Trust the table to already match `additional_fields` and never run DDL.
    pub skip_schema_sync: bool,
    pub dialect: Dialect,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            table: "logs".into(),
            additional_fields: Vec::new(),
            level: Level::Debug.value(),
            bubble: true,
            skip_schema_sync: false,
            dialect: Dialect::default(),
        }
    }
}

impl SinkConfig {
    pub fn new(table: impl Into<String>, additional_fields: &[&str]) -> Self {
        Self {
            table: table.into(),
            additional_fields: additional_fields.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, SinkError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| SinkError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid sink config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), SinkError> {
        columns::validate_identifier(&self.table)?;
        let mut seen = HashSet::new();
        for field in &self.additional_fields {
            columns::validate_identifier(field)?;
            if !seen.insert(field.to_ascii_lowercase()) {
                return Err(SinkError::Config(format!(
                    "additional field `{field}` is declared twice"
                )));
            }
        }
        Ok(())
    }

    /// Baseline columns plus the declared additional fields.
    pub fn column_set(&self) -> Result<ColumnSet, SinkError> {
        ColumnSet::with_additional(&self.additional_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = SinkConfig::from_json("{}").unwrap();
        assert_eq!(config, SinkConfig::default());
        assert_eq!(config.table, "logs");
        assert!(config.bubble);
        assert!(!config.skip_schema_sync);
    }

    #[test]
    fn parses_every_field() {
        let config = SinkConfig::from_json(
            r#"{"table":"app_logs","additional_fields":["user_id"],"level":300,
                "bubble":false,"skip_schema_sync":true,"dialect":"mysql"}"#,
        )
        .unwrap();
        assert_eq!(config.table, "app_logs");
        assert_eq!(config.additional_fields, vec!["user_id"]);
        assert_eq!(config.level, 300);
        assert!(!config.bubble);
        assert!(config.skip_schema_sync);
        assert_eq!(config.dialect, Dialect::Mysql);
    }

    #[test]
    fn rejects_duplicates_and_bad_names() {
        let dup = SinkConfig::new("logs", &["a", "a"]).validate().unwrap_err();
        assert_eq!(dup.code(), "CFG-1002");
        let folded = SinkConfig::new("logs", &["user", "User"]).validate().unwrap_err();
        assert_eq!(folded.code(), "CFG-1002");
        let bad = SinkConfig::new("logs`", &[]).validate().unwrap_err();
        assert_eq!(bad.code(), "CFG-1001");
        assert!(SinkConfig::from_json("{\"level\":\"high\"}").is_err());
    }
}
