//! Turns a [`LogRecord`] into the column values of one insert.
//!
//! Projection happens in two phases. First everything the record supplied is
//! pruned: keys that are not table columns and keys whose value is null are
//! removed. Then every declared additional field that did not survive is
//! added back as an explicit null, so the insert always names all declared
//! fields.
//!
//! Context keys named like a baseline column (`channel`, `level`, `message`,
//! `time`) replace the structured value of that column. This is kept for
//! compatibility with existing tables.

use serde_json::Value;
use time::macros::format_description;
use time::UtcOffset;

use crate::columns::{ColumnSet, CHANNEL, ID, LEVEL, MESSAGE, TIME};
use crate::record::LogRecord;

/// Column/value pairs in insert order. Never contains `id`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    values: Vec<(String, Value)>,
}

impl Projection {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Render a timestamp the way DATETIME columns expect it, in UTC.
pub fn format_time(record: &LogRecord) -> String {
    let utc = record.datetime.to_offset(UtcOffset::UTC);
    utc.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| utc.to_string())
}

pub fn project(record: &LogRecord, columns: &ColumnSet) -> Projection {
    let mut values: Vec<(String, Value)> = vec![
        (CHANNEL.to_string(), Value::from(record.channel.as_str())),
        (LEVEL.to_string(), Value::from(record.level)),
        (MESSAGE.to_string(), Value::from(record.message.as_str())),
        (TIME.to_string(), Value::from(format_time(record))),
    ];

    for (key, value) in record.merged_context() {
        let key = columns.canonical(&key).map(String::from).unwrap_or(key);
        match values.iter_mut().find(|(c, _)| *c == key) {
            Some(slot) => slot.1 = value,
            None => values.push((key, value)),
        }
    }

    values.retain(|(column, value)| column != ID && columns.contains(column) && !value.is_null());

    for field in columns.additional() {
        if !values.iter().any(|(c, _)| c == field) {
            values.push((field.to_string(), Value::Null));
        }
    }

    Projection { values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use serde_json::json;
    use time::macros::datetime;

    fn record() -> LogRecord {
        LogRecord::new("app", Level::Error, "failed").at(datetime!(2024-05-01 12:30:00 +02:00))
    }

    #[test]
    fn baseline_values_come_first() {
        let p = project(&record(), &ColumnSet::baseline());
        assert_eq!(
            p.columns().collect::<Vec<_>>(),
            vec!["channel", "level", "message", "time"]
        );
        assert_eq!(p.get("level"), Some(&json!(400)));
        assert_eq!(p.get("time"), Some(&json!("2024-05-01 10:30:00")));
    }

    #[test]
    fn unknown_context_keys_are_dropped() {
        let columns = ColumnSet::with_additional(&["user_id"]).unwrap();
        let rec = record()
            .with_context("user_id", 42)
            .with_context("extra_unused", "x");
        let p = project(&rec, &columns);
        assert_eq!(p.get("user_id"), Some(&json!(42)));
        assert!(p.get("extra_unused").is_none());
        assert!(p.columns().all(|c| columns.contains(c)));
    }

    #[test]
    fn absent_and_null_fields_both_become_null() {
        let columns = ColumnSet::with_additional(&["user_id", "ip"]).unwrap();
        let absent = project(&record().with_context("ip", "::1"), &columns);
        let null = project(
            &record().with_context("ip", "::1").with_context("user_id", Value::Null),
            &columns,
        );
        assert_eq!(absent, null);
        assert_eq!(absent.get("user_id"), Some(&Value::Null));
        assert_eq!(absent.len(), 6);
    }

    #[test]
    fn context_overrides_baseline_values() {
        let rec = record().with_context("channel", "override");
        let p = project(&rec, &ColumnSet::baseline());
        assert_eq!(p.get("channel"), Some(&json!("override")));
    }

    #[test]
    fn null_baseline_override_omits_the_column() {
        let rec = record().with_context("message", Value::Null);
        let p = project(&rec, &ColumnSet::baseline());
        assert!(p.get("message").is_none());
    }

    #[test]
    fn context_keys_take_the_declared_spelling() {
        let columns = ColumnSet::with_additional(&["user_id"]).unwrap();
        let rec = record()
            .with_context("USER_ID", 7)
            .with_context("Channel", "upper");
        let p = project(&rec, &columns);
        assert_eq!(p.get("user_id"), Some(&json!(7)));
        assert_eq!(p.get("channel"), Some(&json!("upper")));
        assert_eq!(p.len(), 5);
    }

    #[test]
    fn id_is_never_projected() {
        let rec = record().with_context("id", 99);
        let p = project(&rec, &ColumnSet::baseline());
        assert!(p.columns().all(|c| c != "id"));
    }

    #[test]
    fn extra_is_merged_before_filtering() {
        let columns = ColumnSet::with_additional(&["request_id"]).unwrap();
        let rec = record()
            .with_context("request_id", "ctx")
            .with_extra("request_id", "extra");
        assert_eq!(project(&rec, &columns).get("request_id"), Some(&json!("extra")));
    }
}
