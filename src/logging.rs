//! Bridge from the `log` facade into a [`DynamicSqlLogSink`].
//!
//! Install with [`init`] to persist `log::info!` and friends. The record's
//! target becomes the channel and its source location is attached as
//! context, so declaring `module_path`, `file` or `line` as additional
//! fields stores them.

use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use serde_json::Value;

use crate::db::SqlClient;
use crate::record::{Level, LogRecord};
use crate::sink::DynamicSqlLogSink;

/// Records from this crate are never written, otherwise reconciliation
/// messages would re-enter the sink that emitted them.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

pub struct SqlLogger<C: SqlClient> {
    sink: Mutex<DynamicSqlLogSink<C>>,
}

impl<C: SqlClient> SqlLogger<C> {
    pub fn new(sink: DynamicSqlLogSink<C>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn into_sink(self) -> DynamicSqlLogSink<C> {
        match self.sink.into_inner() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn is_own(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
}

pub fn to_log_record(record: &Record<'_>) -> LogRecord {
    let mut entry = LogRecord::new(
        record.target(),
        Level::from(record.level()),
        record.args().to_string(),
    );
    if let Some(module) = record.module_path() {
        entry.context.insert("module_path".into(), Value::from(module));
    }
    if let Some(file) = record.file() {
        entry.context.insert("file".into(), Value::from(file));
    }
    if let Some(line) = record.line() {
        entry.context.insert("line".into(), Value::from(line));
    }
    entry
}

impl<C: SqlClient + Send> Log for SqlLogger<C> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        if is_own(metadata.target()) {
            return false;
        }
        match self.sink.lock() {
            Ok(sink) => sink.is_handling(Level::from(metadata.level()).value()),
            Err(_) => false,
        }
    }

    fn log(&self, record: &Record<'_>) {
        if is_own(record.target()) {
            return;
        }
        let entry = to_log_record(record);
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.handle(&entry);
        }
    }

    fn flush(&self) {}
}

/// Install `sink` as the global logger.
pub fn init<C>(sink: DynamicSqlLogSink<C>, max_level: LevelFilter) -> Result<(), log::SetLoggerError>
where
    C: SqlClient + Send + 'static,
{
    log::set_boxed_logger(Box::new(SqlLogger::new(sink)))?;
    log::set_max_level(max_level);
    Ok(())
}
