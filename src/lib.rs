//! Log sink that stores records in a relational table and keeps the table's
//! columns in line with a configured field list.
//!
//! - [`columns`] declares the baseline columns and validates identifiers.
//! - [`record`] defines the log record handed to the sink.
//! - [`db`] is the database collaborator trait with rusqlite/r2d2 backends.
//! - [`schema`] creates the table and reconciles its columns.
//! - [`projector`] maps a record onto the current columns.
//! - [`statement`] builds the parameterised INSERT for a projection.
//! - [`sink`] ties the pieces together behind a single `write` call.
//! - [`config`] holds the sink settings.
//! - [`errors`] keeps the error catalogue with stable codes.
//! - [`logging`] routes the `log` facade into a sink.
//! - [`workers`] runs a sink on its own thread behind a bounded queue.

pub mod columns;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod projector;
pub mod record;
pub mod schema;
pub mod sink;
pub mod statement;
pub mod workers;

pub use config::SinkConfig;
pub use db::{DbPool, Dialect, SqlClient};
pub use errors::{DbError, SinkError};
pub use record::{Level, LogRecord};
pub use sink::DynamicSqlLogSink;
pub use workers::{SinkWorker, WorkerReport};
