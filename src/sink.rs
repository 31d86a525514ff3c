//! Log sink that writes records into a self-maintaining table.
//!
//! The first write (or an explicit [`DynamicSqlLogSink::initialize`]) creates
//! the table and reconciles its columns with the configured fields. Every
//! write then projects the record onto the known columns, reuses or rebuilds
//! the INSERT, and executes it. Failures are returned as-is; nothing is
//! retried or buffered here.
//!
//! The sink takes `&mut self` for writes. Share it behind a mutex, or move
//! it onto a [`crate::workers::SinkWorker`], when several threads log.

use crate::columns::ColumnSet;
use crate::config::SinkConfig;
use crate::db::SqlClient;
use crate::errors::SinkError;
use crate::projector::{self, Projection};
use crate::record::LogRecord;
use crate::schema::SchemaReconciler;
use crate::statement::StatementBuilder;

pub struct DynamicSqlLogSink<C: SqlClient> {
    client: C,
    config: SinkConfig,
    columns: ColumnSet,
    initialized: bool,
    statements: StatementBuilder,
}

impl<C: SqlClient> DynamicSqlLogSink<C> {
    /// Build a sink around an explicit database handle.
    ///
    /// With `skip_schema_sync` the sink is ready immediately and never issues
    /// DDL; otherwise the table is reconciled on first use.
    pub fn new(client: C, config: SinkConfig) -> Result<Self, SinkError> {
        config.validate()?;
        let trusted = config.skip_schema_sync;
        let columns = if trusted {
            config.column_set()?
        } else {
            ColumnSet::baseline()
        };
        let statements = StatementBuilder::new(config.dialect, config.table.clone());
        Ok(Self {
            client,
            config,
            columns,
            initialized: trusted,
            statements,
        })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    /// Reconcile the table once. Later calls return immediately.
    ///
    /// The column set is only replaced after every DDL statement succeeded,
    /// so a failed run leaves the sink uninitialized and the next write
    /// tries again.
    pub fn initialize(&mut self) -> Result<(), SinkError> {
        if self.initialized {
            return Ok(());
        }
        let declared = self.config.column_set()?;
        SchemaReconciler::new(&self.client, self.config.dialect)
            .ensure(&self.config.table, &declared)?;
        self.columns = declared;
        self.initialized = true;
        Ok(())
    }

    /// The values `record` would be inserted with.
    pub fn project(&self, record: &LogRecord) -> Projection {
        projector::project(record, &self.columns)
    }

    /// Store one record, initializing the table first if needed.
    pub fn write(&mut self, record: &LogRecord) -> Result<(), SinkError> {
        self.initialize()?;
        let projection = projector::project(record, &self.columns);
        let stmt = self.statements.build(&projection);
        let params = stmt.bind(&projection);
        self.client
            .execute_named(stmt.sql(), &params)
            .map_err(|source| SinkError::Write { source })?;
        Ok(())
    }

    pub fn is_handling(&self, level: i64) -> bool {
        level >= self.config.level
    }

    /// Level-filtered write. Returns `true` when the record should not be
    /// passed on to further handlers.
    pub fn handle(&mut self, record: &LogRecord) -> Result<bool, SinkError> {
        if !self.is_handling(record.level) {
            return Ok(false);
        }
        self.write(record)?;
        Ok(!self.config.bubble)
    }
}
