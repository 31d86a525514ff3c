use thiserror::Error;

/// Failures raised by a [`crate::db::SqlClient`] implementation.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("schema change failed on `{statement}`: {source}")]
    Schema {
        statement: String,
        #[source]
        source: DbError,
    },
    #[error("could not read columns of table `{table}`: {source}")]
    ColumnMetadata {
        table: String,
        #[source]
        source: DbError,
    },
    #[error("insert failed: {source}")]
    Write {
        #[source]
        source: DbError,
    },
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("log worker is no longer running")]
    WorkerClosed,
}

impl SinkError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "SCH-1001",
            Self::ColumnMetadata { .. } => "SCH-1002",
            Self::Write { .. } => "WRT-1001",
            Self::InvalidIdentifier(_) => "CFG-1001",
            Self::Config(_) => "CFG-1002",
            Self::WorkerClosed => "WRK-1001",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::Schema { .. } => {
                "A CREATE or ALTER statement against the log table was rejected by the database."
            }
            Self::ColumnMetadata { .. } => "The log table's columns could not be read back.",
            Self::Write { .. } => "The database refused to store a log record.",
            Self::InvalidIdentifier(_) => {
                "Table and field names may only contain letters, digits and underscores."
            }
            Self::Config(_) => "The sink configuration could not be parsed or is inconsistent.",
            Self::WorkerClosed => "The background log writer has stopped accepting records.",
        }
    }

    /// Whether the error aborted initialization (as opposed to a single write).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::ColumnMetadata { .. })
    }
}
