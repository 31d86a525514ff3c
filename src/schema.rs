//! Log table creation and column reconciliation.
//!
//! The table is never migrated through a versioned history. Instead the live
//! columns are diffed against the declared field list and the difference is
//! applied with `ALTER TABLE`. Additional fields are always nullable free
//! text, so dropping and re-adding them loses nothing but data.

use crate::columns::{self, ColumnSet, CHANNEL, LEVEL, TIME};
use crate::db::{Dialect, SqlClient};
use crate::errors::SinkError;

/// Statements that create the table and its indexes if missing.
pub fn create_table_ddl(dialect: Dialect, table: &str) -> Vec<String> {
    let t = dialect.quote(table);
    match dialect {
        Dialect::Mysql => vec![format!(
            "CREATE TABLE IF NOT EXISTS {t} (\
             `id` BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY, \
             `channel` VARCHAR(255), \
             `level` INTEGER, \
             `message` LONGTEXT, \
             `time` DATETIME, \
             INDEX(`channel`) USING HASH, \
             INDEX(`level`) USING HASH, \
             INDEX(`time`) USING BTREE)"
        )],
        Dialect::Sqlite => {
            let mut ddl = vec![format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                 \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
                 \"channel\" VARCHAR(255), \
                 \"level\" INTEGER, \
                 \"message\" TEXT, \
                 \"time\" DATETIME)"
            )];
            for column in [CHANNEL, LEVEL, TIME] {
                ddl.push(format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {t} ({})",
                    dialect.quote(&format!("{table}_{column}_idx")),
                    dialect.quote(column)
                ));
            }
            ddl
        }
    }
}

pub fn add_column_ddl(dialect: Dialect, table: &str, column: &str) -> String {
    let (t, c) = (dialect.quote(table), dialect.quote(column));
    match dialect {
        Dialect::Mysql => format!("ALTER TABLE {t} ADD {c} TEXT NULL DEFAULT NULL"),
        Dialect::Sqlite => format!("ALTER TABLE {t} ADD COLUMN {c} TEXT DEFAULT NULL"),
    }
}

pub fn drop_column_ddl(dialect: Dialect, table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} DROP COLUMN {}",
        dialect.quote(table),
        dialect.quote(column)
    )
}

/// A query that returns no rows but reports every column of `table`.
pub fn probe_columns_sql(dialect: Dialect, table: &str) -> String {
    format!("SELECT * FROM {} LIMIT 0", dialect.quote(table))
}

/// Column changes needed to bring a table in line with a declared set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

impl SchemaDiff {
    /// `removed = actual - declared - baseline`, `added = declared - actual`.
    pub fn between(actual: &[String], declared: &ColumnSet) -> Self {
        let removed = actual
            .iter()
            .filter(|c| !columns::is_baseline(c) && !declared.contains(c))
            .cloned()
            .collect();
        let added = declared
            .additional()
            .filter(|f| !actual.iter().any(|c| columns::same_name(c, f)))
            .map(String::from)
            .collect();
        Self { removed, added }
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Brings one table in line with a declared column set.
pub struct SchemaReconciler<'a, C: SqlClient + ?Sized> {
    client: &'a C,
    dialect: Dialect,
}

impl<'a, C: SqlClient + ?Sized> SchemaReconciler<'a, C> {
    pub fn new(client: &'a C, dialect: Dialect) -> Self {
        Self { client, dialect }
    }

    /// Create the table if needed, then drop stale and add missing
    /// additional columns. Returns the diff that was applied. Any failing
    /// statement aborts the run; nothing is retried.
    pub fn ensure(&self, table: &str, declared: &ColumnSet) -> Result<SchemaDiff, SinkError> {
        columns::validate_identifier(table)?;
        for ddl in create_table_ddl(self.dialect, table) {
            self.run(ddl)?;
        }

        let actual = self.live_columns(table)?;
        let diff = SchemaDiff::between(&actual, declared);

        for column in &diff.removed {
            log::debug!("dropping stale column {column} from {table}");
            self.run(drop_column_ddl(self.dialect, table, column))?;
        }
        for column in &diff.added {
            log::debug!("adding column {column} to {table}");
            self.run(add_column_ddl(self.dialect, table, column))?;
        }

        if !diff.is_empty() {
            log::info!(
                "reconciled log table {table}: {} dropped, {} added",
                diff.removed.len(),
                diff.added.len()
            );
        }
        Ok(diff)
    }

    /// Column names as the database currently reports them.
    pub fn live_columns(&self, table: &str) -> Result<Vec<String>, SinkError> {
        self.client
            .column_names(&probe_columns_sql(self.dialect, table))
            .map_err(|source| SinkError::ColumnMetadata {
                table: table.to_string(),
                source,
            })
    }

    fn run(&self, statement: String) -> Result<(), SinkError> {
        match self.client.execute(&statement) {
            Ok(()) => Ok(()),
            Err(source) => Err(SinkError::Schema { statement, source }),
        }
    }
}
