use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use super::params::bind_parameters;
use super::query::{SqliteCursor, column_names, fill_data_set};
use crate::command::CommandSpec;
use crate::error::SqlCurryError;
use crate::mapper::RowCursor;
use crate::results::DataSet;
use crate::types::CommandKind;

/// Strip an ADO-style `Data Source=` key so a plain path, `:memory:` or `file:` URI remains.
fn database_path(connection_string: &str) -> &str {
    let trimmed = connection_string.trim().trim_end_matches(';');
    for key in ["data source=", "datasource="] {
        if trimmed.len() >= key.len() && trimmed[..key.len()].eq_ignore_ascii_case(key) {
            return trimmed[key.len()..].trim();
        }
    }
    trimmed
}

/// A single-use `SQLite` connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// Open the database named by `connection_string`.
    ///
    /// # Errors
    /// Returns the rusqlite error when the file cannot be opened or the timeout set.
    pub fn open(connection_string: &str, timeout: Option<Duration>) -> Result<Self, SqlCurryError> {
        let conn = Connection::open(database_path(connection_string))?;
        if let Some(timeout) = timeout {
            conn.busy_timeout(timeout)?;
        }
        Ok(Self { conn })
    }

    fn ensure_text(spec: &CommandSpec) -> Result<(), SqlCurryError> {
        match spec.kind {
            CommandKind::Text => Ok(()),
            CommandKind::StoredProcedure => Err(SqlCurryError::Unimplemented(format!(
                "SQLite has no stored procedures (requested `{}`)",
                spec.text
            ))),
        }
    }

    /// Run the command and hand its rows to `f` as a streaming cursor.
    ///
    /// # Errors
    /// Returns prepare, bind or step errors, or whatever `f` returns.
    pub fn with_cursor<R>(
        &mut self,
        spec: &CommandSpec,
        f: impl FnOnce(&mut dyn RowCursor) -> Result<R, SqlCurryError>,
    ) -> Result<R, SqlCurryError> {
        Self::ensure_text(spec)?;
        let mut stmt = self.conn.prepare(&spec.text)?;
        bind_parameters(&mut stmt, &spec.params)?;
        let columns = column_names(&stmt);
        let mut cursor = SqliteCursor::new(columns, stmt.raw_query());
        f(&mut cursor)
    }

    /// Run a statement and return the number of rows it changed.
    ///
    /// # Errors
    /// Returns prepare, bind or execution errors.
    pub fn non_query(&mut self, spec: &CommandSpec) -> Result<usize, SqlCurryError> {
        Self::ensure_text(spec)?;
        let mut stmt = self.conn.prepare(&spec.text)?;
        bind_parameters(&mut stmt, &spec.params)?;
        Ok(stmt.raw_execute()?)
    }

    /// Bulk-fill the statement's result into `data_set`.
    ///
    /// # Errors
    /// Returns prepare, bind or step errors.
    pub fn fill(&mut self, spec: &CommandSpec, data_set: &mut DataSet) -> Result<(), SqlCurryError> {
        self.with_cursor(spec, |cursor| fill_data_set(cursor, data_set))
    }

    pub fn close(self) {
        if let Err((_conn, err)) = self.conn.close() {
            debug!(error = %err, "sqlite close failed; connection dropped");
        }
    }
}
