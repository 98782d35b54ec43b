use tracing::debug;

use crate::command::CommandSpec;
use crate::error::SqlCurryError;
use crate::mapper::RowCursor;
use crate::results::DataSet;
use crate::target::Target;
use crate::types::DatabaseType;

#[cfg(feature = "mssql")]
use crate::mssql;
#[cfg(feature = "sqlite")]
use crate::sqlite;

/// An open connection to one of the enabled backends.
pub(crate) enum Connection {
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteConnection),
    #[cfg(feature = "mssql")]
    Mssql(mssql::MssqlConnection),
}

fn not_enabled(database_type: DatabaseType) -> SqlCurryError {
    SqlCurryError::Unimplemented(format!(
        "{database_type:?} support is not enabled in the current build"
    ))
}

impl Connection {
    /// Open a connection for `target` using its connection string and timeout.
    pub(crate) fn open(target: &Target, connection_string: &str) -> Result<Self, SqlCurryError> {
        debug!(database_type = ?target.database_type(), "opening connection");
        match target.database_type() {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(Connection::Sqlite(sqlite::SqliteConnection::open(
                connection_string,
                target.timeout(),
            )?)),
            #[cfg(feature = "mssql")]
            DatabaseType::Mssql => Ok(Connection::Mssql(mssql::MssqlConnection::open(
                connection_string,
                target.timeout(),
            )?)),
            #[allow(unreachable_patterns)]
            other => {
                let _ = connection_string;
                Err(not_enabled(other))
            }
        }
    }

    pub(crate) fn with_cursor<R>(
        &mut self,
        spec: &CommandSpec,
        f: impl FnOnce(&mut dyn RowCursor) -> Result<R, SqlCurryError>,
    ) -> Result<R, SqlCurryError> {
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.with_cursor(spec, f),
            #[cfg(feature = "mssql")]
            Connection::Mssql(conn) => conn.with_cursor(spec, f),
            #[allow(unreachable_patterns)]
            _ => {
                let _ = (spec, f);
                Err(SqlCurryError::Unimplemented(
                    "no database backend is enabled in the current build".to_string(),
                ))
            }
        }
    }

    pub(crate) fn non_query(&mut self, spec: &CommandSpec) -> Result<usize, SqlCurryError> {
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.non_query(spec),
            #[cfg(feature = "mssql")]
            Connection::Mssql(conn) => conn.non_query(spec),
            #[allow(unreachable_patterns)]
            _ => {
                let _ = spec;
                Err(SqlCurryError::Unimplemented(
                    "no database backend is enabled in the current build".to_string(),
                ))
            }
        }
    }

    pub(crate) fn fill(
        &mut self,
        spec: &CommandSpec,
        data_set: &mut DataSet,
    ) -> Result<(), SqlCurryError> {
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.fill(spec, data_set),
            #[cfg(feature = "mssql")]
            Connection::Mssql(conn) => conn.fill(spec, data_set),
            #[allow(unreachable_patterns)]
            _ => {
                let _ = (spec, data_set);
                Err(SqlCurryError::Unimplemented(
                    "no database backend is enabled in the current build".to_string(),
                ))
            }
        }
    }

    pub(crate) fn close(self) {
        match self {
            #[cfg(feature = "sqlite")]
            Connection::Sqlite(conn) => conn.close(),
            #[cfg(feature = "mssql")]
            Connection::Mssql(conn) => conn.close(),
            #[allow(unreachable_patterns)]
            _ => {}
        }
    }
}
