use std::time::Duration;

use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use super::query::{FetchedTable, bind_query_params, collect_tables, command_text};
use crate::command::CommandSpec;
use crate::error::SqlCurryError;
use crate::mapper::{BufferedCursor, RowCursor};
use crate::results::DataSet;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

async fn connect(config: Config) -> Result<MssqlClient, SqlCurryError> {
    let tcp = TcpStream::connect_named(&config).await?;
    tcp.set_nodelay(true)
        .map_err(|e| SqlCurryError::ConnectionError(format!("TCP configuration error: {e}")))?;
    Ok(Client::connect(config, tcp.compat_write()).await?)
}

/// A single-use SQL Server connection driven on its own current-thread runtime.
///
/// Every call blocks the calling thread; do not use it from inside an async task.
pub struct MssqlConnection {
    runtime: Runtime,
    client: MssqlClient,
}

impl MssqlConnection {
    /// Connect using an ADO.NET connection string.
    ///
    /// # Errors
    /// Returns a config, network or login error; `ConnectionError` when `timeout` elapses.
    pub fn open(connection_string: &str, timeout: Option<Duration>) -> Result<Self, SqlCurryError> {
        let config = Config::from_ado_string(connection_string)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                SqlCurryError::ConnectionError(format!("Failed to start SQL Server runtime: {e}"))
            })?;
        let client = runtime.block_on(async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, connect(config))
                    .await
                    .map_err(|_| {
                        SqlCurryError::ConnectionError(format!(
                            "SQL Server connect timed out after {limit:?}"
                        ))
                    })?,
                None => connect(config).await,
            }
        })?;
        Ok(Self { runtime, client })
    }

    fn fetch(&mut self, spec: &CommandSpec) -> Result<Vec<FetchedTable>, SqlCurryError> {
        let text = command_text(spec);
        let query = bind_query_params(&text, &spec.params);
        let client = &mut self.client;
        self.runtime.block_on(async move {
            let stream = query.query(client).await?;
            collect_tables(stream).await
        })
    }

    /// Run the command and hand the first result set to `f` as a cursor.
    ///
    /// # Errors
    /// Returns query errors, or whatever `f` returns.
    pub fn with_cursor<R>(
        &mut self,
        spec: &CommandSpec,
        f: impl FnOnce(&mut dyn RowCursor) -> Result<R, SqlCurryError>,
    ) -> Result<R, SqlCurryError> {
        let first = self.fetch(spec)?.into_iter().next().unwrap_or_default();
        let mut cursor = BufferedCursor::new(first.columns, first.rows);
        f(&mut cursor)
    }

    /// Run a statement and return the total number of rows it changed.
    ///
    /// # Errors
    /// Returns query errors.
    pub fn non_query(&mut self, spec: &CommandSpec) -> Result<usize, SqlCurryError> {
        let text = command_text(spec);
        let query = bind_query_params(&text, &spec.params);
        let client = &mut self.client;
        let result = self
            .runtime
            .block_on(async move { query.execute(client).await })?;
        let rows_affected: u64 = result.rows_affected().iter().sum();
        usize::try_from(rows_affected).map_err(|e| {
            SqlCurryError::ExecutionError(format!("Invalid rows affected count: {e}"))
        })
    }

    /// Bulk-fill every result set into `data_set`.
    ///
    /// # Errors
    /// Returns query errors.
    pub fn fill(&mut self, spec: &CommandSpec, data_set: &mut DataSet) -> Result<(), SqlCurryError> {
        for fetched in self.fetch(spec)? {
            let table = data_set.push_table(fetched.columns);
            for values in fetched.rows {
                table.add_row_values(values);
            }
        }
        Ok(())
    }

    pub fn close(self) {
        let Self { runtime, client } = self;
        if let Err(err) = runtime.block_on(client.close()) {
            debug!(error = %err, "SQL Server close failed; connection dropped");
        }
    }
}
