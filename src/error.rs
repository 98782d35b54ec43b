use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "mssql")]
use tiberius;

#[derive(Debug, Error)]
pub enum SqlCurryError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    /// The bootstrap configuration table returned no rows.
    #[error("No data from FWK_ConfigSettings")]
    NoConfigData,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A target was used as a connection source without a resolved connection string.
    #[error("Unresolved target `{name}`: no connection string was configured")]
    UnresolvedTarget { name: String },

    /// A driver failure inside one terminal call, tagged with the call's unit of work.
    #[error("unit of work {unit_of_work} on target `{target}` failed: {source}")]
    Execution {
        unit_of_work: Uuid,
        target: String,
        #[source]
        source: Box<SqlCurryError>,
    },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl SqlCurryError {
    /// The error a driver raised, looking through the unit-of-work wrapper.
    #[must_use]
    pub fn root(&self) -> &SqlCurryError {
        match self {
            SqlCurryError::Execution { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for the configuration failures that should halt startup.
    #[must_use]
    pub fn is_config_fatal(&self) -> bool {
        matches!(
            self.root(),
            SqlCurryError::NoConfigData | SqlCurryError::ConfigError(_)
        )
    }
}
