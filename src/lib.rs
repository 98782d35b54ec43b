//! Connection-curried SQL commands.
//!
//! A call reads left to right: pick a [`Target`], shape a command on it, then end with one
//! terminal method. Each terminal method opens its own connection and closes it before
//! returning, success or failure.
//!
//! ```rust,no_run
//! use sql_curry::prelude::*;
//!
//! # fn demo() -> Result<(), SqlCurryError> {
//! let bootstrap = BootstrapConnections::from_env();
//! let store = ConfigStore::bootstrap(Target::new(
//!     "bootstrap",
//!     Some(bootstrap.current().to_string()),
//!     DatabaseType::Mssql,
//! ));
//! let targets = TargetRegistry::load(&store, DatabaseType::Mssql)?;
//!
//! let person = targets
//!     .jics
//!     .procedure("dbo.usp_person_by_id")
//!     .typed_param("@id", SqlType::Int, 42)
//!     .row()?;
//! println!("{}", to_json(&person).unwrap_or_default());
//! # Ok(()) }
//! ```

pub mod command;
pub mod config;
pub mod error;
mod executor;
pub mod json;
pub mod mapper;
pub mod prelude;
pub mod results;
pub mod target;
pub mod types;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use command::{CommandBuilder, CommandSpec, Parameter};
pub use error::SqlCurryError;
pub use results::{DataRow, DataSet, Record, ResultSet};
pub use target::{Target, TargetRegistry};
pub use types::{CommandKind, DatabaseType, RowValues, SqlType};
