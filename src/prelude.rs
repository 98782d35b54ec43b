//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::command::{CommandBuilder, CommandSpec, Parameter};
pub use crate::config::{
    BootstrapConnections, BootstrapSource, ConfigRow, ConfigSource, ConfigStore, Environment,
};
pub use crate::error::SqlCurryError;
pub use crate::json::{optional_to_json, to_json};
pub use crate::results::{DataRow, DataSet, Record, ResultSet};
pub use crate::target::{Target, TargetRegistry};
pub use crate::types::{CommandKind, DatabaseType, RowValues, SqlType};
