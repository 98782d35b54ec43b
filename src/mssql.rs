// SQL Server backend - single-use tiberius connections
//
// - client: connect/close and the terminal operations, blocking on a private runtime
// - query: T-SQL batch generation, parameter binding and result extraction

mod client;
mod query;

pub use client::{MssqlClient, MssqlConnection};
pub use query::{bind_query_params, command_text};
