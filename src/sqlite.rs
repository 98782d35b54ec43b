// SQLite backend - single-use rusqlite connections
//
// - connection: open/close and the terminal operations
// - params: binding `Parameter`s onto a prepared statement
// - query: value extraction and the streaming cursor

mod connection;
mod params;
mod query;

pub use connection::SqliteConnection;
pub use params::{bind_parameters, row_value_to_sqlite_value};
pub use query::{SqliteCursor, sqlite_extract_value_sync};
