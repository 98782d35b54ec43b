//! Result shapes produced by the terminal methods.
//!
//! [`Record`] is the key/value form handed to callers that forward rows as JSON;
//! [`DataSet`] and [`ResultSet`] are the tabular form filled by the bulk adapter.

mod record;
mod result_set;

pub use record::Record;
pub use result_set::{DataRow, DataSet, ResultSet};
