use rusqlite::types::Value;
use rusqlite::{Rows, Statement};

use crate::error::SqlCurryError;
use crate::mapper::RowCursor;
use crate::results::DataSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlCurryError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlCurryError> {
    let value: Value = row.get(idx)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

pub(crate) fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect()
}

/// Streams rows straight off a stepped statement.
pub struct SqliteCursor<'stmt> {
    columns: Vec<String>,
    rows: Rows<'stmt>,
}

impl<'stmt> SqliteCursor<'stmt> {
    pub(crate) fn new(columns: Vec<String>, rows: Rows<'stmt>) -> Self {
        Self { columns, rows }
    }
}

impl RowCursor for SqliteCursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlCurryError> {
        let col_count = self.columns.len();
        match self.rows.next()? {
            Some(row) => {
                let mut values = Vec::with_capacity(col_count);
                for i in 0..col_count {
                    values.push(sqlite_extract_value_sync(row, i)?);
                }
                Ok(Some(values))
            }
            None => Ok(None),
        }
    }
}

/// Fill `data_set` from a cursor. A statement without result columns adds no table.
///
/// # Errors
/// Propagates cursor errors.
pub fn fill_data_set(
    cursor: &mut dyn RowCursor,
    data_set: &mut DataSet,
) -> Result<(), SqlCurryError> {
    if cursor.columns().is_empty() {
        while cursor.next_row()?.is_some() {}
        return Ok(());
    }
    let table = data_set.push_table(cursor.columns().to_vec());
    while let Some(values) = cursor.next_row()? {
        table.add_row_values(values);
    }
    Ok(())
}
