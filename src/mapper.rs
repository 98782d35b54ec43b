//! Cursor-to-record mapping shared by every backend.

use crate::error::SqlCurryError;
use crate::results::Record;
use crate::types::RowValues;

/// A forward-only cursor over the rows of one result.
pub trait RowCursor {
    /// Column names as the driver reports them, in column order.
    fn columns(&self) -> &[String];

    /// Advance to the next row, returning its values in column order.
    ///
    /// # Errors
    /// Returns the driver error raised while fetching or decoding the row.
    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlCurryError>;
}

/// A cursor over rows that were already fetched.
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<RowValues>>,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RowValues>>) -> Self {
        Self {
            columns,
            rows: rows.into_iter(),
        }
    }
}

impl RowCursor for BufferedCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlCurryError> {
        Ok(self.rows.next())
    }
}

fn fill(record: &mut Record, columns: &[String], values: Vec<RowValues>) {
    for (column, value) in columns.iter().zip(values) {
        record.insert(column.as_str(), value);
    }
}

/// Map every row of the cursor into a [`Record`], in cursor order.
///
/// Returns `None` when the cursor has no rows, never an empty vector.
///
/// # Errors
/// Propagates cursor errors.
pub fn map_all(cursor: &mut dyn RowCursor) -> Result<Option<Vec<Record>>, SqlCurryError> {
    let mut records = Vec::new();
    while let Some(values) = cursor.next_row()? {
        let mut record = Record::with_capacity(values.len());
        fill(&mut record, cursor.columns(), values);
        records.push(record);
    }
    if records.is_empty() {
        Ok(None)
    } else {
        Ok(Some(records))
    }
}

/// Map the cursor into a single [`Record`].
///
/// Every row is read into the same record, so the result holds the values of the
/// **last** row the cursor produced. Callers that want the first row must order the
/// query accordingly or use [`map_all`]. Returns `None` when the cursor has no rows.
///
/// # Errors
/// Propagates cursor errors.
pub fn map_one(cursor: &mut dyn RowCursor) -> Result<Option<Record>, SqlCurryError> {
    let mut record: Option<Record> = None;
    while let Some(values) = cursor.next_row()? {
        let target = record.get_or_insert_with(|| Record::with_capacity(values.len()));
        fill(target, cursor.columns(), values);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(rows: Vec<Vec<RowValues>>) -> BufferedCursor {
        BufferedCursor::new(vec!["id".into(), "name".into()], rows)
    }

    fn row(id: i64, name: &str) -> Vec<RowValues> {
        vec![RowValues::Int(id), RowValues::Text(name.into())]
    }

    #[test]
    fn empty_cursor_maps_to_none() {
        assert!(map_all(&mut cursor(vec![])).unwrap().is_none());
        assert!(map_one(&mut cursor(vec![])).unwrap().is_none());
    }

    #[test]
    fn map_all_keeps_cursor_order() {
        let mapped = map_all(&mut cursor(vec![row(3, "c"), row(1, "a"), row(2, "b")]))
            .unwrap()
            .unwrap();
        let ids: Vec<i64> = mapped
            .iter()
            .map(|r| *r.get("id").unwrap().as_int().unwrap())
            .collect();
        assert_eq!(ids, [3, 1, 2]);
    }

    #[test]
    fn map_one_returns_last_row() {
        let mapped = map_one(&mut cursor(vec![row(1, "a"), row(2, "b"), row(3, "c")]))
            .unwrap()
            .unwrap();
        assert_eq!(mapped.get("id"), Some(&RowValues::Int(3)));
        assert_eq!(mapped.get("name"), Some(&RowValues::Text("c".into())));
        assert_eq!(mapped.len(), 2);
    }

    #[test]
    fn duplicate_column_names_collapse() {
        let mut cur = BufferedCursor::new(
            vec!["x".into(), "x".into()],
            vec![vec![RowValues::Int(1), RowValues::Int(2)]],
        );
        let record = map_one(&mut cur).unwrap().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("x"), Some(&RowValues::Int(2)));
    }
}
