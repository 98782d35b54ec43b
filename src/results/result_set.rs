use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::record::Record;
use crate::types::RowValues;

/// A row of a [`ResultSet`], sharing the table's column names.
#[derive(Debug, Clone)]
pub struct DataRow {
    /// The column names for this row (shared across all rows in a result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<RowValues>,
}

impl DataRow {
    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Copy the row into a [`Record`].
    #[must_use]
    pub fn to_record(&self) -> Record {
        self.column_names
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// One table of a bulk fill.
///
/// Column names are stored once and shared by every row.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Table name as the fill adapter assigns it: `Table`, `Table1`, `Table2`, ...
    pub name: String,
    /// The rows returned by the command
    pub results: Vec<DataRow>,
    column_names: Arc<Vec<String>>,
}

impl ResultSet {
    /// Create an empty table with the given name and columns.
    #[must_use]
    pub fn new(name: impl Into<String>, column_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
            column_names: Arc::new(column_names),
        }
    }

    /// Name the fill adapter gives the table at `index` within a data set.
    #[must_use]
    pub fn default_name(index: usize) -> String {
        if index == 0 {
            "Table".to_string()
        } else {
            format!("Table{index}")
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    /// Add a row to the result set
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        self.results.push(DataRow {
            column_names: Arc::clone(&self.column_names),
            values,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rows as records, in row order.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.results.iter().map(DataRow::to_record).collect()
    }
}

/// Serializes as an array of row objects.
impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.results.len()))?;
        for row in &self.results {
            seq.serialize_element(&row.to_record())?;
        }
        seq.end()
    }
}

/// In-memory result of a bulk fill: every result set a command returned, in order.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub name: String,
    pub tables: Vec<ResultSet>,
}

impl Default for DataSet {
    fn default() -> Self {
        Self::new("NewDataSet")
    }
}

impl DataSet {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Append a table, naming it after its position.
    pub fn push_table(&mut self, column_names: Vec<String>) -> &mut ResultSet {
        let name = ResultSet::default_name(self.tables.len());
        self.tables.push(ResultSet::new(name, column_names));
        let last = self.tables.len() - 1;
        &mut self.tables[last]
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&ResultSet> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Serializes as an object keyed by table name.
impl Serialize for DataSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.name, table)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_named_by_position() {
        let mut ds = DataSet::default();
        ds.push_table(vec!["a".into()]).add_row_values(vec![RowValues::Int(1)]);
        ds.push_table(vec!["b".into()]);
        let names: Vec<&str> = ds.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Table", "Table1"]);
        assert_eq!(
            serde_json::to_string(&ds).unwrap(),
            r#"{"Table":[{"a":1}],"Table1":[]}"#
        );
    }

    #[test]
    fn rows_share_column_names() {
        let mut rs = ResultSet::new("Table", vec!["id".into(), "name".into()]);
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("x".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Null]);
        assert!(Arc::ptr_eq(
            &rs.results[0].column_names,
            &rs.results[1].column_names
        ));
        assert_eq!(rs.results[1].get("name"), Some(&RowValues::Null));
        assert_eq!(rs.records()[0].get("id"), Some(&RowValues::Int(1)));
    }
}
