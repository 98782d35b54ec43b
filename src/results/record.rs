use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// One database row as an ordered mapping from column name to value.
///
/// Columns keep the order in which they were first inserted (cursor order when built by
/// the mapper). A column name appears at most once: inserting an existing name replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<RowValues>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Set `column` to `value`, returning the previous value when the column already existed.
    pub fn insert(&mut self, column: impl Into<String>, value: RowValues) -> Option<RowValues> {
        let column = column.into();
        if let Some(idx) = self.index_of(&column) {
            return Some(std::mem::replace(&mut self.values[idx], value));
        }
        self.columns.push(column);
        self.values.push(value);
        None
    }

    /// Get a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.index_of(column).map(|idx| &self.values[idx])
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }

    /// Remove a column, keeping the order of the others.
    pub fn remove(&mut self, column: &str) -> Option<RowValues> {
        let idx = self.index_of(column)?;
        self.columns.remove(idx);
        Some(self.values.remove(idx))
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>> FromIterator<(K, RowValues)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, RowValues)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_column_overwrites_in_place() {
        let mut record = Record::new();
        record.insert("b", RowValues::Int(1));
        record.insert("a", RowValues::Int(2));
        let previous = record.insert("b", RowValues::Int(3));
        assert_eq!(previous, Some(RowValues::Int(1)));
        assert_eq!(record.columns(), ["b", "a"]);
        assert_eq!(record.get("b"), Some(&RowValues::Int(3)));
    }

    #[test]
    fn json_keeps_column_order() {
        let record: Record = [
            ("zeta", RowValues::Text("z".into())),
            ("alpha", RowValues::Null),
            ("mid", RowValues::Float(1.5)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":"z","alpha":null,"mid":1.5}"#);
    }
}
