use crate::command::CommandBuilder;
use crate::error::SqlCurryError;
use crate::mapper::{map_all, map_one};
use crate::results::{DataSet, Record, ResultSet};
use crate::types::RowValues;

use super::run;

impl CommandBuilder<'_> {
    /// First column of the first row.
    ///
    /// `None` when the command returns no rows; a database NULL is `Some(RowValues::Null)`.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn scalar(&self) -> Result<Option<RowValues>, SqlCurryError> {
        run(self.target, &self.spec, "scalar", |conn, spec| {
            conn.with_cursor(spec, |cursor| {
                Ok(cursor
                    .next_row()?
                    .map(|values| values.into_iter().next().unwrap_or(RowValues::Null)))
            })
        })
    }

    /// Number of rows the statement changed. Zero is a normal result.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn non_query(&self) -> Result<usize, SqlCurryError> {
        run(self.target, &self.spec, "non_query", |conn, spec| {
            conn.non_query(spec)
        })
    }

    /// Every row as a [`Record`], in the order the database returned them.
    ///
    /// `None` when there are no rows; an empty vector is never returned.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn rows(&self) -> Result<Option<Vec<Record>>, SqlCurryError> {
        run(self.target, &self.spec, "rows", |conn, spec| {
            conn.with_cursor(spec, map_all)
        })
    }

    /// One [`Record`] built by reading the whole result.
    ///
    /// Every row is visited and the record keeps the values of the **last** one, not the
    /// first. `None` when there are no rows.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn row(&self) -> Result<Option<Record>, SqlCurryError> {
        run(self.target, &self.spec, "row", |conn, spec| {
            conn.with_cursor(spec, map_one)
        })
    }

    /// Bulk-fill every result set into a [`DataSet`] named `NewDataSet`.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn dataset(&self) -> Result<DataSet, SqlCurryError> {
        self.fill(DataSet::default())
    }

    /// Bulk-fill into a [`DataSet`] carrying `name`.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn dataset_named(&self, name: &str) -> Result<DataSet, SqlCurryError> {
        self.fill(DataSet::new(name))
    }

    /// The first table of the bulk fill; an empty `Table` when the command returns none.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::UnresolvedTarget`] or a wrapped driver error.
    pub fn table(&self) -> Result<ResultSet, SqlCurryError> {
        let data_set = self.fill(DataSet::default())?;
        Ok(data_set
            .tables
            .into_iter()
            .next()
            .unwrap_or_else(|| ResultSet::new(ResultSet::default_name(0), Vec::new())))
    }

    fn fill(&self, mut data_set: DataSet) -> Result<DataSet, SqlCurryError> {
        run(self.target, &self.spec, "dataset", |conn, spec| {
            conn.fill(spec, &mut data_set)
        })?;
        Ok(data_set)
    }
}
