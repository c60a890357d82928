use std::fmt;

use crate::{
    storage::schema::TableInfo,
    types::{error::Result, row::Row},
};

/// Row filter on a single column.
///
/// The test receives the field's display string, which is what a WHERE
/// layer sitting on top of the storage engine compares against. Passing no
/// predicate to a scan, update or delete selects every row.
pub struct Predicate {
    column: String,
    test: Box<dyn Fn(&str) -> bool>,
}

impl Predicate {
    pub fn new(column: impl Into<String>, test: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            column: column.into(),
            test: Box::new(test),
        }
    }

    /// Exact match on the display string.
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(column, move |field| field == value)
    }

    pub fn eq_ignore_case(column: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into().to_lowercase();
        Self::new(column, move |field| field.to_lowercase() == value)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Fails with `ColumnNotFound` when the column is not part of `schema`.
    pub fn validate_against_schema(&self, schema: &TableInfo) -> Result<()> {
        schema.column_index(&self.column).map(|_| ())
    }

    pub fn evaluate(&self, row: &Row, schema: &TableInfo) -> Result<bool> {
        let index = schema.column_index(&self.column)?;
        Ok(row
            .get_value(index)
            .is_some_and(|value| (self.test)(&value.to_string())))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}
