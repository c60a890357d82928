use tracing::trace;

use crate::{
    storage::{
        bplus_tree::BPlusTree,
        schema::{TABLES_TABLE, TableInfo},
        storage_manager::StorageManager,
    },
    types::{
        RowId,
        error::{DatabaseError, Result},
        value::Value,
    },
};

/// Trait for inserting data into tables
pub trait Inserter {
    /// Insert a single row and return its assigned row id
    fn insert(&mut self, values: Vec<Value>) -> Result<RowId>;

    /// Insert several rows, stopping at the first failure
    fn insert_batch(&mut self, rows: Vec<Vec<Value>>) -> Result<Vec<RowId>>;

    fn table_name(&self) -> &str;
}

/// Inserts rows into one table and keeps its catalog counters current.
pub struct TableInserter<'a> {
    storage: &'a mut StorageManager,
    info: TableInfo,
}

impl<'a> TableInserter<'a> {
    pub fn new(storage: &'a mut StorageManager, table_name: &str) -> Result<Self> {
        let info = storage.load_table_info(table_name)?;
        Ok(Self { storage, info })
    }

    pub fn info(&self) -> &TableInfo {
        &self.info
    }
}

/// Coerces `values` to the column types of `info` and enforces NOT NULL.
pub(crate) fn prepare_values(info: &TableInfo, values: Vec<Value>) -> Result<Vec<Value>> {
    if values.len() != info.columns.len() {
        return Err(DatabaseError::ColumnCountMismatch {
            table: info.table_name.clone(),
            expected: info.columns.len(),
            actual: values.len(),
        });
    }

    info.columns
        .iter()
        .zip(values)
        .map(|(col, value)| {
            let value = value.coerce(col.data_type)?;
            if value.is_null() && !col.nullable {
                return Err(DatabaseError::NotNullViolation {
                    table: info.table_name.clone(),
                    column: col.name.clone(),
                });
            }
            Ok(value)
        })
        .collect()
}

impl Inserter for TableInserter<'_> {
    fn insert(&mut self, values: Vec<Value>) -> Result<RowId> {
        let values = prepare_values(&self.info, values)?;

        match self.storage.validate_unique_constraint(&self.info, &values) {
            Err(DatabaseError::UniqueConstraintViolation { value, .. })
                if self.info.table_name == TABLES_TABLE =>
            {
                return Err(DatabaseError::TableAlreadyExists { name: value });
            }
            other => other?,
        }

        let mut file = self.storage.open_table_file(&self.info.table_name)?;
        let row_id = BPlusTree::open(&mut file)?.insert(values, self.info.last_id)?;

        self.info.last_id = row_id;
        self.info.record_count += 1;
        self.storage.persist_table_info(&self.info)?;

        trace!(table = %self.info.table_name, row_id, "Inserted row");
        Ok(row_id)
    }

    fn insert_batch(&mut self, rows: Vec<Vec<Value>>) -> Result<Vec<RowId>> {
        rows.into_iter().map(|values| self.insert(values)).collect()
    }

    fn table_name(&self) -> &str {
        &self.info.table_name
    }
}

/// Extension methods for StorageManager to work with TableInserter
impl StorageManager {
    /// Catalog tables are refused with `SystemTable`.
    pub fn create_inserter(&mut self, table_name: &str) -> Result<TableInserter<'_>> {
        Self::ensure_user_table(table_name)?;
        TableInserter::new(self, table_name)
    }

    /// Appends a row to a catalog table.
    pub(crate) fn insert_catalog_row(
        &mut self,
        table_name: &str,
        values: Vec<Value>,
    ) -> Result<RowId> {
        TableInserter::new(self, table_name)?.insert(values)
    }

    /// Insert one row given as a full field list in column order
    pub fn insert_row(&mut self, table_name: &str, values: Vec<Value>) -> Result<RowId> {
        self.create_inserter(table_name)?.insert(values)
    }

    pub fn insert_batch_into_table(
        &mut self,
        table_name: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<Vec<RowId>> {
        self.create_inserter(table_name)?.insert_batch(rows)
    }

    /// Insert one row from `(column, literal)` pairs. Columns left out are
    /// NULL.
    pub fn insert_values(&mut self, table_name: &str, assignments: &[(&str, &str)]) -> Result<RowId> {
        let mut inserter = self.create_inserter(table_name)?;
        let info = inserter.info();

        let mut values = vec![Value::Null; info.columns.len()];
        for (column, literal) in assignments {
            let index = info.column_index(column)?;
            values[index] = Value::parse(info.columns[index].data_type, literal)?;
        }
        inserter.insert(values)
    }
}
