use std::fs;

use tracing::{debug, info};

use crate::{
    executor::predicate::Predicate,
    storage::{
        bplus_tree::BPlusTree,
        schema::{COLUMNS_TABLE, TABLES_TABLE, TableCol, TableInfo, bootstrap_rows},
        storage_manager::StorageManager,
    },
    types::{
        RowId,
        error::{DatabaseError, Result},
        value::Value,
    },
};

/// Catalog operations. The catalog is two ordinary tables stored through
/// the same B+Tree machinery as user tables.
impl StorageManager {
    /// Writes both system table files and seeds their rows. Destroys any
    /// catalog already present.
    pub(crate) fn bootstrap_catalog(&mut self) -> Result<()> {
        fs::create_dir_all(self.config().catalog_dir())?;
        fs::create_dir_all(self.config().user_data_dir())?;

        let (tables_rows, column_rows) = bootstrap_rows();
        for (table_name, rows) in [(TABLES_TABLE, tables_rows), (COLUMNS_TABLE, column_rows)] {
            let mut file = self.create_table_file(table_name)?;
            let mut tree = BPlusTree::open(&mut file)?;
            for values in rows {
                tree.insert(values, 0)?;
            }
        }

        // Seeding may have split the columns catalog; record the real roots.
        for table_name in [TABLES_TABLE, COLUMNS_TABLE] {
            let info = self.load_table_info(table_name)?;
            self.persist_table_info(&info)?;
        }

        info!(
            data_dir = %self.config().data_dir.display(),
            page_size = self.page_size(),
            "Initialized data store"
        );
        Ok(())
    }

    /// Rebuilds a table's metadata from both catalog tables.
    pub fn load_table_info(&self, table_name: &str) -> Result<TableInfo> {
        let table_row = self
            .read_all_rows(TABLES_TABLE)?
            .into_iter()
            .find(|row| matches!(row.get_value(0), Some(Value::Text(name)) if name == table_name))
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })?;

        let mut columns = Vec::new();
        for row in self.read_all_rows(COLUMNS_TABLE)? {
            if matches!(row.get_value(0), Some(Value::Text(name)) if name == table_name) {
                columns.push(TableCol::from_catalog_row(table_name, &row)?);
            }
        }
        columns.sort_by_key(|col| col.ordinal_position);

        TableInfo::from_catalog_rows(&table_row, columns)
    }

    /// Writes `info`'s counters back to its tables-catalog row. The root
    /// page is re-read from the table file rather than taken from `info`.
    pub fn persist_table_info(&mut self, info: &TableInfo) -> Result<()> {
        let root_page = self.find_root(&info.table_name)?;
        let assignments = [
            ("root_page", Value::Int(root_page as i32)),
            ("last_id", Value::Int(info.last_id as i32)),
            ("record_count", Value::Int(info.record_count as i32)),
        ];
        let predicate = Predicate::equals("table_name", info.table_name.as_str());
        let updated = self.update_rows(TABLES_TABLE, Some(&predicate), &assignments)?;
        if updated == 0 {
            return Err(DatabaseError::CorruptCatalog {
                table: info.table_name.clone(),
                reason: "no row in the tables catalog".to_string(),
            });
        }

        debug!(
            table = %info.table_name,
            root_page,
            last_id = info.last_id,
            record_count = info.record_count,
            "Persisted table info"
        );
        Ok(())
    }

    /// Rejects `values` when a UNIQUE or PRIMARY KEY column already holds an
    /// equal value. TEXT compares case-insensitively; NULL never conflicts.
    pub fn validate_unique_constraint(&self, info: &TableInfo, values: &[Value]) -> Result<()> {
        self.validate_unique_excluding(info, values, None)
    }

    /// Same check, ignoring the stored row `exclude`. Used when a row is
    /// rewritten and must not conflict with its own old version.
    pub(crate) fn validate_unique_excluding(
        &self,
        info: &TableInfo,
        values: &[Value],
        exclude: Option<RowId>,
    ) -> Result<()> {
        let checked: Vec<usize> = info
            .columns
            .iter()
            .enumerate()
            .filter(|(i, col)| col.is_unique() && values.get(*i).is_some_and(|v| !v.is_null()))
            .map(|(i, _)| i)
            .collect();
        if checked.is_empty() {
            return Ok(());
        }

        for row in self.read_all_rows(&info.table_name)? {
            if Some(row.row_id) == exclude {
                continue;
            }
            for &i in &checked {
                let candidate = &values[i];
                if row
                    .get_value(i)
                    .is_some_and(|existing| existing.matches_ignore_case(candidate))
                {
                    return Err(DatabaseError::UniqueConstraintViolation {
                        table: info.table_name.clone(),
                        column: info.columns[i].name.clone(),
                        value: candidate.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Names of every table in the catalog, system tables included.
    pub fn table_names(&self) -> Result<Vec<String>> {
        Ok(self
            .read_all_rows(TABLES_TABLE)?
            .into_iter()
            .filter_map(|row| match row.values.into_iter().next() {
                Some(Value::Text(name)) => Some(name),
                _ => None,
            })
            .collect())
    }
}
