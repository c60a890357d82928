use tracing::trace;

use crate::{
    executor::predicate::Predicate,
    storage::{bplus_tree::BPlusTree, schema::TableInfo, storage_manager::StorageManager},
    types::error::Result,
};

/// Removes matching rows by dropping their cell-pointer slots.
pub struct TableDeleter<'a> {
    storage: &'a mut StorageManager,
    info: TableInfo,
}

impl<'a> TableDeleter<'a> {
    pub fn new(storage: &'a mut StorageManager, table_name: &str) -> Result<Self> {
        let info = storage.load_table_info(table_name)?;
        Ok(Self { storage, info })
    }

    /// Returns the number of rows deleted.
    pub fn execute(&mut self, predicate: Option<&Predicate>) -> Result<usize> {
        if let Some(pred) = predicate {
            pred.validate_against_schema(&self.info)?;
        }

        let mut file = self.storage.open_table_file(&self.info.table_name)?;
        let leaves = BPlusTree::open(&mut file)?.collect_leaves()?;

        let mut deleted = 0;
        for leaf in leaves {
            let mut page = file.load_page(leaf)?;
            let records = file.read_rows(&page)?;
            let mut removed_here = 0;

            for record in records {
                if let Some(pred) = predicate {
                    if !pred.evaluate(&record.row, &self.info)? {
                        continue;
                    }
                }
                page = file.delete_cell(&page, record.cell_index - removed_here)?;
                removed_here += 1;
                trace!(
                    table = %self.info.table_name,
                    row_id = record.row.row_id,
                    "Deleted row"
                );
            }
            deleted += removed_here;
        }

        if deleted > 0 {
            self.info.record_count = self.info.record_count.saturating_sub(deleted as u32);
            self.storage.persist_table_info(&self.info)?;
        }
        Ok(deleted)
    }
}

/// Extension methods for StorageManager to work with TableDeleter
impl StorageManager {
    /// Catalog tables are refused with `SystemTable`.
    pub fn delete_matching_rows(
        &mut self,
        table_name: &str,
        predicate: Option<&Predicate>,
    ) -> Result<usize> {
        Self::ensure_user_table(table_name)?;
        self.delete_rows(table_name, predicate)
    }

    pub(crate) fn delete_rows(
        &mut self,
        table_name: &str,
        predicate: Option<&Predicate>,
    ) -> Result<usize> {
        TableDeleter::new(self, table_name)?.execute(predicate)
    }
}
