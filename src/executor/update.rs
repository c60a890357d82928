use std::collections::HashSet;

use tracing::debug;

use crate::{
    executor::predicate::Predicate,
    storage::{
        bplus_tree::BPlusTree,
        schema::TableInfo,
        storage_manager::StorageManager,
    },
    types::{
        CELL_POINTER_SIZE, PAGE_HEADER_SIZE,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

/// Sets fields on every row matching a predicate.
///
/// A field whose new encoding has the stored width is overwritten in place.
/// Otherwise the row is deleted and appended again with a fresh row id; the
/// old cell stays on its page as dead space. When an assignment targets a
/// UNIQUE or PRIMARY KEY column, each row is checked against every other
/// stored row before it is written.
pub struct TableUpdater<'a> {
    storage: &'a mut StorageManager,
    info: TableInfo,
    assignments: Vec<(usize, Value)>,
    touches_unique: bool,
}

impl<'a> TableUpdater<'a> {
    pub fn new(
        storage: &'a mut StorageManager,
        table_name: &str,
        assignments: &[(&str, Value)],
    ) -> Result<Self> {
        let info = storage.load_table_info(table_name)?;

        let mut resolved = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            let index = info.column_index(column)?;
            let col = &info.columns[index];
            let value = value.clone().coerce(col.data_type)?;
            if value.is_null() && !col.nullable {
                return Err(DatabaseError::NotNullViolation {
                    table: info.table_name.clone(),
                    column: col.name.clone(),
                });
            }
            value.type_tag()?;
            resolved.push((index, value));
        }

        let touches_unique = resolved
            .iter()
            .any(|(index, _)| info.columns[*index].is_unique());

        Ok(Self {
            storage,
            info,
            assignments: resolved,
            touches_unique,
        })
    }

    fn apply(&self, row: &Row) -> Result<Vec<Value>> {
        let mut updated = row.clone();
        for (index, value) in &self.assignments {
            updated.set_value(*index, value.clone())?;
        }
        Ok(updated.values)
    }

    /// Returns the number of rows changed.
    pub fn execute(&mut self, predicate: Option<&Predicate>) -> Result<usize> {
        if let Some(pred) = predicate {
            pred.validate_against_schema(&self.info)?;
        }

        let mut file = self.storage.open_table_file(&self.info.table_name)?;
        let max_cell = file.page_size() - PAGE_HEADER_SIZE - CELL_POINTER_SIZE;
        let leaves = BPlusTree::open(&mut file)?.collect_leaves()?;

        let mut reinserted = HashSet::new();
        let mut updated = 0;
        let mut moved = false;

        for leaf in leaves {
            let page = file.load_page(leaf)?;
            let records = file.read_rows(&page)?;
            let mut removed_here = 0;

            for record in records {
                if reinserted.contains(&record.row.row_id) {
                    continue;
                }
                if let Some(pred) = predicate {
                    if !pred.evaluate(&record.row, &self.info)? {
                        continue;
                    }
                }

                if self.touches_unique {
                    let values = self.apply(&record.row)?;
                    self.storage.validate_unique_excluding(
                        &self.info,
                        &values,
                        Some(record.row.row_id),
                    )?;
                }

                let in_place = self.assignments.iter().all(|(index, value)| {
                    record
                        .row
                        .get_value(*index)
                        .is_some_and(|current| current.size() == value.size())
                });

                if in_place {
                    for (index, value) in &self.assignments {
                        file.update_field(&page, &record, *index, value)?;
                    }
                } else {
                    let values = self.apply(&record.row)?;
                    let cell_size = Row::new(record.row.row_id, values.clone()).cell_size();
                    if cell_size > max_cell {
                        return Err(DatabaseError::RecordTooLarge {
                            size: cell_size,
                            max: max_cell,
                        });
                    }

                    let current = file.load_page(leaf)?;
                    file.delete_cell(&current, record.cell_index - removed_here)?;
                    removed_here += 1;

                    let row_id = BPlusTree::open(&mut file)?.insert(values, self.info.last_id)?;
                    self.info.last_id = row_id;
                    reinserted.insert(row_id);
                    moved = true;

                    debug!(
                        table = %self.info.table_name,
                        old_row_id = record.row.row_id,
                        new_row_id = row_id,
                        "Reinserted row whose field width changed"
                    );
                }
                updated += 1;
            }
        }

        if moved {
            self.storage.persist_table_info(&self.info)?;
        }
        Ok(updated)
    }
}

/// Extension methods for StorageManager to work with TableUpdater
impl StorageManager {
    /// Catalog tables are refused with `SystemTable`.
    pub fn update_matching_rows(
        &mut self,
        table_name: &str,
        predicate: Option<&Predicate>,
        assignments: &[(&str, Value)],
    ) -> Result<usize> {
        Self::ensure_user_table(table_name)?;
        self.update_rows(table_name, predicate, assignments)
    }

    pub(crate) fn update_rows(
        &mut self,
        table_name: &str,
        predicate: Option<&Predicate>,
        assignments: &[(&str, Value)],
    ) -> Result<usize> {
        TableUpdater::new(self, table_name, assignments)?.execute(predicate)
    }
}
