use std::collections::VecDeque;

use crate::{
    executor::scan::Scanner,
    storage::{bplus_tree::BPlusTree, page_file::PageFile, storage_manager::StorageManager},
    types::{PageNo, error::Result, row::Row},
};

/// Walks a table's leaves left to right, one page of rows at a time.
///
/// The leaf list is taken when the first row is requested, so rows added by
/// a split after that point are not visited until `reset`.
pub struct SequentialScanner {
    file: PageFile,
    table_name: String,
    pending_leaves: VecDeque<PageNo>,
    buffered_rows: VecDeque<Row>,
    started: bool,
}

impl SequentialScanner {
    pub fn new(storage_manager: &StorageManager, table_name: String) -> Result<Self> {
        let file = storage_manager.open_table_file(&table_name)?;
        Ok(Self {
            file,
            table_name,
            pending_leaves: VecDeque::new(),
            buffered_rows: VecDeque::new(),
            started: false,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn start(&mut self) -> Result<()> {
        let leaves = BPlusTree::open(&mut self.file)?.collect_leaves()?;
        self.pending_leaves = leaves.into();
        self.started = true;
        Ok(())
    }

    fn load_next_leaf(&mut self) -> Result<bool> {
        let Some(page_no) = self.pending_leaves.pop_front() else {
            return Ok(false);
        };
        let page = self.file.load_page(page_no)?;
        let records = self.file.read_rows(&page)?;
        self.buffered_rows
            .extend(records.into_iter().map(|record| record.row));
        Ok(true)
    }
}

impl Scanner for SequentialScanner {
    fn scan(&mut self) -> Result<Option<Row>> {
        if !self.started {
            self.start()?;
        }
        loop {
            if let Some(row) = self.buffered_rows.pop_front() {
                return Ok(Some(row));
            }
            if !self.load_next_leaf()? {
                return Ok(None);
            }
        }
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>> {
        let mut rows = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            match self.scan()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    fn reset(&mut self) -> Result<()> {
        self.pending_leaves.clear();
        self.buffered_rows.clear();
        self.started = false;
        Ok(())
    }
}
