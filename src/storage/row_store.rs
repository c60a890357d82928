use tracing::trace;

use crate::{
    storage::page_file::PageFile,
    types::{
        RECORD_HEADER_SIZE,
        error::{DatabaseError, Result},
        page::Page,
        row::Row,
        value::Value,
    },
};

/// A row together with where it lives on its page.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Index into the page's cell-pointer array.
    pub cell_index: usize,
    /// Byte offset of the cell within the page.
    pub cell_offset: u16,
    pub row: Row,
}

/// Record-level operations on leaf pages.
impl PageFile {
    pub fn read_cell(&mut self, page: &Page, cell_offset: u16) -> Result<Vec<u8>> {
        let offset = cell_offset as usize;
        let mut prefix = [0u8; 2];
        self.read_at(page.page_no, offset, &mut prefix)?;
        let cell_size = Row::cell_size_from_prefix(prefix);
        if cell_size < RECORD_HEADER_SIZE || offset + cell_size > self.page_size() {
            return Err(DatabaseError::corrupt(
                page.page_no,
                format!("cell at {} claims {} bytes", offset, cell_size),
            ));
        }
        let mut cell = vec![0u8; cell_size];
        self.read_at(page.page_no, offset, &mut cell)?;
        Ok(cell)
    }

    /// Live records in stored (insertion) order. Zeroed slots are skipped.
    pub fn read_rows(&mut self, page: &Page) -> Result<Vec<Record>> {
        if !page.is_leaf() {
            return Err(DatabaseError::corrupt(
                page.page_no,
                "reading rows from an interior page",
            ));
        }

        let mut records = Vec::with_capacity(page.cell_count());
        for (cell_index, &cell_offset) in page.cell_pointers.iter().enumerate() {
            if cell_offset == 0 {
                continue;
            }
            let cell = self.read_cell(page, cell_offset)?;
            let row = Row::from_bytes(&cell)
                .map_err(|e| DatabaseError::corrupt(page.page_no, e.to_string()))?;
            records.push(Record {
                cell_index,
                cell_offset,
                row,
            });
        }
        Ok(records)
    }

    pub fn write_row(&mut self, page: &Page, row: &Row) -> Result<Page> {
        let cell = row.to_bytes()?;
        let page = self.append_cell(page, &cell)?;
        trace!(page_no = page.page_no, row_id = row.row_id, "Wrote row");
        Ok(page)
    }

    /// Overwrites field `index` of `record` when `value` encodes to the same
    /// width as the stored field. Returns `false`, touching nothing, when the
    /// width differs.
    pub fn update_field(
        &mut self,
        page: &Page,
        record: &Record,
        index: usize,
        value: &Value,
    ) -> Result<bool> {
        let current = record
            .row
            .get_value(index)
            .ok_or(DatabaseError::ColumnIndexOutOfBounds { index })?;
        if current.size() != value.size() {
            return Ok(false);
        }

        let base = record.cell_offset as usize;
        let tag = value.type_tag()?;
        self.write_at(page.page_no, base + Row::tag_offset(index), &[tag])?;
        self.write_at(
            page.page_no,
            base + record.row.field_offset(index),
            &value.to_bytes(),
        )?;
        Ok(true)
    }

    /// Removes pointer slot `cell_index`, shifting later slots down. The cell
    /// payload stays where it is.
    pub fn delete_cell(&mut self, page: &Page, cell_index: usize) -> Result<Page> {
        let count = page.cell_count();
        if cell_index >= count {
            return Err(DatabaseError::InvalidCellIndex {
                page_no: page.page_no,
                index: cell_index,
                count,
            });
        }

        let mut cell_pointers = page.cell_pointers.clone();
        let removed = cell_pointers.remove(cell_index);

        if cell_pointers.is_empty() {
            self.write_at(page.page_no, Page::pointer_slot_offset(0), &[0, 0])?;
        } else if cell_index < cell_pointers.len() {
            let shifted: Vec<u8> = cell_pointers[cell_index..]
                .iter()
                .flat_map(|p| p.to_be_bytes())
                .collect();
            self.write_at(page.page_no, Page::pointer_slot_offset(cell_index), &shifted)?;
        }

        let mut header = page.header;
        header.cell_count -= 1;
        self.write_header(page.page_no, &header)?;

        trace!(
            page_no = page.page_no,
            cell_index,
            cell_offset = removed,
            "Deleted cell"
        );
        Ok(Page {
            page_no: page.page_no,
            header,
            cell_pointers,
        })
    }
}
