use serde::{Deserialize, Serialize};

use crate::{
    storage::header::PageHeader,
    types::{CELL_POINTER_SIZE, PAGE_HEADER_SIZE, PageNo},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    Interior = 5,
    Leaf = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            5 => Some(PageType::Interior),
            13 => Some(PageType::Leaf),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/*
 * Page layout on disk
 * ┌────────────────────────────────────────────────────────────┐
 * │ HEADER (16 bytes)                                          │
 * │ type(1) | reserved(1) | cell_count(2) | content(2) |       │
 * │ right(4) | parent(4) | unused(2)                           │
 * ├────────────────────────────────────────────────────────────┤
 * │ CELL POINTERS  [ptr0(2)] [ptr1(2)] ...                     │
 * ├────────────────────────────────────────────────────────────┤
 * │ FREE SPACE                                                 │
 * ├──────────────────── content boundary ──────────────────────┤
 * │ CELLS  [...cell N...] ... [...cell 1...] [...cell 0...]    │
 * └────────────────────────────────────────────────────────────┘
 */

/// Snapshot of a page's bookkeeping: header plus cell-pointer array.
///
/// Mutating operations on [`crate::storage::page_file::PageFile`] return a
/// fresh `Page` instead of changing this one; callers rebind.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page_no: PageNo,
    pub header: PageHeader,
    pub cell_pointers: Vec<u16>,
}

impl Page {
    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn is_leaf(&self) -> bool {
        self.header.page_type == PageType::Leaf
    }

    pub fn is_root(&self) -> bool {
        self.header.parent.is_none()
    }

    pub fn cell_count(&self) -> usize {
        self.header.cell_count as usize
    }

    pub fn content_offset(&self) -> usize {
        self.header.content_offset as usize
    }

    pub fn right_pointer(&self) -> Option<PageNo> {
        self.header.right_pointer
    }

    pub fn parent(&self) -> Option<PageNo> {
        self.header.parent
    }

    /// Bytes between the end of the pointer array and the content boundary.
    pub fn free_space(&self) -> usize {
        self.content_offset()
            .saturating_sub(PAGE_HEADER_SIZE + CELL_POINTER_SIZE * self.cell_count())
    }

    /// Whether a cell of `cell_len` bytes and its pointer slot fit.
    pub fn can_fit(&self, cell_len: usize) -> bool {
        cell_len + CELL_POINTER_SIZE <= self.free_space()
    }

    /// Byte offset of pointer slot `index` within the page.
    pub fn pointer_slot_offset(index: usize) -> usize {
        PAGE_HEADER_SIZE + CELL_POINTER_SIZE * index
    }
}
