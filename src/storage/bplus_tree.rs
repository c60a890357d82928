use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::{
    storage::page_file::PageFile,
    types::{
        CELL_POINTER_SIZE, PAGE_HEADER_SIZE, PageNo, RowId,
        entry::Entry,
        error::{DatabaseError, Result},
        page::{Page, PageType},
        row::Row,
        value::Value,
    },
};

/// A right-growing B+Tree over one table file.
///
/// Rows are only ever appended to the rightmost leaf, so row ids increase
/// left to right across the leaves. A full page is never redistributed: a
/// new empty page of the same type takes over as the rightmost one.
pub struct BPlusTree<'a> {
    file: &'a mut PageFile,
    root: PageNo,
}

impl<'a> BPlusTree<'a> {
    pub fn open(file: &'a mut PageFile) -> Result<Self> {
        let root = file.find_root()?;
        Ok(Self { file, root })
    }

    pub fn root(&self) -> PageNo {
        self.root
    }

    /// Leaf page numbers in row-id order.
    pub fn collect_leaves(&mut self) -> Result<Vec<PageNo>> {
        let mut leaves = Vec::new();
        let mut seen_leaves = HashSet::new();
        let mut visited_interior = HashSet::new();
        let mut stack = vec![self.root];

        while let Some(page_no) = stack.pop() {
            let page = self.file.load_page(page_no)?;
            if page.is_leaf() {
                if seen_leaves.insert(page_no) {
                    leaves.push(page_no);
                } else {
                    warn!(page_no, "Leaf reachable twice, skipping");
                }
                continue;
            }
            if !visited_interior.insert(page_no) {
                warn!(page_no, "Interior page reachable twice, skipping");
                continue;
            }

            let mut entries = self.file.read_entries(&page)?;
            entries.sort_by_key(|entry| entry.max_row_id);
            let mut children: Vec<PageNo> = entries.iter().map(|entry| entry.left_child).collect();
            children.extend(page.right_pointer());
            stack.extend(children.into_iter().rev());
        }

        Ok(leaves)
    }

    /// Follows rightmost-child pointers from the root down to a leaf.
    pub fn find_insertion_leaf(&mut self) -> Result<Page> {
        let page_count = self.file.page_count()?;
        let mut page = self.file.load_page(self.root)?;
        let mut hops = 0;
        while !page.is_leaf() {
            let next = page.right_pointer().ok_or_else(|| {
                DatabaseError::corrupt(page.page_no, "interior page without rightmost child")
            })?;
            hops += 1;
            if hops > page_count {
                return Err(DatabaseError::corrupt(page.page_no, "rightmost pointer cycle"));
            }
            page = self.file.load_page(next)?;
        }
        Ok(page)
    }

    /// Highest row id assigned so far along the rightmost path ending at
    /// `leaf`. A freshly split leaf is empty, so the routing keys above it
    /// carry the running maximum.
    pub fn last_row_id(&mut self, leaf: &Page) -> Result<RowId> {
        let mut last = self.file.last_assigned_row_id(leaf.page_no)?;
        let mut parent = leaf.parent();
        while let Some(page_no) = parent {
            last = last.max(self.file.last_assigned_row_id(page_no)?);
            parent = self.file.read_header(page_no)?.parent;
        }
        Ok(last)
    }

    /// Appends a row to the rightmost leaf and returns its new row id, which
    /// is one past both `last_id` and anything already in the tree.
    pub fn insert(&mut self, values: Vec<Value>, last_id: RowId) -> Result<RowId> {
        let mut row = Row::new(0, values);
        let cell_size = row.cell_size();
        let max = self.file.page_size() - PAGE_HEADER_SIZE - CELL_POINTER_SIZE;
        if cell_size > max {
            return Err(DatabaseError::RecordTooLarge {
                size: cell_size,
                max,
            });
        }

        let mut leaf = self.find_insertion_leaf()?;
        row.row_id = self.last_row_id(&leaf)?.max(last_id) + 1;
        let cell = row.to_bytes()?;

        if !leaf.can_fit(cell.len()) {
            leaf = self.split(&leaf)?;
        }
        self.file.append_cell(&leaf, &cell)?;

        trace!(
            page_no = leaf.page_no,
            row_id = row.row_id,
            size = cell.len(),
            "Inserted row"
        );
        Ok(row.row_id)
    }

    /// Starts a new rightmost page next to `full` and returns its state.
    fn split(&mut self, full: &Page) -> Result<Page> {
        let key = self.file.last_assigned_row_id(full.page_no)?;
        let new_page = self
            .file
            .allocate_page(full.page_type(), None, full.parent())?;
        if full.is_leaf() {
            self.file.set_right_pointer(full.page_no, Some(new_page))?;
        }
        let new_root = self.register_child(full.page_no, full.parent(), new_page, key)?;

        debug!(
            file = %self.file.path().display(),
            full = full.page_no,
            new_page,
            key,
            new_root,
            "Split page"
        );
        self.file.load_page(new_page)
    }

    /// Records `(key -> child)` in `parent` and makes `sibling` its new
    /// rightmost child, growing interior levels as needed. Returns whether a
    /// new root was created.
    fn register_child(
        &mut self,
        mut child: PageNo,
        mut parent: Option<PageNo>,
        mut sibling: PageNo,
        key: RowId,
    ) -> Result<bool> {
        let entry = Entry::new(child, key);
        let mut cell = entry.to_bytes();

        loop {
            let Some(parent_no) = parent else {
                let root = self
                    .file
                    .allocate_page(PageType::Interior, Some(sibling), None)?;
                let root_page = self.file.load_page(root)?;
                self.file.append_cell(&root_page, &cell)?;
                self.file.set_parent(child, Some(root))?;
                self.file.set_parent(sibling, Some(root))?;
                self.root = root;
                return Ok(true);
            };

            let parent_page = self.file.load_page(parent_no)?;
            if parent_page.can_fit(cell.len()) {
                self.file.append_cell(&parent_page, &cell)?;
                self.file.set_right_pointer(parent_no, Some(sibling))?;
                self.file.set_parent(sibling, Some(parent_no))?;
                return Ok(false);
            }

            // The full parent keeps `child` as its rightmost child. A new
            // interior page adopts `sibling` and is registered one level up.
            let interior =
                self.file
                    .allocate_page(PageType::Interior, Some(sibling), parent_page.parent())?;
            self.file.set_parent(sibling, Some(interior))?;
            debug!(
                full = parent_no,
                new_page = interior,
                "Split interior page"
            );

            child = parent_no;
            parent = parent_page.parent();
            sibling = interior;
            cell = Entry::new(child, key).to_bytes();
        }
    }
}
