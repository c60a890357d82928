use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    storage::header::{PARENT_OFFSET, PageHeader, RIGHT_POINTER_OFFSET, encode_pointer},
    types::{
        CELL_POINTER_SIZE, PAGE_HEADER_SIZE, PageNo, ROUTING_ENTRY_SIZE, RowId,
        entry::Entry,
        error::{DatabaseError, Result},
        page::{Page, PageType},
    },
};

/// One table file: a sequence of fixed-size pages addressed by number.
///
/// Every read and write is positioned (`seek` + exact I/O); nothing is
/// cached between calls.
pub struct PageFile {
    path: PathBuf,
    file: File,
    page_size: usize,
}

impl PageFile {
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_size,
        })
    }

    /// Creates (or truncates) an empty file with no pages.
    pub fn create<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> Result<u32> {
        Ok((self.file.metadata()?.len() / self.page_size as u64) as u32)
    }

    fn page_offset(&self, page_no: PageNo) -> u64 {
        page_no as u64 * self.page_size as u64
    }

    fn check_range(&self, page_no: PageNo, offset: usize, len: usize) -> Result<()> {
        if offset + len > self.page_size {
            return Err(DatabaseError::corrupt(
                page_no,
                format!("access of {} bytes at offset {} leaves the page", len, offset),
            ));
        }
        Ok(())
    }

    pub fn read_at(&mut self, page_no: PageNo, offset: usize, buf: &mut [u8]) -> Result<()> {
        self.check_range(page_no, offset, buf.len())?;
        if page_no >= self.page_count()? {
            return Err(DatabaseError::corrupt(page_no, "page beyond end of file"));
        }
        self.file
            .seek(SeekFrom::Start(self.page_offset(page_no) + offset as u64))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    pub fn write_at(&mut self, page_no: PageNo, offset: usize, bytes: &[u8]) -> Result<()> {
        self.check_range(page_no, offset, bytes.len())?;
        self.file
            .seek(SeekFrom::Start(self.page_offset(page_no) + offset as u64))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    pub fn read_header(&mut self, page_no: PageNo) -> Result<PageHeader> {
        let mut buffer = [0u8; PAGE_HEADER_SIZE];
        self.read_at(page_no, 0, &mut buffer)?;
        PageHeader::from_bytes(page_no, &buffer, self.page_size)
    }

    pub fn write_header(&mut self, page_no: PageNo, header: &PageHeader) -> Result<()> {
        self.write_at(page_no, 0, &header.to_bytes())
    }

    /// Reads the header and the cell-pointer array of a page.
    pub fn load_page(&mut self, page_no: PageNo) -> Result<Page> {
        let header = self.read_header(page_no)?;
        let count = header.cell_count as usize;
        let mut raw = vec![0u8; CELL_POINTER_SIZE * count];
        self.read_at(page_no, PAGE_HEADER_SIZE, &mut raw)?;
        let cell_pointers = raw
            .chunks_exact(CELL_POINTER_SIZE)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        Ok(Page {
            page_no,
            header,
            cell_pointers,
        })
    }

    /// Grows the file by one zeroed page and writes its header. Returns the
    /// new page's number.
    pub fn allocate_page(
        &mut self,
        page_type: PageType,
        right_pointer: Option<PageNo>,
        parent: Option<PageNo>,
    ) -> Result<PageNo> {
        let len = self.file.metadata()?.len();
        let page_no = (len / self.page_size as u64) as PageNo;
        self.file.set_len(self.page_offset(page_no + 1))?;

        let header = PageHeader::new(page_type, self.page_size, right_pointer, parent);
        self.write_header(page_no, &header)?;

        debug!(
            file = %self.path.display(),
            page_no,
            ?page_type,
            ?right_pointer,
            ?parent,
            "Allocated page"
        );
        Ok(page_no)
    }

    /// First page whose parent pointer is unset. Never cached: splits move
    /// the root.
    pub fn find_root(&mut self) -> Result<PageNo> {
        let count = self.page_count()?;
        for page_no in 0..count {
            if self.read_header(page_no)?.parent.is_none() {
                return Ok(page_no);
            }
        }
        Err(DatabaseError::corrupt(0, "no root page in file"))
    }

    /// Row id (leaf) or routing key (interior) of the cell at the content
    /// boundary; 0 for a page that never held a cell.
    pub fn last_assigned_row_id(&mut self, page_no: PageNo) -> Result<RowId> {
        let header = self.read_header(page_no)?;
        let boundary = header.content_offset as usize;
        if boundary == self.page_size {
            return Ok(0);
        }
        let offset = match header.page_type {
            PageType::Leaf => boundary + 2,
            PageType::Interior => boundary + 4,
        };
        let mut raw = [0u8; 4];
        self.read_at(page_no, offset, &mut raw)?;
        Ok(i32::from_be_bytes(raw) as RowId)
    }

    pub fn set_right_pointer(&mut self, page_no: PageNo, right: Option<PageNo>) -> Result<()> {
        self.write_at(page_no, RIGHT_POINTER_OFFSET, &encode_pointer(right))
    }

    pub fn set_parent(&mut self, page_no: PageNo, parent: Option<PageNo>) -> Result<()> {
        self.write_at(page_no, PARENT_OFFSET, &encode_pointer(parent))
    }

    /// Writes `cell` just below the content boundary and appends its pointer.
    /// Returns the page's new state.
    pub fn append_cell(&mut self, page: &Page, cell: &[u8]) -> Result<Page> {
        if !page.can_fit(cell.len()) {
            return Err(DatabaseError::PageFull {
                page_no: page.page_no,
            });
        }

        let offset = page.content_offset() - cell.len();
        let slot = page.cell_count();
        self.write_at(page.page_no, offset, cell)?;
        self.write_at(
            page.page_no,
            Page::pointer_slot_offset(slot),
            &(offset as u16).to_be_bytes(),
        )?;

        let mut header = page.header;
        header.cell_count += 1;
        header.content_offset = offset as u16;
        self.write_header(page.page_no, &header)?;

        let mut cell_pointers = page.cell_pointers.clone();
        cell_pointers.push(offset as u16);
        Ok(Page {
            page_no: page.page_no,
            header,
            cell_pointers,
        })
    }

    /// Routing entries of an interior page in slot order.
    pub fn read_entries(&mut self, page: &Page) -> Result<Vec<Entry>> {
        let mut entries = Vec::with_capacity(page.cell_count());
        for &pointer in &page.cell_pointers {
            let mut raw = [0u8; ROUTING_ENTRY_SIZE];
            self.read_at(page.page_no, pointer as usize, &mut raw)?;
            let entry = Entry::from_bytes(&raw)
                .map_err(|e| DatabaseError::corrupt(page.page_no, e.to_string()))?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
