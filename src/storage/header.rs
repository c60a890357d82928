use crate::types::{
    NO_PAGE, PAGE_HEADER_SIZE, PageNo,
    error::{DatabaseError, Result},
    page::PageType,
};

const TYPE_OFFSET: usize = 0x00;
const CELL_COUNT_OFFSET: usize = 0x02;
const CONTENT_OFFSET_OFFSET: usize = 0x04;
pub(crate) const RIGHT_POINTER_OFFSET: usize = 0x06;
pub(crate) const PARENT_OFFSET: usize = 0x0A;

/// The fixed 16-byte header at the start of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub cell_count: u16,
    /// Start of the cell content area; equals the page size when empty.
    pub content_offset: u16,
    /// Right sibling for leaves, rightmost child for interior pages.
    pub right_pointer: Option<PageNo>,
    /// `None` for the root.
    pub parent: Option<PageNo>,
}

impl PageHeader {
    pub fn new(
        page_type: PageType,
        page_size: usize,
        right_pointer: Option<PageNo>,
        parent: Option<PageNo>,
    ) -> Self {
        Self {
            page_type,
            cell_count: 0,
            content_offset: page_size as u16,
            right_pointer,
            parent,
        }
    }

    pub fn to_bytes(&self) -> [u8; PAGE_HEADER_SIZE] {
        let mut buffer = [0u8; PAGE_HEADER_SIZE];

        buffer[TYPE_OFFSET] = self.page_type.as_u8();
        buffer[CELL_COUNT_OFFSET..CELL_COUNT_OFFSET + 2]
            .copy_from_slice(&self.cell_count.to_be_bytes());
        buffer[CONTENT_OFFSET_OFFSET..CONTENT_OFFSET_OFFSET + 2]
            .copy_from_slice(&self.content_offset.to_be_bytes());
        buffer[RIGHT_POINTER_OFFSET..RIGHT_POINTER_OFFSET + 4]
            .copy_from_slice(&encode_pointer(self.right_pointer));
        buffer[PARENT_OFFSET..PARENT_OFFSET + 4].copy_from_slice(&encode_pointer(self.parent));

        buffer
    }

    pub fn from_bytes(page_no: PageNo, bytes: &[u8], page_size: usize) -> Result<Self> {
        if bytes.len() < PAGE_HEADER_SIZE {
            return Err(DatabaseError::corrupt(page_no, "header too short"));
        }

        let page_type = PageType::from_u8(bytes[TYPE_OFFSET]).ok_or_else(|| {
            DatabaseError::corrupt(page_no, format!("unknown page type {}", bytes[TYPE_OFFSET]))
        })?;

        let cell_count = u16::from_be_bytes([
            bytes[CELL_COUNT_OFFSET],
            bytes[CELL_COUNT_OFFSET + 1],
        ]);
        let content_offset = u16::from_be_bytes([
            bytes[CONTENT_OFFSET_OFFSET],
            bytes[CONTENT_OFFSET_OFFSET + 1],
        ]);

        let pointers_end = PAGE_HEADER_SIZE + 2 * cell_count as usize;
        if (content_offset as usize) > page_size || pointers_end > content_offset as usize {
            return Err(DatabaseError::corrupt(
                page_no,
                format!(
                    "content offset {} out of bounds for {} cells",
                    content_offset, cell_count
                ),
            ));
        }

        let right_pointer = decode_pointer(page_no, &bytes[RIGHT_POINTER_OFFSET..])?;
        let parent = decode_pointer(page_no, &bytes[PARENT_OFFSET..])?;

        Ok(Self {
            page_type,
            cell_count,
            content_offset,
            right_pointer,
            parent,
        })
    }
}

pub(crate) fn encode_pointer(pointer: Option<PageNo>) -> [u8; 4] {
    match pointer {
        Some(page_no) => (page_no as i32).to_be_bytes(),
        None => NO_PAGE.to_be_bytes(),
    }
}

fn decode_pointer(page_no: PageNo, bytes: &[u8]) -> Result<Option<PageNo>> {
    let raw = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    match raw {
        NO_PAGE => Ok(None),
        p if p >= 0 => Ok(Some(p as PageNo)),
        p => Err(DatabaseError::corrupt(page_no, format!("invalid page pointer {}", p))),
    }
}
