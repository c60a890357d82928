pub mod entry;
pub mod error;
pub mod page;
pub mod row;
pub mod value;

// Common type aliases
pub type PageNo = u32;
pub type RowId = u32;

// On-disk layout constants
pub const PAGE_HEADER_SIZE: usize = 16; // type(1) | reserved(1) | cells(2) | content(2) | right(4) | parent(4) | pad(2)
pub const CELL_POINTER_SIZE: usize = 2;
pub const NO_PAGE: i32 = -1;

pub const RECORD_HEADER_SIZE: usize = 7; // payload_size(2) + row_id(4) + column_count(1)
pub const ROUTING_ENTRY_SIZE: usize = 8; // left_child(4) + max_row_id(4)

pub const DEFAULT_PAGE_SIZE_POWER: u32 = 9; // 512 bytes
pub const MIN_PAGE_SIZE_POWER: u32 = 9;
pub const MAX_PAGE_SIZE_POWER: u32 = 15; // content offset is a u16 and must hold the page size
