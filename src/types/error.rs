use std::path::PathBuf;

use thiserror::Error;

use crate::types::{PageNo, value::DataType};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted page: page_no={page_no}, reason={reason}")]
    CorruptPage { page_no: PageNo, reason: String },

    #[error("Corrupted catalog entry for '{table}': {reason}")]
    CorruptCatalog { table: String, reason: String },

    #[error("Page is full (page_no: {page_no})")]
    PageFull { page_no: PageNo },

    #[error("Record of {size} bytes can never fit a page (max: {max})")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Invalid cell index {index} on page {page_no} (cells: {count})")]
    InvalidCellIndex {
        page_no: PageNo,
        index: usize,
        count: usize,
    },

    #[error("Column index {index} out of bounds")]
    ColumnIndexOutOfBounds { index: usize },

    #[error("Serialization/deserialization error: {details}")]
    SerializationError { details: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Table '{name}' already exists")]
    TableAlreadyExists { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Unique constraint violated: {table}.{column} already holds '{value}'")]
    UniqueConstraintViolation {
        table: String,
        column: String,
        value: String,
    },

    #[error("Column {table}.{column} cannot be NULL")]
    NotNullViolation { table: String, column: String },

    #[error("Cannot convert '{value}' to {data_type}")]
    TypeConversion { value: String, data_type: DataType },

    #[error("Table '{table}' expects {expected} values, got {actual}")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid table definition: {details}")]
    InvalidSchema { details: String },

    #[error("Invalid page size power {power} (allowed: 9..=15)")]
    InvalidPageSize { power: u32 },

    #[error("No data store at {}", path.display())]
    DataStoreNotInitialized { path: PathBuf },

    #[error("A data store already exists at {}", path.display())]
    DataStoreExists { path: PathBuf },

    #[error("System table '{name}' cannot be modified this way")]
    SystemTable { name: String },
}

impl DatabaseError {
    /// True for the "expected absence" kinds a caller usually branches on.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DatabaseError::TableNotFound { .. } | DatabaseError::ColumnNotFound { .. }
        )
    }

    pub(crate) fn corrupt(page_no: PageNo, reason: impl Into<String>) -> Self {
        DatabaseError::CorruptPage {
            page_no,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
